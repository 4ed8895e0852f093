//! Field-level validation rules for catalog input.
//!
//! # Responsibility
//! - Normalize user-entered text (trim) and enforce length limits.
//! - Check reader email shape and publication year range.
//!
//! # Invariants
//! - Validators are pure: plain data in, normalized value or error out.
//! - Limits mirror the storage contract (title/author 200, name 150,
//!   email 254 chars).

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TITLE_MAX_CHARS: usize = 200;
pub const AUTHOR_MAX_CHARS: usize = 200;
pub const READER_NAME_MAX_CHARS: usize = 150;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const PUBLICATION_YEAR_MIN: i32 = 0;
pub const PUBLICATION_YEAR_MAX: i32 = 9999;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("valid email regex")
});

/// Validation failure for book/reader/loan data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Text field exceeds its character limit.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Publication year outside `PUBLICATION_YEAR_MIN..=PUBLICATION_YEAR_MAX`.
    PublicationYearOutOfRange(i32),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// Loan return date precedes its loan date.
    ReturnBeforeLoanDate,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::TooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "{field} is too long: {actual_chars} chars, at most {max_chars} allowed"
            ),
            Self::PublicationYearOutOfRange(year) => write!(
                f,
                "publication year {year} is outside {PUBLICATION_YEAR_MIN}..={PUBLICATION_YEAR_MAX}"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::ReturnBeforeLoanDate => write!(f, "return date precedes loan date"),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and checks it is non-empty and within `max_chars`.
pub fn normalize_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    let actual_chars = trimmed.chars().count();
    if actual_chars > max_chars {
        return Err(ValidationError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(trimmed.to_string())
}

pub fn validate_publication_year(year: i32) -> Result<i32, ValidationError> {
    if (PUBLICATION_YEAR_MIN..=PUBLICATION_YEAR_MAX).contains(&year) {
        Ok(year)
    } else {
        Err(ValidationError::PublicationYearOutOfRange(year))
    }
}

/// Trims an email and checks its shape.
///
/// Case is preserved; uniqueness is compared case-insensitively by storage.
pub fn normalize_email(value: &str) -> Result<String, ValidationError> {
    let email = normalize_text("email", value, EMAIL_MAX_CHARS)?;
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}
