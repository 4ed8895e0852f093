//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Gate every operation on an explicit `AuthContext`.
//! - Translate storage errors into caller-facing outcomes.

use crate::auth::AuthContext;
use crate::model::book::BookId;
use crate::model::loan::LoanId;
use crate::model::reader::ReaderId;
use crate::model::validation::ValidationError;
use crate::model::RecordKind;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod book_service;
pub mod loan_service;
pub mod reader_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for library use-cases.
///
/// Every variant except `Repo` and `InconsistentState` is a recoverable
/// business outcome meant for user-facing messaging.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller is not logged in.
    Unauthenticated,
    /// Input failed field validation.
    Validation(ValidationError),
    BookNotFound(BookId),
    ReaderNotFound(ReaderId),
    LoanNotFound(LoanId),
    /// Book already has an open loan.
    BookUnavailable(BookId),
    /// Another reader already uses this email.
    DuplicateEmail(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back did not match.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "login required"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::ReaderNotFound(id) => write!(f, "reader not found: {id}"),
            Self::LoanNotFound(id) => write!(f, "loan not found: {id}"),
            Self::BookUnavailable(id) => write!(f, "book is not available for loan: {id}"),
            Self::DuplicateEmail(email) => {
                write!(f, "a reader with email `{email}` already exists")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent library state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => match kind {
                RecordKind::Book => Self::BookNotFound(id),
                RecordKind::Reader => Self::ReaderNotFound(id),
                RecordKind::Loan => Self::LoanNotFound(id),
            },
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::UniqueConstraintViolation { value, .. } => Self::DuplicateEmail(value),
            RepoError::StaleBookAvailability(id) => Self::BookUnavailable(id),
            other => Self::Repo(other),
        }
    }
}

/// Returns the caller's username, or `Unauthenticated`.
pub(crate) fn require_user(auth: &AuthContext) -> ServiceResult<&str> {
    auth.username().ok_or(ServiceError::Unauthenticated)
}

/// Trims an optional text filter; blank filters are dropped.
pub(crate) fn normalize_filter_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
