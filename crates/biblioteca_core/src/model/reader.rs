//! Library reader (borrower) record.
//!
//! # Invariants
//! - No two readers share an email, compared case-insensitively. Enforced
//!   by storage; validation here only checks shape.

use crate::model::validation::{
    normalize_email, normalize_text, ValidationError, READER_NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a reader.
pub type ReaderId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reader {
    pub id: ReaderId,
    pub name: String,
    pub email: String,
}

impl Reader {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, email)
    }

    pub fn with_id(id: ReaderId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Checks stored field constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_text("name", &self.name, READER_NAME_MAX_CHARS)?;
        normalize_email(&self.email)?;
        Ok(())
    }
}

/// Input for registering a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReader {
    pub name: String,
    pub email: String,
}

impl NewReader {
    pub fn into_reader(self) -> Result<Reader, ValidationError> {
        let name = normalize_text("name", &self.name, READER_NAME_MAX_CHARS)?;
        let email = normalize_email(&self.email)?;
        Ok(Reader::new(name, email))
    }
}

/// Partial edit of a reader. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ReaderChanges {
    pub fn apply_to(&self, reader: &mut Reader) -> Result<(), ValidationError> {
        let name = match self.name.as_deref() {
            Some(value) => normalize_text("name", value, READER_NAME_MAX_CHARS)?,
            None => reader.name.clone(),
        };
        let email = match self.email.as_deref() {
            Some(value) => normalize_email(value)?,
            None => reader.email.clone(),
        };

        reader.name = name;
        reader.email = email;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}
