//! Library domain model: books, readers and the loans that join them.
//!
//! # Responsibility
//! - Define canonical records used by core business logic.
//! - Provide explicit validation over plain data, independent of any caller.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - `Book::available` is never edited directly by catalog operations; only
//!   the availability rules produce new values for it.

pub mod book;
pub mod loan;
pub mod reader;
pub mod validation;

/// Kind of persisted record, used to report which lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Book,
    Reader,
    Loan,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Reader => "reader",
            Self::Loan => "loan",
        }
    }
}
