//! Availability rule engine.
//!
//! # Responsibility
//! - Compute the next `Book::available` value for a loan transition.
//!
//! # Invariants
//! - Opening a loan on an unavailable book is rejected.
//! - Closing a loan always frees the book.
//! - Pure: no storage access, no clock.

use crate::model::book::Book;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Loan event that affects book availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanTransition {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityError {
    /// Book is already out on another loan.
    BookUnavailable,
}

impl Display for AvailabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookUnavailable => write!(f, "book is not available for loan"),
        }
    }
}

impl Error for AvailabilityError {}

/// Returns the availability a book must have after `transition`.
pub fn next_availability(
    available: bool,
    transition: LoanTransition,
) -> Result<bool, AvailabilityError> {
    match transition {
        LoanTransition::Open if !available => Err(AvailabilityError::BookUnavailable),
        LoanTransition::Open => Ok(false),
        LoanTransition::Close => Ok(true),
    }
}

/// Applies `transition` to `book` in place. On error the book is unchanged.
pub fn apply(book: &mut Book, transition: LoanTransition) -> Result<(), AvailabilityError> {
    book.available = next_availability(book.available, transition)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_takes_an_available_book() {
        assert_eq!(next_availability(true, LoanTransition::Open), Ok(false));
    }

    #[test]
    fn open_rejects_an_unavailable_book() {
        assert_eq!(
            next_availability(false, LoanTransition::Open),
            Err(AvailabilityError::BookUnavailable)
        );
    }

    #[test]
    fn close_always_frees() {
        assert_eq!(next_availability(false, LoanTransition::Close), Ok(true));
        assert_eq!(next_availability(true, LoanTransition::Close), Ok(true));
    }

    #[test]
    fn apply_leaves_book_unchanged_on_rejection() {
        let mut book = Book::new("Dune", "Frank Herbert", 1965);
        apply(&mut book, LoanTransition::Open).unwrap();
        assert!(!book.available);

        assert!(apply(&mut book, LoanTransition::Open).is_err());
        assert!(!book.available);

        apply(&mut book, LoanTransition::Close).unwrap();
        assert!(book.available);
    }
}
