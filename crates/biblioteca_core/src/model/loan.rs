//! Loan record and its two-state lifecycle.
//!
//! # Invariants
//! - A loan is created `Open` (`return_date == None`).
//! - `Closed` is terminal: once `return_date` is set it never changes.
//! - `loan_date` is immutable after creation.

use crate::model::book::BookId;
use crate::model::reader::ReaderId;
use crate::model::validation::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a loan.
pub type LoanId = Uuid;

/// Lifecycle state derived from `return_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanState {
    /// Book is out with the reader.
    Open,
    /// Book was returned. Terminal.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub book_id: BookId,
    pub reader_id: ReaderId,
    pub loan_date: NaiveDate,
    /// `None` while the loan is outstanding.
    pub return_date: Option<NaiveDate>,
}

/// Rejected loan state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStateError {
    /// Loan was already closed on the given date.
    AlreadyReturned { returned_on: NaiveDate },
}

impl Loan {
    /// Starts a new open loan dated `loan_date`.
    pub fn open(book_id: BookId, reader_id: ReaderId, loan_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            reader_id,
            loan_date,
            return_date: None,
        }
    }

    pub fn state(&self) -> LoanState {
        match self.return_date {
            None => LoanState::Open,
            Some(_) => LoanState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == LoanState::Open
    }

    /// Closes the loan on `returned_on`.
    ///
    /// A date before `loan_date` (the closing caller's clock lags the
    /// opener's) is raised to `loan_date`. Closing twice is rejected and
    /// keeps the first return date.
    pub fn close(&mut self, returned_on: NaiveDate) -> Result<(), LoanStateError> {
        if let Some(previous) = self.return_date {
            return Err(LoanStateError::AlreadyReturned {
                returned_on: previous,
            });
        }
        self.return_date = Some(returned_on.max(self.loan_date));
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.return_date {
            Some(returned_on) if returned_on < self.loan_date => {
                Err(ValidationError::ReturnBeforeLoanDate)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn closed_is_terminal() {
        let mut loan = Loan::open(Uuid::new_v4(), Uuid::new_v4(), day(1));
        assert_eq!(loan.state(), LoanState::Open);

        loan.close(day(4)).unwrap();
        assert_eq!(loan.state(), LoanState::Closed);

        let err = loan.close(day(9)).unwrap_err();
        assert_eq!(err, LoanStateError::AlreadyReturned { returned_on: day(4) });
        assert_eq!(loan.return_date, Some(day(4)));
    }

    #[test]
    fn close_never_dates_before_loan_date() {
        let mut loan = Loan::open(Uuid::new_v4(), Uuid::new_v4(), day(10));
        loan.close(day(2)).unwrap();

        assert_eq!(loan.return_date, Some(day(10)));
        assert!(loan.validate().is_ok());
    }

    #[test]
    fn stored_return_before_loan_date_is_invalid() {
        let loan = Loan {
            return_date: Some(day(2)),
            ..Loan::open(Uuid::new_v4(), Uuid::new_v4(), day(10))
        };
        assert_eq!(loan.validate(), Err(ValidationError::ReturnBeforeLoanDate));
    }
}
