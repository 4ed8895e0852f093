//! Loan lifecycle use-case service.
//!
//! # Responsibility
//! - Open and close loans, keeping `Book::available` consistent with them.
//! - Report conflicts (`BookUnavailable`) and no-op closes
//!   (`CloseOutcome::AlreadyReturned`) to the caller without retrying.
//!
//! # Invariants
//! - Loans start `Open` dated `clock.today()`; `Closed` is terminal.
//! - A return date is never earlier than the loan date, even when this
//!   service's clock is behind the one that opened the loan.
//! - A book has at most one open loan, because opening requires
//!   `available == true` and flips it in the same transaction.
//! - Availability values always come from `rules::availability`.

use crate::auth::AuthContext;
use crate::clock::{Clock, SystemClock};
use crate::model::book::BookId;
use crate::model::loan::{Loan, LoanId, LoanStateError};
use crate::model::reader::ReaderId;
use crate::repo::loan_repo::{LoanFilter, LoanRepository};
use crate::repo::page::{Page, PageRequest};
use crate::repo::summary::LibraryCounts;
use crate::repo::RepoError;
use crate::rules::availability::{self, AvailabilityError, LoanTransition};
use crate::service::{normalize_filter_text, require_user, ServiceError, ServiceResult};
use log::{info, warn};
use serde::Serialize;

/// Result of a close request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "loan", rename_all = "snake_case")]
pub enum CloseOutcome {
    /// Loan was open and is now closed.
    Returned(Loan),
    /// Loan had been closed before; nothing changed.
    AlreadyReturned(Loan),
}

impl CloseOutcome {
    pub fn loan(&self) -> &Loan {
        match self {
            Self::Returned(loan) | Self::AlreadyReturned(loan) => loan,
        }
    }

    pub fn is_already_returned(&self) -> bool {
        matches!(self, Self::AlreadyReturned(_))
    }
}

/// Loan lifecycle controller over a repository and a date source.
pub struct LoanService<R: LoanRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: LoanRepository> LoanService<R, SystemClock> {
    /// Creates a service dating loans with the local system date.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: LoanRepository, C: Clock> LoanService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Lends `book_id` to `reader_id`.
    ///
    /// # Errors
    /// - `BookNotFound` / `ReaderNotFound` for unknown ids.
    /// - `BookUnavailable` when the book is already out; no loan is created.
    pub fn open_loan(
        &self,
        auth: &AuthContext,
        book_id: BookId,
        reader_id: ReaderId,
    ) -> ServiceResult<Loan> {
        let actor = require_user(auth)?;
        let mut book = self
            .repo
            .get_book(book_id)?
            .ok_or(ServiceError::BookNotFound(book_id))?;
        self.repo
            .get_reader(reader_id)?
            .ok_or(ServiceError::ReaderNotFound(reader_id))?;

        if let Err(AvailabilityError::BookUnavailable) =
            availability::apply(&mut book, LoanTransition::Open)
        {
            warn!(
                "event=loan_open module=service status=conflict error_code=book_unavailable book_id={book_id} actor={actor}"
            );
            return Err(ServiceError::BookUnavailable(book_id));
        }

        let loan = Loan::open(book_id, reader_id, self.clock.today());
        match self.repo.record_loan_open(&loan, &book) {
            Ok(()) => {}
            Err(RepoError::StaleBookAvailability(_)) => {
                warn!(
                    "event=loan_open module=service status=conflict error_code=book_unavailable_race book_id={book_id} actor={actor}"
                );
                return Err(ServiceError::BookUnavailable(book_id));
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            "event=loan_open module=service status=ok loan_id={} book_id={book_id} reader_id={reader_id} actor={actor}",
            loan.id
        );

        self.repo
            .get_loan(loan.id)?
            .ok_or(ServiceError::InconsistentState(
                "opened loan not found in read-back",
            ))
    }

    /// Records the return of a loan and frees its book.
    ///
    /// Closing an already closed loan is not an error: it yields
    /// `CloseOutcome::AlreadyReturned` with the original return date.
    pub fn close_loan(&self, auth: &AuthContext, loan_id: LoanId) -> ServiceResult<CloseOutcome> {
        let actor = require_user(auth)?;
        let mut loan = self
            .repo
            .get_loan(loan_id)?
            .ok_or(ServiceError::LoanNotFound(loan_id))?;

        if let Err(LoanStateError::AlreadyReturned { returned_on }) =
            loan.close(self.clock.today())
        {
            info!(
                "event=loan_close module=service status=noop reason=already_returned loan_id={loan_id} returned_on={returned_on} actor={actor}"
            );
            return Ok(CloseOutcome::AlreadyReturned(loan));
        }

        let mut book = self
            .repo
            .get_book(loan.book_id)?
            .ok_or(ServiceError::InconsistentState("loan references missing book"))?;
        availability::apply(&mut book, LoanTransition::Close)
            .map_err(|_| ServiceError::InconsistentState("close transition rejected"))?;

        match self.repo.record_loan_close(&loan, &book) {
            Ok(()) => {}
            Err(RepoError::LoanAlreadyClosed(_)) => {
                let stored = self
                    .repo
                    .get_loan(loan_id)?
                    .ok_or(ServiceError::LoanNotFound(loan_id))?;
                info!(
                    "event=loan_close module=service status=noop reason=closed_concurrently loan_id={loan_id} actor={actor}"
                );
                return Ok(CloseOutcome::AlreadyReturned(stored));
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            "event=loan_close module=service status=ok loan_id={loan_id} book_id={} actor={actor}",
            book.id
        );

        let stored = self
            .repo
            .get_loan(loan_id)?
            .ok_or(ServiceError::InconsistentState(
                "closed loan not found in read-back",
            ))?;
        Ok(CloseOutcome::Returned(stored))
    }

    pub fn get_loan(&self, auth: &AuthContext, loan_id: LoanId) -> ServiceResult<Loan> {
        require_user(auth)?;
        self.repo
            .get_loan(loan_id)?
            .ok_or(ServiceError::LoanNotFound(loan_id))
    }

    /// Lists loans, newest first.
    pub fn list_loans(
        &self,
        auth: &AuthContext,
        filter: LoanFilter,
        page: PageRequest,
    ) -> ServiceResult<Page<Loan>> {
        require_user(auth)?;
        let filter = LoanFilter {
            search: normalize_filter_text(filter.search),
            ..filter
        };
        let page = page.normalized();

        let items = self.repo.list_loans(&filter, &page)?;
        let total = self.repo.count_loans(&filter)?;
        Ok(Page {
            items,
            applied_limit: page.applied_limit(),
            offset: page.offset,
            total,
        })
    }

    /// Removes a loan record outright. Frees the book if the loan was open.
    pub fn delete_loan(&self, auth: &AuthContext, loan_id: LoanId) -> ServiceResult<()> {
        let actor = require_user(auth)?;
        self.repo.delete_loan(loan_id)?;
        info!("event=loan_delete module=service status=ok loan_id={loan_id} actor={actor}");
        Ok(())
    }

    /// Returns library-wide record counts.
    pub fn summary(&self, auth: &AuthContext) -> ServiceResult<LibraryCounts> {
        require_user(auth)?;
        Ok(self.repo.library_counts()?)
    }
}
