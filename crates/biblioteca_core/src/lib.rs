//! Core record keeping for a small lending library.
//! This crate is the single source of truth for loan and availability
//! invariants; callers only supply an `AuthContext` and a connection.

pub mod auth;
pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rules;
pub mod service;

pub use auth::AuthContext;
pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{
    default_log_level, init_logging, init_with, logging_status, LogConfig, LoggingError,
};
pub use model::book::{Book, BookChanges, BookId, NewBook};
pub use model::loan::{Loan, LoanId, LoanState, LoanStateError};
pub use model::reader::{NewReader, Reader, ReaderChanges, ReaderId};
pub use model::validation::ValidationError;
pub use model::RecordKind;
pub use repo::book_repo::{BookFilter, BookRepository, SqliteBookRepository};
pub use repo::loan_repo::{LoanFilter, LoanRepository, SqliteLoanRepository};
pub use repo::page::{normalize_page_limit, Page, PageRequest};
pub use repo::reader_repo::{ReaderRepository, SqliteReaderRepository};
pub use repo::summary::LibraryCounts;
pub use repo::{RepoError, RepoResult};
pub use rules::availability::{AvailabilityError, LoanTransition};
pub use service::book_service::BookService;
pub use service::loan_service::{CloseOutcome, LoanService};
pub use service::reader_service::ReaderService;
pub use service::{ServiceError, ServiceResult};
