//! Loan repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist loan open/close together with the book availability change.
//! - Provide the book/reader lookups the loan lifecycle needs.
//!
//! # Invariants
//! - Loan insert + book update (and loan close + book update) commit in one
//!   `BEGIN IMMEDIATE` transaction, or not at all.
//! - Availability writes are guarded by the expected previous value, so a
//!   concurrent writer on the same book cannot be silently overwritten.
//! - Loan listing order is `loan_date DESC, id ASC`.

use crate::model::book::{Book, BookId};
use crate::model::loan::{Loan, LoanId, LoanState};
use crate::model::reader::{Reader, ReaderId};
use crate::model::RecordKind;
use crate::repo::book_repo::load_book;
use crate::repo::page::{push_page_clause, PageRequest};
use crate::repo::reader_repo::load_reader;
use crate::repo::summary::{library_counts, LibraryCounts};
use crate::repo::{
    bool_to_int, date_to_db, ensure_connection_ready, parse_date, parse_uuid, RepoError,
    RepoResult, BOOKS_SCHEMA, LOANS_SCHEMA, READERS_SCHEMA,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const LOAN_SELECT_SQL: &str = "SELECT
    loans.id,
    loans.book_id,
    loans.reader_id,
    loans.loan_date,
    loans.return_date
FROM loans
INNER JOIN books ON books.id = loans.book_id
INNER JOIN readers ON readers.id = loans.reader_id";

/// Filter for loan listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub state: Option<LoanState>,
    pub book_id: Option<BookId>,
    pub reader_id: Option<ReaderId>,
    /// Case-insensitive substring of the book title or reader name.
    pub search: Option<String>,
}

/// Repository interface for the loan lifecycle.
pub trait LoanRepository {
    fn get_loan(&self, id: LoanId) -> RepoResult<Option<Loan>>;
    fn list_loans(&self, filter: &LoanFilter, page: &PageRequest) -> RepoResult<Vec<Loan>>;
    fn count_loans(&self, filter: &LoanFilter) -> RepoResult<u64>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    fn get_reader(&self, id: ReaderId) -> RepoResult<Option<Reader>>;
    /// Inserts an open `loan` and stores `book.available`, atomically.
    ///
    /// Fails with `StaleBookAvailability` when the stored book was no longer
    /// available at write time; nothing is written in that case.
    fn record_loan_open(&self, loan: &Loan, book: &Book) -> RepoResult<()>;
    /// Stores `loan.return_date` and `book.available`, atomically.
    ///
    /// Fails with `LoanAlreadyClosed` when the stored loan was closed in the
    /// meantime; nothing is written in that case.
    fn record_loan_close(&self, loan: &Loan, book: &Book) -> RepoResult<()>;
    /// Deletes a loan row, freeing its book if the loan was open.
    fn delete_loan(&self, id: LoanId) -> RepoResult<()>;
    fn library_counts(&self) -> RepoResult<LibraryCounts>;
}

/// SQLite-backed loan repository.
pub struct SqliteLoanRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLoanRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[BOOKS_SCHEMA, READERS_SCHEMA, LOANS_SCHEMA])?;
        Ok(Self { conn })
    }

    fn begin_immediate(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl LoanRepository for SqliteLoanRepository<'_> {
    fn get_loan(&self, id: LoanId) -> RepoResult<Option<Loan>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOAN_SELECT_SQL} WHERE loans.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_loan_row(row)?));
        }
        Ok(None)
    }

    fn list_loans(&self, filter: &LoanFilter, page: &PageRequest) -> RepoResult<Vec<Loan>> {
        let (where_sql, mut bind_values) = loan_filter_clause(filter);
        let mut sql =
            format!("{LOAN_SELECT_SQL}{where_sql} ORDER BY loans.loan_date DESC, loans.id ASC");
        push_page_clause(&mut sql, &mut bind_values, page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut loans = Vec::new();
        while let Some(row) = rows.next()? {
            loans.push(parse_loan_row(row)?);
        }

        Ok(loans)
    }

    fn count_loans(&self, filter: &LoanFilter) -> RepoResult<u64> {
        let (where_sql, bind_values) = loan_filter_clause(filter);
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*)
                 FROM loans
                 INNER JOIN books ON books.id = loans.book_id
                 INNER JOIN readers ON readers.id = loans.reader_id{where_sql}"
            ),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        load_book(self.conn, id)
    }

    fn get_reader(&self, id: ReaderId) -> RepoResult<Option<Reader>> {
        load_reader(self.conn, id)
    }

    fn record_loan_open(&self, loan: &Loan, book: &Book) -> RepoResult<()> {
        loan.validate()?;
        if !loan.is_open() || loan.book_id != book.id {
            return Err(RepoError::InvalidData(format!(
                "loan {} cannot be opened against book {}",
                loan.id, book.id
            )));
        }

        let tx = self.begin_immediate()?;

        let changed = tx.execute(
            "UPDATE books
             SET available = ?1
             WHERE id = ?2
               AND available = 1;",
            params![bool_to_int(book.available), book.id.to_string()],
        )?;
        if changed == 0 {
            if load_book(&tx, book.id)?.is_none() {
                return Err(RepoError::NotFound {
                    kind: RecordKind::Book,
                    id: book.id,
                });
            }
            return Err(RepoError::StaleBookAvailability(book.id));
        }

        tx.execute(
            "INSERT INTO loans (
                id,
                book_id,
                reader_id,
                loan_date,
                return_date
            ) VALUES (?1, ?2, ?3, ?4, NULL);",
            params![
                loan.id.to_string(),
                loan.book_id.to_string(),
                loan.reader_id.to_string(),
                date_to_db(loan.loan_date),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn record_loan_close(&self, loan: &Loan, book: &Book) -> RepoResult<()> {
        loan.validate()?;
        let return_date = match loan.return_date {
            Some(date) if loan.book_id == book.id => date,
            _ => {
                return Err(RepoError::InvalidData(format!(
                    "loan {} cannot be closed against book {}",
                    loan.id, book.id
                )));
            }
        };

        let tx = self.begin_immediate()?;

        let changed = tx.execute(
            "UPDATE loans
             SET return_date = ?1
             WHERE id = ?2
               AND return_date IS NULL;",
            params![date_to_db(return_date), loan.id.to_string()],
        )?;
        if changed == 0 {
            let exists: i64 = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM loans WHERE id = ?1);",
                [loan.id.to_string()],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(RepoError::NotFound {
                    kind: RecordKind::Loan,
                    id: loan.id,
                });
            }
            return Err(RepoError::LoanAlreadyClosed(loan.id));
        }

        let changed = tx.execute(
            "UPDATE books SET available = ?1 WHERE id = ?2;",
            params![bool_to_int(book.available), book.id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Book,
                id: book.id,
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_loan(&self, id: LoanId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = self.begin_immediate()?;

        tx.execute(
            "UPDATE books
             SET available = 1
             WHERE id IN (
                SELECT book_id
                FROM loans
                WHERE id = ?1
                  AND return_date IS NULL
             );",
            [id_text.as_str()],
        )?;
        let changed = tx.execute("DELETE FROM loans WHERE id = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Loan,
                id,
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn library_counts(&self) -> RepoResult<LibraryCounts> {
        library_counts(self.conn)
    }
}

fn loan_filter_clause(filter: &LoanFilter) -> (String, Vec<Value>) {
    let mut sql = String::from(" WHERE 1 = 1");
    let mut bind_values = Vec::new();

    match filter.state {
        Some(LoanState::Open) => sql.push_str(" AND loans.return_date IS NULL"),
        Some(LoanState::Closed) => sql.push_str(" AND loans.return_date IS NOT NULL"),
        None => {}
    }
    if let Some(book_id) = filter.book_id {
        sql.push_str(" AND loans.book_id = ?");
        bind_values.push(Value::Text(book_id.to_string()));
    }
    if let Some(reader_id) = filter.reader_id {
        sql.push_str(" AND loans.reader_id = ?");
        bind_values.push(Value::Text(reader_id.to_string()));
    }
    if let Some(search) = filter.search.as_ref() {
        sql.push_str(
            " AND (instr(lower(books.title), lower(?)) > 0
                   OR instr(lower(readers.name), lower(?)) > 0)",
        );
        bind_values.push(Value::Text(search.clone()));
        bind_values.push(Value::Text(search.clone()));
    }

    (sql, bind_values)
}

fn parse_loan_row(row: &Row<'_>) -> RepoResult<Loan> {
    let id_text: String = row.get(0)?;
    let book_text: String = row.get(1)?;
    let reader_text: String = row.get(2)?;
    let loan_date_text: String = row.get(3)?;
    let return_date = match row.get::<_, Option<String>>(4)? {
        Some(value) => Some(parse_date(&value, "loans.return_date")?),
        None => None,
    };

    let loan = Loan {
        id: parse_uuid(&id_text, "loans.id")?,
        book_id: parse_uuid(&book_text, "loans.book_id")?,
        reader_id: parse_uuid(&reader_text, "loans.reader_id")?,
        loan_date: parse_date(&loan_date_text, "loans.loan_date")?,
        return_date,
    };
    loan.validate()?;
    Ok(loan)
}
