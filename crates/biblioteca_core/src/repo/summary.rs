//! Library-wide record counts for dashboards.

use crate::repo::RepoResult;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryCounts {
    pub books: u64,
    pub available_books: u64,
    pub readers: u64,
    pub loans: u64,
    pub open_loans: u64,
}

/// Counts books, readers and loans in one read.
pub fn library_counts(conn: &Connection) -> RepoResult<LibraryCounts> {
    let counts = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM books),
            (SELECT COUNT(*) FROM books WHERE available = 1),
            (SELECT COUNT(*) FROM readers),
            (SELECT COUNT(*) FROM loans),
            (SELECT COUNT(*) FROM loans WHERE return_date IS NULL);",
        [],
        |row| {
            Ok(LibraryCounts {
                books: row.get::<_, i64>(0)?.max(0) as u64,
                available_books: row.get::<_, i64>(1)?.max(0) as u64,
                readers: row.get::<_, i64>(2)?.max(0) as u64,
                loans: row.get::<_, i64>(3)?.max(0) as u64,
                open_loans: row.get::<_, i64>(4)?.max(0) as u64,
            })
        },
    )?;
    Ok(counts)
}
