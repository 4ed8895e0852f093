//! Reader repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and search over the `readers` table.
//! - Translate email collisions into `UniqueConstraintViolation`.
//!
//! # Invariants
//! - Emails are unique case-insensitively (`COLLATE NOCASE` on the column).
//! - Deleting a reader frees every book the reader still holds, then
//!   cascades to the reader's loans, in one transaction.

use crate::model::reader::{Reader, ReaderId};
use crate::model::RecordKind;
use crate::repo::page::{push_page_clause, PageRequest};
use crate::repo::{
    ensure_connection_ready, is_unique_violation, parse_uuid, RepoError, RepoResult,
    BOOKS_SCHEMA, LOANS_SCHEMA, READERS_SCHEMA,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const READER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email
FROM readers";

/// Repository interface for reader CRUD operations.
pub trait ReaderRepository {
    fn create_reader(&self, reader: &Reader) -> RepoResult<ReaderId>;
    fn update_reader(&self, reader: &Reader) -> RepoResult<()>;
    fn get_reader(&self, id: ReaderId) -> RepoResult<Option<Reader>>;
    /// Deletes a reader and, by cascade, all their loans.
    fn delete_reader(&self, id: ReaderId) -> RepoResult<()>;
    /// Lists readers whose name or email contains `search` (case-insensitive).
    fn list_readers(&self, search: Option<&str>, page: &PageRequest) -> RepoResult<Vec<Reader>>;
    fn count_readers(&self, search: Option<&str>) -> RepoResult<u64>;
}

/// SQLite-backed reader repository.
pub struct SqliteReaderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReaderRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[READERS_SCHEMA, LOANS_SCHEMA, BOOKS_SCHEMA])?;
        Ok(Self { conn })
    }
}

impl ReaderRepository for SqliteReaderRepository<'_> {
    fn create_reader(&self, reader: &Reader) -> RepoResult<ReaderId> {
        reader.validate()?;

        self.conn
            .execute(
                "INSERT INTO readers (id, name, email) VALUES (?1, ?2, ?3);",
                params![
                    reader.id.to_string(),
                    reader.name.as_str(),
                    reader.email.as_str(),
                ],
            )
            .map_err(|err| map_email_conflict(err, reader))?;

        Ok(reader.id)
    }

    fn update_reader(&self, reader: &Reader) -> RepoResult<()> {
        reader.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE readers
                 SET
                    name = ?1,
                    email = ?2
                 WHERE id = ?3;",
                params![
                    reader.name.as_str(),
                    reader.email.as_str(),
                    reader.id.to_string(),
                ],
            )
            .map_err(|err| map_email_conflict(err, reader))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Reader,
                id: reader.id,
            });
        }

        Ok(())
    }

    fn get_reader(&self, id: ReaderId) -> RepoResult<Option<Reader>> {
        load_reader(self.conn, id)
    }

    fn delete_reader(&self, id: ReaderId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "UPDATE books
             SET available = 1
             WHERE id IN (
                SELECT book_id
                FROM loans
                WHERE reader_id = ?1
                  AND return_date IS NULL
             );",
            [id_text.as_str()],
        )?;
        let changed = tx.execute("DELETE FROM readers WHERE id = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Reader,
                id,
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn list_readers(&self, search: Option<&str>, page: &PageRequest) -> RepoResult<Vec<Reader>> {
        let (where_sql, mut bind_values) = reader_search_clause(search);
        let mut sql =
            format!("{READER_SELECT_SQL}{where_sql} ORDER BY name COLLATE NOCASE ASC, id ASC");
        push_page_clause(&mut sql, &mut bind_values, page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut readers = Vec::new();
        while let Some(row) = rows.next()? {
            readers.push(parse_reader_row(row)?);
        }

        Ok(readers)
    }

    fn count_readers(&self, search: Option<&str>) -> RepoResult<u64> {
        let (where_sql, bind_values) = reader_search_clause(search);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM readers{where_sql}"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

pub(crate) fn load_reader(conn: &Connection, id: ReaderId) -> RepoResult<Option<Reader>> {
    let mut stmt = conn.prepare(&format!("{READER_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_reader_row(row)?));
    }
    Ok(None)
}

fn map_email_conflict(err: rusqlite::Error, reader: &Reader) -> RepoError {
    if is_unique_violation(&err) {
        RepoError::UniqueConstraintViolation {
            field: "email",
            value: reader.email.clone(),
        }
    } else {
        err.into()
    }
}

fn reader_search_clause(search: Option<&str>) -> (String, Vec<Value>) {
    match search {
        Some(text) => (
            " WHERE instr(lower(name), lower(?1)) > 0 OR instr(lower(email), lower(?1)) > 0"
                .to_string(),
            vec![Value::Text(text.to_string())],
        ),
        None => (String::new(), Vec::new()),
    }
}

fn parse_reader_row(row: &Row<'_>) -> RepoResult<Reader> {
    let id_text: String = row.get("id")?;
    let reader = Reader {
        id: parse_uuid(&id_text, "readers.id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    };
    reader.validate()?;
    Ok(reader)
}
