//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over the `books` table.
//!
//! # Invariants
//! - Created books are stored available regardless of the input flag.
//! - `update_book` never writes `available`.
//! - Deleting a book cascades to its loans through the foreign key.
//! - Listing order is `title COLLATE NOCASE ASC, id ASC`.

use crate::model::book::{Book, BookId};
use crate::model::RecordKind;
use crate::repo::page::{push_page_clause, PageRequest};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult,
    BOOKS_SCHEMA, LOANS_SCHEMA,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

pub(crate) const BOOK_SELECT_SQL: &str = "SELECT
    id,
    title,
    author,
    publication_year,
    available
FROM books";

/// Filter for book listing. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title_contains: Option<String>,
    pub author_contains: Option<String>,
    pub available: Option<bool>,
    pub publication_year: Option<i32>,
}

/// Repository interface for book CRUD operations.
pub trait BookRepository {
    fn create_book(&self, book: &Book) -> RepoResult<BookId>;
    /// Updates title, author and publication year.
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Deletes a book and, by cascade, all its loans.
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
    fn list_books(&self, filter: &BookFilter, page: &PageRequest) -> RepoResult<Vec<Book>>;
    fn count_books(&self, filter: &BookFilter) -> RepoResult<u64>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[BOOKS_SCHEMA, LOANS_SCHEMA])?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, book: &Book) -> RepoResult<BookId> {
        book.validate()?;

        self.conn.execute(
            "INSERT INTO books (
                id,
                title,
                author,
                publication_year,
                available
            ) VALUES (?1, ?2, ?3, ?4, 1);",
            params![
                book.id.to_string(),
                book.title.as_str(),
                book.author.as_str(),
                book.publication_year,
            ],
        )?;

        Ok(book.id)
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;

        let changed = self.conn.execute(
            "UPDATE books
             SET
                title = ?1,
                author = ?2,
                publication_year = ?3
             WHERE id = ?4;",
            params![
                book.title.as_str(),
                book.author.as_str(),
                book.publication_year,
                book.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Book,
                id: book.id,
            });
        }

        Ok(())
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        load_book(self.conn, id)
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Book,
                id,
            });
        }

        Ok(())
    }

    fn list_books(&self, filter: &BookFilter, page: &PageRequest) -> RepoResult<Vec<Book>> {
        let (where_sql, mut bind_values) = book_filter_clause(filter);
        let mut sql = format!("{BOOK_SELECT_SQL}{where_sql} ORDER BY title COLLATE NOCASE ASC, id ASC");
        push_page_clause(&mut sql, &mut bind_values, page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }

        Ok(books)
    }

    fn count_books(&self, filter: &BookFilter) -> RepoResult<u64> {
        let (where_sql, bind_values) = book_filter_clause(filter);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM books{where_sql}"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

pub(crate) fn load_book(conn: &Connection, id: BookId) -> RepoResult<Option<Book>> {
    let mut stmt = conn.prepare(&format!("{BOOK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_book_row(row)?));
    }
    Ok(None)
}

fn book_filter_clause(filter: &BookFilter) -> (String, Vec<Value>) {
    let mut sql = String::from(" WHERE 1 = 1");
    let mut bind_values = Vec::new();

    if let Some(title) = filter.title_contains.as_ref() {
        sql.push_str(" AND instr(lower(title), lower(?)) > 0");
        bind_values.push(Value::Text(title.clone()));
    }
    if let Some(author) = filter.author_contains.as_ref() {
        sql.push_str(" AND instr(lower(author), lower(?)) > 0");
        bind_values.push(Value::Text(author.clone()));
    }
    if let Some(available) = filter.available {
        sql.push_str(" AND available = ?");
        bind_values.push(Value::Integer(bool_to_int(available)));
    }
    if let Some(year) = filter.publication_year {
        sql.push_str(" AND publication_year = ?");
        bind_values.push(Value::Integer(i64::from(year)));
    }

    (sql, bind_values)
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let id_text: String = row.get("id")?;
    let book = Book {
        id: parse_uuid(&id_text, "books.id")?,
        title: row.get("title")?,
        author: row.get("author")?,
        publication_year: row.get("publication_year")?,
        available: parse_bool(row.get("available")?, "books.available")?,
    };
    book.validate()?;
    Ok(book)
}
