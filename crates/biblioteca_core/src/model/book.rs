//! Book catalog record.
//!
//! # Invariants
//! - `available` is false iff an open loan references this book.
//! - New books always start available; catalog edits never touch the flag.

use crate::model::validation::{
    normalize_text, validate_publication_year, ValidationError, AUTHOR_MAX_CHARS,
    TITLE_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a book.
pub type BookId = Uuid;

/// Canonical book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    /// Derived from loan state. Written only through the availability rules.
    pub available: bool,
}

impl Book {
    /// Creates an available book with a generated id.
    pub fn new(title: impl Into<String>, author: impl Into<String>, publication_year: i32) -> Self {
        Self::with_id(Uuid::new_v4(), title, author, publication_year)
    }

    /// Creates an available book with a caller-provided id.
    pub fn with_id(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        publication_year: i32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            publication_year,
            available: true,
        }
    }

    /// Checks stored field constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_text("title", &self.title, TITLE_MAX_CHARS)?;
        normalize_text("author", &self.author, AUTHOR_MAX_CHARS)?;
        validate_publication_year(self.publication_year)?;
        Ok(())
    }
}

/// Input for cataloguing a new book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publication_year: i32,
}

impl NewBook {
    /// Validates and normalizes input into an available `Book`.
    pub fn into_book(self) -> Result<Book, ValidationError> {
        let title = normalize_text("title", &self.title, TITLE_MAX_CHARS)?;
        let author = normalize_text("author", &self.author, AUTHOR_MAX_CHARS)?;
        let publication_year = validate_publication_year(self.publication_year)?;
        Ok(Book::new(title, author, publication_year))
    }
}

/// Partial edit of descriptive book fields. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
}

impl BookChanges {
    /// Applies validated changes to `book`; leaves it untouched on error.
    pub fn apply_to(&self, book: &mut Book) -> Result<(), ValidationError> {
        let title = match self.title.as_deref() {
            Some(value) => normalize_text("title", value, TITLE_MAX_CHARS)?,
            None => book.title.clone(),
        };
        let author = match self.author.as_deref() {
            Some(value) => normalize_text("author", value, AUTHOR_MAX_CHARS)?,
            None => book.author.clone(),
        };
        let publication_year = match self.publication_year {
            Some(value) => validate_publication_year(value)?,
            None => book.publication_year,
        };

        book.title = title;
        book.author = author;
        book.publication_year = publication_year;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.publication_year.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_book_is_available_and_trimmed() {
        let book = NewBook {
            title: "  Dune ".to_string(),
            author: "Frank Herbert".to_string(),
            publication_year: 1965,
        }
        .into_book()
        .unwrap();
        assert_eq!(book.title, "Dune");
        assert!(book.available);
    }

    #[test]
    fn failed_changes_leave_book_untouched() {
        let mut book = Book::new("Dune", "Frank Herbert", 1965);
        let changes = BookChanges {
            title: Some("Dune Messiah".to_string()),
            publication_year: Some(-5),
            ..BookChanges::default()
        };
        assert!(changes.apply_to(&mut book).is_err());
        assert_eq!(book.title, "Dune");
        assert_eq!(book.publication_year, 1965);
    }
}
