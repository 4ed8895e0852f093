//! Book catalog use-case service.
//!
//! # Responsibility
//! - Validate catalog input and delegate persistence to `BookRepository`.
//! - Serve the filtered, paginated book listing.
//!
//! # Invariants
//! - Catalog edits never change `available`.

use crate::auth::AuthContext;
use crate::model::book::{Book, BookChanges, BookId, NewBook};
use crate::repo::book_repo::{BookFilter, BookRepository};
use crate::repo::page::{Page, PageRequest};
use crate::service::{normalize_filter_text, require_user, ServiceError, ServiceResult};
use log::info;

/// Book service facade over repository implementations.
pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Catalogues a new, available book.
    pub fn create_book(&self, auth: &AuthContext, input: NewBook) -> ServiceResult<Book> {
        let actor = require_user(auth)?;
        let book = input.into_book()?;
        let book_id = self.repo.create_book(&book)?;
        info!("event=book_create module=service status=ok book_id={book_id} actor={actor}");

        self.repo
            .get_book(book_id)?
            .ok_or(ServiceError::InconsistentState(
                "created book not found in read-back",
            ))
    }

    pub fn get_book(&self, auth: &AuthContext, id: BookId) -> ServiceResult<Book> {
        require_user(auth)?;
        self.repo.get_book(id)?.ok_or(ServiceError::BookNotFound(id))
    }

    /// Edits title, author or publication year.
    pub fn update_book(
        &self,
        auth: &AuthContext,
        id: BookId,
        changes: BookChanges,
    ) -> ServiceResult<Book> {
        let actor = require_user(auth)?;
        let mut book = self.repo.get_book(id)?.ok_or(ServiceError::BookNotFound(id))?;
        if changes.is_empty() {
            return Ok(book);
        }

        changes.apply_to(&mut book)?;
        self.repo.update_book(&book)?;
        info!("event=book_update module=service status=ok book_id={id} actor={actor}");

        self.repo
            .get_book(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated book not found in read-back",
            ))
    }

    /// Deletes a book together with its loan history.
    pub fn delete_book(&self, auth: &AuthContext, id: BookId) -> ServiceResult<()> {
        let actor = require_user(auth)?;
        self.repo.delete_book(id)?;
        info!("event=book_delete module=service status=ok book_id={id} actor={actor}");
        Ok(())
    }

    /// Lists books by optional title/author substring and availability.
    pub fn list_books(
        &self,
        auth: &AuthContext,
        filter: BookFilter,
        page: PageRequest,
    ) -> ServiceResult<Page<Book>> {
        require_user(auth)?;
        let filter = BookFilter {
            title_contains: normalize_filter_text(filter.title_contains),
            author_contains: normalize_filter_text(filter.author_contains),
            ..filter
        };
        let page = page.normalized();

        let items = self.repo.list_books(&filter, &page)?;
        let total = self.repo.count_books(&filter)?;
        Ok(Page {
            items,
            applied_limit: page.applied_limit(),
            offset: page.offset,
            total,
        })
    }
}
