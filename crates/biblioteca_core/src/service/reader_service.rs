//! Reader registry use-case service.
//!
//! # Invariants
//! - Email uniqueness is enforced by storage and surfaced as
//!   `ServiceError::DuplicateEmail`.

use crate::auth::AuthContext;
use crate::model::reader::{NewReader, Reader, ReaderChanges, ReaderId};
use crate::repo::page::{Page, PageRequest};
use crate::repo::reader_repo::ReaderRepository;
use crate::service::{normalize_filter_text, require_user, ServiceError, ServiceResult};
use log::{info, warn};

pub struct ReaderService<R: ReaderRepository> {
    repo: R,
}

impl<R: ReaderRepository> ReaderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_reader(&self, auth: &AuthContext, input: NewReader) -> ServiceResult<Reader> {
        let actor = require_user(auth)?;
        let reader = input.into_reader()?;
        let reader_id = self.repo.create_reader(&reader).map_err(|err| {
            let err = ServiceError::from(err);
            if matches!(err, ServiceError::DuplicateEmail(_)) {
                warn!("event=reader_create module=service status=conflict error_code=duplicate_email actor={actor}");
            }
            err
        })?;
        info!("event=reader_create module=service status=ok reader_id={reader_id} actor={actor}");

        self.repo
            .get_reader(reader_id)?
            .ok_or(ServiceError::InconsistentState(
                "created reader not found in read-back",
            ))
    }

    pub fn get_reader(&self, auth: &AuthContext, id: ReaderId) -> ServiceResult<Reader> {
        require_user(auth)?;
        self.repo
            .get_reader(id)?
            .ok_or(ServiceError::ReaderNotFound(id))
    }

    pub fn update_reader(
        &self,
        auth: &AuthContext,
        id: ReaderId,
        changes: ReaderChanges,
    ) -> ServiceResult<Reader> {
        let actor = require_user(auth)?;
        let mut reader = self
            .repo
            .get_reader(id)?
            .ok_or(ServiceError::ReaderNotFound(id))?;
        if changes.is_empty() {
            return Ok(reader);
        }

        changes.apply_to(&mut reader)?;
        self.repo.update_reader(&reader)?;
        info!("event=reader_update module=service status=ok reader_id={id} actor={actor}");

        self.repo
            .get_reader(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated reader not found in read-back",
            ))
    }

    /// Deletes a reader and their loans; books they still held become
    /// available again.
    pub fn delete_reader(&self, auth: &AuthContext, id: ReaderId) -> ServiceResult<()> {
        let actor = require_user(auth)?;
        self.repo.delete_reader(id)?;
        info!("event=reader_delete module=service status=ok reader_id={id} actor={actor}");
        Ok(())
    }

    /// Lists readers, optionally matching name or email substrings.
    pub fn list_readers(
        &self,
        auth: &AuthContext,
        search: Option<String>,
        page: PageRequest,
    ) -> ServiceResult<Page<Reader>> {
        require_user(auth)?;
        let search = normalize_filter_text(search);
        let page = page.normalized();

        let items = self.repo.list_readers(search.as_deref(), &page)?;
        let total = self.repo.count_readers(search.as_deref())?;
        Ok(Page {
            items,
            applied_limit: page.applied_limit(),
            offset: page.offset,
            total,
        })
    }
}
