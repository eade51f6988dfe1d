//! Document use-case service.
//!
//! # Responsibility
//! - Own one live document behind a reader/writer lock.
//! - Couple the document with a repository for commit and reload.
//! - Emit one structured log line per write.
//!
//! # Invariants
//! - Readers never observe a half-applied write: writes run on a working
//!   copy that is published only when the whole closure succeeds.
//! - `reload` replaces the live document only after a successful load.

use crate::model::entity::NoteId;
use crate::repo::document_repo::{DocumentRepoError, DocumentRepository};
use crate::search::note_search::{search_notes, SearchHit, SearchQuery};
use crate::service::preview::{derive_note_preview, NotePreview};
use crate::store::{DocumentStore, StoreError, StoreResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

/// Result type for document service calls.
pub type ServiceResult<T> = Result<T, DocumentServiceError>;

/// Errors from document service operations.
#[derive(Debug)]
pub enum DocumentServiceError {
    /// Document-level failure, including corrupt persisted data.
    Store(StoreError),
    /// Persistence failure other than document validation.
    Repo(DocumentRepoError),
    /// A writer panicked while holding the document lock.
    LockPoisoned,
}

impl Display for DocumentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "document lock poisoned by a panicked writer"),
        }
    }
}

impl Error for DocumentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::LockPoisoned => None,
        }
    }
}

impl From<StoreError> for DocumentServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DocumentRepoError> for DocumentServiceError {
    fn from(value: DocumentRepoError) -> Self {
        match value {
            DocumentRepoError::Store(err) => Self::Store(err),
            other => Self::Repo(other),
        }
    }
}

/// Document service facade over a repository implementation.
pub struct DocumentService<R: DocumentRepository> {
    repo: R,
    store: RwLock<DocumentStore>,
}

impl<R: DocumentRepository> DocumentService<R> {
    /// Creates a service with an empty document.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            store: RwLock::new(DocumentStore::new()),
        }
    }

    /// Creates a service holding the document currently persisted in `repo`.
    pub fn open(repo: R) -> ServiceResult<Self> {
        let store = repo.load_document()?;
        info!(
            "event=document_open module=service status=ok entities={}",
            store.entity_count()
        );
        Ok(Self {
            repo,
            store: RwLock::new(store),
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Runs `f` against the live document under a shared lock.
    pub fn read<T>(&self, f: impl FnOnce(&DocumentStore) -> T) -> ServiceResult<T> {
        let guard = self.read_guard()?;
        Ok(f(&*guard))
    }

    /// Runs one mutation under the exclusive lock.
    ///
    /// `f` may chain several store operations; either all of them become
    /// visible or none do.
    pub fn write<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut DocumentStore) -> StoreResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let mut guard = self.write_guard()?;
        let mut working = (*guard).clone();
        match f(&mut working) {
            Ok(value) => {
                *guard = working;
                info!(
                    "event=document_write module=service status=ok op={op} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event=document_write module=service status=error op={op} error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Persists the live document.
    pub fn commit(&self) -> ServiceResult<()> {
        let guard = self.read_guard()?;
        self.repo.save_document(&guard).map_err(|err| {
            warn!("event=document_commit module=service status=error error={err}");
            DocumentServiceError::from(err)
        })?;
        info!(
            "event=document_commit module=service status=ok entities={}",
            guard.entity_count()
        );
        Ok(())
    }

    /// Replaces the live document with the persisted one.
    pub fn reload(&self) -> ServiceResult<()> {
        let loaded = self.repo.load_document()?;
        let mut guard = self.write_guard()?;
        *guard = loaded;
        info!(
            "event=document_reload module=service status=ok entities={}",
            guard.entity_count()
        );
        Ok(())
    }

    /// Returns a detached copy of the live document.
    pub fn snapshot(&self) -> ServiceResult<DocumentStore> {
        self.read(DocumentStore::clone)
    }

    /// Derives the list preview of one note.
    pub fn note_preview(&self, note_id: NoteId) -> ServiceResult<NotePreview> {
        let guard = self.read_guard()?;
        let note = guard.note(note_id).ok_or(StoreError::NotFound(note_id))?;
        Ok(derive_note_preview(note))
    }

    /// Keyword search over live notes.
    pub fn search(&self, query: &SearchQuery) -> ServiceResult<Vec<SearchHit>> {
        self.read(|store| search_notes(store, query))
    }

    fn read_guard(&self) -> ServiceResult<RwLockReadGuard<'_, DocumentStore>> {
        self.store
            .read()
            .map_err(|_| DocumentServiceError::LockPoisoned)
    }

    fn write_guard(&self) -> ServiceResult<RwLockWriteGuard<'_, DocumentStore>> {
        self.store
            .write()
            .map_err(|_| DocumentServiceError::LockPoisoned)
    }
}
