//! Core domain logic for StudyNote.
//! This crate is the single source of truth for hierarchy invariants.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod store;

pub use config::{ConfigError, StudyConfig, Theme};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::block::{
    AssetRef, BlockValidationError, ContentBlock, InlineRun, InlineStyle, MAX_HEADING_LEVEL,
};
pub use model::entity::{
    Board, BoardId, Chapter, ChapterId, EntityId, EntityKind, Note, NoteId, Subject, SubjectId,
    TodoId, TodoItem,
};
pub use repo::document_repo::{
    DocumentRepoError, DocumentRepoResult, DocumentRepository, SqliteDocumentRepository,
};
pub use repo::file_repo::JsonFileDocumentRepository;
pub use search::note_search::{search_notes, SearchHit, SearchQuery};
pub use service::document_service::{DocumentService, DocumentServiceError, ServiceResult};
pub use service::preview::{derive_note_preview, NotePreview};
pub use store::{DocumentStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
