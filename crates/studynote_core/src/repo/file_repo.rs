//! JSON snapshot file repository.
//!
//! # Responsibility
//! - Persist a document as one serialized snapshot file.
//!
//! # Invariants
//! - Saves write a sibling temp file and rename it over the target, so a
//!   failed save never truncates the previous snapshot.
//! - A missing file loads as an empty document.

use super::document_repo::{DocumentRepoResult, DocumentRepository};
use crate::model::entity::now_epoch_ms;
use crate::store::DocumentStore;
use log::{info, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use uuid::Uuid;

/// Document repository backed by a single snapshot file.
#[derive(Debug, Clone)]
pub struct JsonFileDocumentRepository {
    path: PathBuf,
}

impl JsonFileDocumentRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file carrying a per-call nonce.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            Uuid::new_v4().simple()
        ));
        self.path.with_file_name(name)
    }
}

impl DocumentRepository for JsonFileDocumentRepository {
    fn save_document(&self, store: &DocumentStore) -> DocumentRepoResult<()> {
        let bytes = store.serialize()?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(err) = written.and_then(|()| fs::rename(&temp_path, &self.path)) {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                warn!(
                    "event=document_save module=repo status=warn backend=file cleanup_error={cleanup}"
                );
            }
            return Err(err.into());
        }

        info!(
            "event=document_save module=repo status=ok backend=file entities={} bytes={} at={}",
            store.entity_count(),
            bytes.len(),
            now_epoch_ms()
        );
        Ok(())
    }

    fn load_document(&self) -> DocumentRepoResult<DocumentStore> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(DocumentStore::new()),
            Err(err) => return Err(err.into()),
        };
        let store = DocumentStore::deserialize(&bytes)?;
        info!(
            "event=document_load module=repo status=ok backend=file entities={}",
            store.entity_count()
        );
        Ok(store)
    }

    fn last_saved_at(&self) -> DocumentRepoResult<Option<i64>> {
        match fs::metadata(&self.path) {
            Ok(metadata) => {
                let saved_at = metadata
                    .modified()?
                    .duration_since(UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_millis() as i64)
                    .unwrap_or(0);
                Ok(Some(saved_at))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
