//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the whole-document persistence contract.
//! - Isolate SQLite and file details from service orchestration.
//!
//! # Invariants
//! - Every load path validates structure through the snapshot codec.
//! - Backing resources are released on every exit path, including errors.

pub mod document_repo;
pub mod file_repo;
