//! Document domain model for the Board → Subject → Chapter → Note hierarchy.
//!
//! # Responsibility
//! - Define the entity records owned by the document store arena.
//! - Define the closed set of note content blocks.
//!
//! # Invariants
//! - Every entity is identified by a stable `EntityId`.
//! - Parent links are identifiers, never owning pointers.
//! - Content blocks are values; edits replace a block wholesale.

pub mod block;
pub mod entity;
