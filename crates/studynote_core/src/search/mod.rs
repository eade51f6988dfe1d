//! Note search entry points.
//!
//! # Responsibility
//! - Expose keyword search over live notes of one document.
//! - Keep search result shaping inside core.

pub mod note_search;
