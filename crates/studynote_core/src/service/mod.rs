//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate document store and repository calls into use-case APIs.
//! - Keep UI/CLI layers decoupled from storage details.

pub mod document_service;
pub mod preview;
