//! Document store error surface.

use crate::model::block::BlockValidationError;
use crate::model::entity::{EntityId, EntityKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by document store operations.
///
/// Every failing operation leaves the store exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Malformed input such as a blank name or invalid block payload.
    Validation(String),
    /// Identifier never existed or was deleted.
    NotFound(EntityId),
    /// Entity exists but has the wrong kind for this operation.
    ///
    /// `expected` is `None` when no kind fits, e.g. a board given a parent.
    TypeMismatch {
        id: EntityId,
        expected: Option<EntityKind>,
        actual: EntityKind,
    },
    /// Index outside `0..bound`.
    InvalidIndex { index: usize, bound: usize },
    /// Persisted data violates structural invariants.
    CorruptData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::TypeMismatch {
                id,
                expected: Some(expected),
                actual,
            } => write!(f, "entity {id} is a {actual}, expected a {expected}"),
            Self::TypeMismatch {
                id,
                expected: None,
                actual,
            } => write!(f, "entity {id} is a {actual} and cannot be used here"),
            Self::InvalidIndex { index, bound } => {
                write!(f, "index {index} is outside valid range 0..{bound}")
            }
            Self::CorruptData(message) => write!(f, "corrupt document data: {message}"),
        }
    }
}

impl Error for StoreError {}

impl From<BlockValidationError> for StoreError {
    fn from(value: BlockValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}
