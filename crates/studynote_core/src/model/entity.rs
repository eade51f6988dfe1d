//! Hierarchy entity records.
//!
//! # Responsibility
//! - Define boards, subjects, chapters and notes as arena records.
//! - Provide the parent/child kind rules used by store and codec.
//!
//! # Invariants
//! - `Subject::board_id`, `Chapter::subject_id` and `Note::chapter_id` are
//!   back-references only; ownership lives in the parent's child list.
//! - Child lists hold each child identifier exactly once.

use crate::model::block::ContentBlock;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier shared by every hierarchy entity.
pub type EntityId = Uuid;
/// Identifier of a top-level board.
pub type BoardId = EntityId;
/// Identifier of a subject.
pub type SubjectId = EntityId;
/// Identifier of a chapter.
pub type ChapterId = EntityId;
/// Identifier of a note.
pub type NoteId = EntityId;
/// Identifier of one board to-do item.
pub type TodoId = Uuid;

/// Hierarchy level of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Board,
    Subject,
    Chapter,
    Note,
}

impl EntityKind {
    /// Returns the kind a parent of this kind must have.
    ///
    /// Boards are roots and return `None`.
    pub fn parent_kind(self) -> Option<EntityKind> {
        match self {
            Self::Board => None,
            Self::Subject => Some(Self::Board),
            Self::Chapter => Some(Self::Subject),
            Self::Note => Some(Self::Chapter),
        }
    }

    /// Returns the kind of children this kind owns.
    ///
    /// Notes are leaves and return `None`.
    pub fn child_kind(self) -> Option<EntityKind> {
        match self {
            Self::Board => Some(Self::Subject),
            Self::Subject => Some(Self::Chapter),
            Self::Chapter => Some(Self::Note),
            Self::Note => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Subject => "subject",
            Self::Chapter => "chapter",
            Self::Note => "note",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level grouping of study material, e.g. one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Ordered child subjects.
    pub subjects: Vec<SubjectId>,
    /// Ordered checklist attached to this board.
    pub todos: Vec<TodoItem>,
}

/// Named grouping within one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub board_id: BoardId,
    /// Ordered child chapters.
    pub chapters: Vec<ChapterId>,
}

/// Named grouping within one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: ChapterId,
    pub name: String,
    pub subject_id: SubjectId,
    /// Ordered child notes.
    pub notes: Vec<NoteId>,
}

/// Leaf document composed of ordered content blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub chapter_id: ChapterId,
    pub blocks: Vec<ContentBlock>,
    /// Unix epoch milliseconds of the last title or block change.
    pub updated_at: i64,
}

/// One checkable line of a board to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// Returns the current wall clock as Unix epoch milliseconds.
///
/// Clocks set before the epoch report `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::EntityKind;

    #[test]
    fn parent_and_child_kinds_are_inverse() {
        for kind in [
            EntityKind::Board,
            EntityKind::Subject,
            EntityKind::Chapter,
            EntityKind::Note,
        ] {
            if let Some(child) = kind.child_kind() {
                assert_eq!(child.parent_kind(), Some(kind));
            }
        }
        assert_eq!(EntityKind::Board.parent_kind(), None);
        assert_eq!(EntityKind::Note.child_kind(), None);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&EntityKind::Chapter).unwrap();
        assert_eq!(json, "\"chapter\"");
    }
}
