//! In-memory document store for the study hierarchy.
//!
//! # Responsibility
//! - Own boards, subjects, chapters and notes in an identifier-keyed arena.
//! - Enforce hierarchy invariants on every mutation.
//! - Round-trip the whole hierarchy through `serialize`/`deserialize`.
//!
//! # Invariants
//! - Every subject/chapter/note appears exactly once in its parent's child
//!   list and its back-reference names that parent.
//! - A failing operation leaves the store unmodified.
//! - Deleted entities are removed from the arena; later references report
//!   `StoreError::NotFound`, the same as identifiers that never existed.

mod blocks;
mod error;
mod hierarchy;
mod todos;

pub use error::{StoreError, StoreResult};

use crate::codec;
use crate::model::block::ContentBlock;
use crate::model::entity::{
    Board, BoardId, Chapter, ChapterId, EntityId, EntityKind, Note, NoteId, Subject, SubjectId,
};
use std::collections::HashMap;

/// Arena of hierarchy entities.
///
/// This is the explicit document context every operation runs against;
/// independent documents are independent values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStore {
    pub(crate) board_order: Vec<BoardId>,
    pub(crate) boards: HashMap<BoardId, Board>,
    pub(crate) subjects: HashMap<SubjectId, Subject>,
    pub(crate) chapters: HashMap<ChapterId, Chapter>,
    pub(crate) notes: HashMap<NoteId, Note>,
}

impl DocumentStore {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes the whole hierarchy into snapshot bytes.
    pub fn serialize(&self) -> StoreResult<Vec<u8>> {
        codec::encode(self)
    }

    /// Rebuilds a document from snapshot bytes.
    ///
    /// # Errors
    /// - `StoreError::CorruptData` when bytes are malformed or violate any
    ///   structural invariant.
    pub fn deserialize(bytes: &[u8]) -> StoreResult<Self> {
        codec::decode(bytes)
    }

    /// Replaces this document with the one decoded from `bytes`.
    ///
    /// On error the current document is kept unchanged.
    pub fn restore(&mut self, bytes: &[u8]) -> StoreResult<()> {
        *self = Self::deserialize(bytes)?;
        Ok(())
    }

    /// Returns the kind of a live entity.
    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        if self.boards.contains_key(&id) {
            Some(EntityKind::Board)
        } else if self.subjects.contains_key(&id) {
            Some(EntityKind::Subject)
        } else if self.chapters.contains_key(&id) {
            Some(EntityKind::Chapter)
        } else if self.notes.contains_key(&id) {
            Some(EntityKind::Note)
        } else {
            None
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.kind_of(id).is_some()
    }

    /// Total number of live boards, subjects, chapters and notes.
    pub fn entity_count(&self) -> usize {
        self.boards.len() + self.subjects.len() + self.chapters.len() + self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn board(&self, id: BoardId) -> Option<&Board> {
        self.boards.get(&id)
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.get(&id)
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    /// Boards in user-controlled order.
    pub fn boards(&self) -> impl Iterator<Item = &Board> + '_ {
        self.board_order
            .iter()
            .filter_map(move |id| self.boards.get(id))
    }

    /// Subjects of one board in sibling order.
    pub fn subjects_of(&self, board_id: BoardId) -> StoreResult<Vec<&Subject>> {
        let board = self.board_ref(board_id)?;
        Ok(board
            .subjects
            .iter()
            .filter_map(|id| self.subjects.get(id))
            .collect())
    }

    /// Chapters of one subject in sibling order.
    pub fn chapters_of(&self, subject_id: SubjectId) -> StoreResult<Vec<&Chapter>> {
        let subject = self.subject_ref(subject_id)?;
        Ok(subject
            .chapters
            .iter()
            .filter_map(|id| self.chapters.get(id))
            .collect())
    }

    /// Notes of one chapter in sibling order.
    pub fn notes_of(&self, chapter_id: ChapterId) -> StoreResult<Vec<&Note>> {
        let chapter = self.chapter_ref(chapter_id)?;
        Ok(chapter
            .notes
            .iter()
            .filter_map(|id| self.notes.get(id))
            .collect())
    }

    /// Content blocks of one note in order.
    pub fn blocks(&self, note_id: NoteId) -> StoreResult<&[ContentBlock]> {
        Ok(self.note_ref(note_id)?.blocks.as_slice())
    }

    /// Returns the parent identifier; boards have none.
    pub fn parent_of(&self, id: EntityId) -> StoreResult<Option<EntityId>> {
        match self.kind_of(id) {
            None => Err(StoreError::NotFound(id)),
            Some(EntityKind::Board) => Ok(None),
            Some(EntityKind::Subject) => Ok(Some(self.subject_ref(id)?.board_id)),
            Some(EntityKind::Chapter) => Ok(Some(self.chapter_ref(id)?.subject_id)),
            Some(EntityKind::Note) => Ok(Some(self.note_ref(id)?.chapter_id)),
        }
    }

    /// Returns identifiers from the owning board down to `id` inclusive.
    pub fn path_of(&self, id: EntityId) -> StoreResult<Vec<EntityId>> {
        let mut path = vec![id];
        let mut cursor = self.parent_of(id)?;
        while let Some(parent) = cursor {
            path.push(parent);
            cursor = self.parent_of(parent)?;
        }
        path.reverse();
        Ok(path)
    }

    /// Returns the display name of a board/subject/chapter or a note title.
    pub fn display_name(&self, id: EntityId) -> StoreResult<&str> {
        match self.kind_of(id) {
            None => Err(StoreError::NotFound(id)),
            Some(EntityKind::Board) => Ok(self.board_ref(id)?.name.as_str()),
            Some(EntityKind::Subject) => Ok(self.subject_ref(id)?.name.as_str()),
            Some(EntityKind::Chapter) => Ok(self.chapter_ref(id)?.name.as_str()),
            Some(EntityKind::Note) => Ok(self.note_ref(id)?.title.as_str()),
        }
    }

    /// Checks that `id` is live and of `expected` kind.
    pub(crate) fn require(&self, id: EntityId, expected: EntityKind) -> StoreResult<()> {
        match self.kind_of(id) {
            None => Err(StoreError::NotFound(id)),
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(StoreError::TypeMismatch {
                id,
                expected: Some(expected),
                actual,
            }),
        }
    }

    fn board_ref(&self, id: BoardId) -> StoreResult<&Board> {
        self.require(id, EntityKind::Board)?;
        self.boards.get(&id).ok_or(StoreError::NotFound(id))
    }

    fn subject_ref(&self, id: SubjectId) -> StoreResult<&Subject> {
        self.require(id, EntityKind::Subject)?;
        self.subjects.get(&id).ok_or(StoreError::NotFound(id))
    }

    fn chapter_ref(&self, id: ChapterId) -> StoreResult<&Chapter> {
        self.require(id, EntityKind::Chapter)?;
        self.chapters.get(&id).ok_or(StoreError::NotFound(id))
    }

    fn note_ref(&self, id: NoteId) -> StoreResult<&Note> {
        self.require(id, EntityKind::Note)?;
        self.notes.get(&id).ok_or(StoreError::NotFound(id))
    }

    fn board_mut(&mut self, id: BoardId) -> StoreResult<&mut Board> {
        self.require(id, EntityKind::Board)?;
        self.boards.get_mut(&id).ok_or(StoreError::NotFound(id))
    }

    fn note_mut(&mut self, id: NoteId) -> StoreResult<&mut Note> {
        self.require(id, EntityKind::Note)?;
        self.notes.get_mut(&id).ok_or(StoreError::NotFound(id))
    }

    /// Ordered child identifiers of a container entity.
    fn child_ids(&self, parent: EntityId) -> StoreResult<&Vec<EntityId>> {
        match self.kind_of(parent) {
            None => Err(StoreError::NotFound(parent)),
            Some(EntityKind::Board) => Ok(&self.board_ref(parent)?.subjects),
            Some(EntityKind::Subject) => Ok(&self.subject_ref(parent)?.chapters),
            Some(EntityKind::Chapter) => Ok(&self.chapter_ref(parent)?.notes),
            Some(EntityKind::Note) => Err(StoreError::TypeMismatch {
                id: parent,
                expected: None,
                actual: EntityKind::Note,
            }),
        }
    }

    fn child_ids_mut(&mut self, parent: EntityId) -> StoreResult<&mut Vec<EntityId>> {
        if let Some(board) = self.boards.get_mut(&parent) {
            return Ok(&mut board.subjects);
        }
        if let Some(subject) = self.subjects.get_mut(&parent) {
            return Ok(&mut subject.chapters);
        }
        if let Some(chapter) = self.chapters.get_mut(&parent) {
            return Ok(&mut chapter.notes);
        }
        Err(StoreError::NotFound(parent))
    }
}

/// Trims a user-facing name and rejects blank values.
pub(crate) fn normalize_name(value: String, field: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

/// Checks `index` against the exclusive upper `bound`.
pub(crate) fn check_index(index: usize, bound: usize) -> StoreResult<()> {
    if index >= bound {
        return Err(StoreError::InvalidIndex { index, bound });
    }
    Ok(())
}
