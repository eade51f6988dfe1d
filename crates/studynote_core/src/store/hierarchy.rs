//! Create, rename, move and delete for hierarchy entities.

use super::{check_index, normalize_name, DocumentStore, StoreError, StoreResult};
use crate::model::entity::{
    now_epoch_ms, Board, BoardId, Chapter, ChapterId, EntityId, EntityKind, Note, NoteId, Subject,
    SubjectId,
};
use log::debug;
use uuid::Uuid;

impl DocumentStore {
    /// Appends a new board at the end of the top-level order.
    pub fn create_board(&mut self, name: impl Into<String>) -> StoreResult<BoardId> {
        let name = normalize_name(name.into(), "board name")?;
        let id = Uuid::new_v4();
        self.boards.insert(
            id,
            Board {
                id,
                name,
                created_at: now_epoch_ms(),
                subjects: Vec::new(),
                todos: Vec::new(),
            },
        );
        self.board_order.push(id);
        debug!("event=entity_create module=store status=ok kind=board id={id}");
        Ok(id)
    }

    /// Appends a new subject under `board_id`.
    pub fn create_subject(
        &mut self,
        board_id: BoardId,
        name: impl Into<String>,
    ) -> StoreResult<SubjectId> {
        let name = normalize_name(name.into(), "subject name")?;
        let board = self.board_mut(board_id)?;
        let id = Uuid::new_v4();
        board.subjects.push(id);
        self.subjects.insert(
            id,
            Subject {
                id,
                name,
                board_id,
                chapters: Vec::new(),
            },
        );
        debug!("event=entity_create module=store status=ok kind=subject id={id}");
        Ok(id)
    }

    /// Appends a new chapter under `subject_id`.
    pub fn create_chapter(
        &mut self,
        subject_id: SubjectId,
        name: impl Into<String>,
    ) -> StoreResult<ChapterId> {
        let name = normalize_name(name.into(), "chapter name")?;
        self.require(subject_id, EntityKind::Subject)?;
        let id = Uuid::new_v4();
        self.child_ids_mut(subject_id)?.push(id);
        self.chapters.insert(
            id,
            Chapter {
                id,
                name,
                subject_id,
                notes: Vec::new(),
            },
        );
        debug!("event=entity_create module=store status=ok kind=chapter id={id}");
        Ok(id)
    }

    /// Appends a new empty note under `chapter_id`.
    pub fn create_note(
        &mut self,
        chapter_id: ChapterId,
        title: impl Into<String>,
    ) -> StoreResult<NoteId> {
        let title = normalize_name(title.into(), "note title")?;
        self.require(chapter_id, EntityKind::Chapter)?;
        let id = Uuid::new_v4();
        self.child_ids_mut(chapter_id)?.push(id);
        self.notes.insert(
            id,
            Note {
                id,
                title,
                chapter_id,
                blocks: Vec::new(),
                updated_at: now_epoch_ms(),
            },
        );
        debug!("event=entity_create module=store status=ok kind=note id={id}");
        Ok(id)
    }

    /// Renames a board, subject or chapter, or retitles a note.
    pub fn rename_entity(&mut self, id: EntityId, name: impl Into<String>) -> StoreResult<()> {
        let kind = self.kind_of(id).ok_or(StoreError::NotFound(id))?;
        let name = normalize_name(name.into(), "name")?;
        match kind {
            EntityKind::Board => {
                if let Some(board) = self.boards.get_mut(&id) {
                    board.name = name;
                }
            }
            EntityKind::Subject => {
                if let Some(subject) = self.subjects.get_mut(&id) {
                    subject.name = name;
                }
            }
            EntityKind::Chapter => {
                if let Some(chapter) = self.chapters.get_mut(&id) {
                    chapter.name = name;
                }
            }
            EntityKind::Note => {
                let note = self.note_mut(id)?;
                note.title = name;
                note.updated_at = now_epoch_ms();
            }
        }
        Ok(())
    }

    /// Relocates a subject, chapter or note to `new_parent_id` at `new_index`.
    ///
    /// `new_index` ranges over `0..=n`, where `n` is the destination child
    /// count not counting the moved entity itself.
    ///
    /// # Errors
    /// - `NotFound` when either identifier is unknown.
    /// - `TypeMismatch` when the entity is a board, or the parent kind does
    ///   not own entities of this kind.
    /// - `InvalidIndex` when `new_index` is out of range.
    pub fn move_entity(
        &mut self,
        entity_id: EntityId,
        new_parent_id: EntityId,
        new_index: usize,
    ) -> StoreResult<()> {
        let kind = self
            .kind_of(entity_id)
            .ok_or(StoreError::NotFound(entity_id))?;
        let parent_kind = self
            .kind_of(new_parent_id)
            .ok_or(StoreError::NotFound(new_parent_id))?;
        let expected_parent = kind.parent_kind().ok_or(StoreError::TypeMismatch {
            id: entity_id,
            expected: None,
            actual: kind,
        })?;
        if parent_kind != expected_parent {
            return Err(StoreError::TypeMismatch {
                id: new_parent_id,
                expected: Some(expected_parent),
                actual: parent_kind,
            });
        }
        let old_parent_id = self
            .parent_of(entity_id)?
            .ok_or(StoreError::NotFound(entity_id))?;

        // Build both sibling lists first so the commit below cannot fail halfway.
        let mut destination = self.child_ids(new_parent_id)?.clone();
        destination.retain(|id| *id != entity_id);
        check_index(new_index, destination.len() + 1)?;
        destination.insert(new_index, entity_id);

        let source = if old_parent_id == new_parent_id {
            None
        } else {
            let mut source = self.child_ids(old_parent_id)?.clone();
            source.retain(|id| *id != entity_id);
            Some(source)
        };

        *self.child_ids_mut(new_parent_id)? = destination;
        if let Some(source) = source {
            *self.child_ids_mut(old_parent_id)? = source;
        }
        self.set_parent(entity_id, new_parent_id);
        debug!(
            "event=entity_move module=store status=ok kind={kind} id={entity_id} parent={new_parent_id} index={new_index}"
        );
        Ok(())
    }

    /// Moves a board to `new_index` in the top-level order.
    pub fn move_board(&mut self, board_id: BoardId, new_index: usize) -> StoreResult<()> {
        self.require(board_id, EntityKind::Board)?;
        let mut order = self.board_order.clone();
        order.retain(|id| *id != board_id);
        check_index(new_index, order.len() + 1)?;
        order.insert(new_index, board_id);
        self.board_order = order;
        Ok(())
    }

    /// Deletes an entity and all of its descendants.
    ///
    /// Repeating the call with the same identifier fails with `NotFound`.
    pub fn delete_entity(&mut self, id: EntityId) -> StoreResult<()> {
        let kind = self.kind_of(id).ok_or(StoreError::NotFound(id))?;
        match self.parent_of(id)? {
            Some(parent_id) => self.child_ids_mut(parent_id)?.retain(|child| *child != id),
            None => self.board_order.retain(|board| *board != id),
        }

        let subtree = self.collect_subtree(id);
        for (descendant_kind, descendant) in &subtree {
            match descendant_kind {
                EntityKind::Board => {
                    self.boards.remove(descendant);
                }
                EntityKind::Subject => {
                    self.subjects.remove(descendant);
                }
                EntityKind::Chapter => {
                    self.chapters.remove(descendant);
                }
                EntityKind::Note => {
                    self.notes.remove(descendant);
                }
            }
        }
        debug!(
            "event=entity_delete module=store status=ok kind={kind} id={id} removed={}",
            subtree.len()
        );
        Ok(())
    }

    /// Lists `root` and every live descendant, parents before children.
    fn collect_subtree(&self, root: EntityId) -> Vec<(EntityKind, EntityId)> {
        let mut result = Vec::new();
        let mut pending = vec![root];
        while let Some(current) = pending.pop() {
            let Some(kind) = self.kind_of(current) else {
                continue;
            };
            result.push((kind, current));
            if let Ok(children) = self.child_ids(current) {
                pending.extend(children.iter().rev().copied());
            }
        }
        result
    }

    fn set_parent(&mut self, id: EntityId, parent_id: EntityId) {
        if let Some(subject) = self.subjects.get_mut(&id) {
            subject.board_id = parent_id;
        } else if let Some(chapter) = self.chapters.get_mut(&id) {
            chapter.subject_id = parent_id;
        } else if let Some(note) = self.notes.get_mut(&id) {
            note.chapter_id = parent_id;
        }
    }
}
