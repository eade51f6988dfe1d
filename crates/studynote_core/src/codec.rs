//! Persisted document layout and structural validation.
//!
//! # Responsibility
//! - Capture a `DocumentStore` as a flat, kind-tagged entity list.
//! - Rebuild a store from that list, rejecting any structural violation.
//!
//! # Invariants
//! - Encoding lists boards in order, then every entity depth-first in
//!   sibling order, so equal documents encode to equal bytes.
//! - Decoding is all-or-nothing: any violation yields
//!   `StoreError::CorruptData` and no partial store.

use crate::model::block::ContentBlock;
use crate::model::entity::{
    Board, BoardId, Chapter, EntityId, EntityKind, Note, Subject, TodoId, TodoItem,
};
use crate::store::{DocumentStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Snapshot layout version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Whole-document snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub format_version: u32,
    /// Top-level board order.
    pub boards: Vec<BoardId>,
    pub entities: Vec<EntityRecord>,
}

/// One persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Absent only for boards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    /// Display name, or title for notes.
    pub name: String,
    /// Ordered child identifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityId>,
    /// Board creation time or note modification time, epoch ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub todos: Vec<TodoItem>,
}

impl EntityRecord {
    fn new(id: EntityId, kind: EntityKind, parent: Option<EntityId>, name: &str) -> Self {
        Self {
            id,
            kind,
            parent,
            name: name.to_string(),
            children: Vec::new(),
            timestamp: None,
            blocks: Vec::new(),
            todos: Vec::new(),
        }
    }
}

impl DocumentSnapshot {
    /// Captures the full hierarchy of `store`.
    pub fn capture(store: &DocumentStore) -> Self {
        let mut entities = Vec::with_capacity(store.entity_count());
        for board in store.boards() {
            let mut record = EntityRecord::new(board.id, EntityKind::Board, None, &board.name);
            record.children = board.subjects.clone();
            record.timestamp = Some(board.created_at);
            record.todos = board.todos.clone();
            entities.push(record);

            for subject in board.subjects.iter().filter_map(|id| store.subject(*id)) {
                let mut record = EntityRecord::new(
                    subject.id,
                    EntityKind::Subject,
                    Some(board.id),
                    &subject.name,
                );
                record.children = subject.chapters.clone();
                entities.push(record);

                for chapter in subject.chapters.iter().filter_map(|id| store.chapter(*id)) {
                    let mut record = EntityRecord::new(
                        chapter.id,
                        EntityKind::Chapter,
                        Some(subject.id),
                        &chapter.name,
                    );
                    record.children = chapter.notes.clone();
                    entities.push(record);

                    for note in chapter.notes.iter().filter_map(|id| store.note(*id)) {
                        let mut record = EntityRecord::new(
                            note.id,
                            EntityKind::Note,
                            Some(chapter.id),
                            &note.title,
                        );
                        record.timestamp = Some(note.updated_at);
                        record.blocks = note.blocks.clone();
                        entities.push(record);
                    }
                }
            }
        }

        Self {
            format_version: FORMAT_VERSION,
            boards: store.boards().map(|board| board.id).collect(),
            entities,
        }
    }

    /// Validates this snapshot and converts it into a live store.
    pub fn into_store(self) -> StoreResult<DocumentStore> {
        if self.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }

        let mut kinds = HashMap::with_capacity(self.entities.len());
        for record in &self.entities {
            if kinds.insert(record.id, (record.kind, record.parent)).is_some() {
                return Err(corrupt(format!("duplicate identifier {}", record.id)));
            }
        }

        let mut listed = HashSet::with_capacity(self.entities.len());
        let mut todo_ids = HashSet::new();
        for record in &self.entities {
            validate_record(record, &kinds, &mut todo_ids)?;
            for child in &record.children {
                if !listed.insert(*child) {
                    return Err(corrupt(format!("entity {child} is listed twice")));
                }
            }
        }

        let mut listed_boards = HashSet::with_capacity(self.boards.len());
        for board_id in &self.boards {
            if !matches!(kinds.get(board_id), Some((EntityKind::Board, _))) {
                return Err(corrupt(format!(
                    "board order references non-board {board_id}"
                )));
            }
            if !listed_boards.insert(*board_id) {
                return Err(corrupt(format!("board {board_id} is ordered twice")));
            }
        }

        let mut store = DocumentStore::new();
        store.board_order = self.boards;
        for record in self.entities {
            match record.kind {
                EntityKind::Board => {
                    if !listed_boards.contains(&record.id) {
                        return Err(corrupt(format!(
                            "board {} is missing from board order",
                            record.id
                        )));
                    }
                    store.boards.insert(
                        record.id,
                        Board {
                            id: record.id,
                            name: record.name,
                            created_at: record.timestamp.unwrap_or_default(),
                            subjects: record.children,
                            todos: record.todos,
                        },
                    );
                }
                kind => {
                    if !listed.contains(&record.id) {
                        return Err(corrupt(format!(
                            "{kind} {} is not listed by its parent",
                            record.id
                        )));
                    }
                    let parent = record
                        .parent
                        .ok_or_else(|| corrupt(format!("{kind} {} has no parent", record.id)))?;
                    match kind {
                        EntityKind::Subject => {
                            store.subjects.insert(
                                record.id,
                                Subject {
                                    id: record.id,
                                    name: record.name,
                                    board_id: parent,
                                    chapters: record.children,
                                },
                            );
                        }
                        EntityKind::Chapter => {
                            store.chapters.insert(
                                record.id,
                                Chapter {
                                    id: record.id,
                                    name: record.name,
                                    subject_id: parent,
                                    notes: record.children,
                                },
                            );
                        }
                        _ => {
                            store.notes.insert(
                                record.id,
                                Note {
                                    id: record.id,
                                    title: record.name,
                                    chapter_id: parent,
                                    blocks: record.blocks,
                                    updated_at: record.timestamp.unwrap_or_default(),
                                },
                            );
                        }
                    }
                }
            }
        }
        Ok(store)
    }
}

/// Encodes a store as JSON snapshot bytes.
pub fn encode(store: &DocumentStore) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(&DocumentSnapshot::capture(store))
        .map_err(|err| corrupt(format!("snapshot encoding failed: {err}")))
}

/// Decodes JSON snapshot bytes into a validated store.
pub fn decode(bytes: &[u8]) -> StoreResult<DocumentStore> {
    let snapshot: DocumentSnapshot = serde_json::from_slice(bytes)
        .map_err(|err| corrupt(format!("malformed snapshot: {err}")))?;
    snapshot.into_store()
}

/// Kind and parent reference of every record, keyed by identifier.
type RecordIndex = HashMap<EntityId, (EntityKind, Option<EntityId>)>;

/// `todo_ids` is shared across records: to-do ids are unique document-wide.
fn validate_record(
    record: &EntityRecord,
    kinds: &RecordIndex,
    todo_ids: &mut HashSet<TodoId>,
) -> StoreResult<()> {
    let id = record.id;
    let kind = record.kind;
    if record.name.trim().is_empty() {
        return Err(corrupt(format!("{kind} {id} has a blank name")));
    }

    match (kind.parent_kind(), record.parent) {
        (None, None) => {}
        (None, Some(_)) => return Err(corrupt(format!("board {id} must not have a parent"))),
        (Some(_), None) => return Err(corrupt(format!("{kind} {id} has no parent"))),
        (Some(expected), Some(parent)) => match kinds.get(&parent) {
            None => {
                return Err(corrupt(format!(
                    "{kind} {id} references missing parent {parent}"
                )))
            }
            Some((actual, _)) if *actual != expected => {
                return Err(corrupt(format!(
                    "{kind} {id} has a {actual} parent, expected {expected}"
                )))
            }
            Some(_) => {}
        },
    }

    match kind.child_kind() {
        None if !record.children.is_empty() => {
            return Err(corrupt(format!("note {id} must not have children")));
        }
        None => {}
        Some(expected) => {
            for child in &record.children {
                match kinds.get(child) {
                    Some((child_kind, _)) if *child_kind != expected => {
                        return Err(corrupt(format!(
                            "{kind} {id} lists {child}, which is a {child_kind}"
                        )));
                    }
                    Some((_, child_parent)) if *child_parent != Some(id) => {
                        return Err(corrupt(format!(
                            "{kind} {id} lists {child}, whose parent is elsewhere"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        return Err(corrupt(format!(
                            "{kind} {id} lists missing child {child}"
                        )));
                    }
                }
            }
        }
    }

    if kind != EntityKind::Note && !record.blocks.is_empty() {
        return Err(corrupt(format!("{kind} {id} must not carry blocks")));
    }
    for (index, block) in record.blocks.iter().enumerate() {
        block
            .validate()
            .map_err(|err| corrupt(format!("note {id} block {index}: {err}")))?;
    }

    if kind != EntityKind::Board && !record.todos.is_empty() {
        return Err(corrupt(format!("{kind} {id} must not carry todos")));
    }
    for todo in &record.todos {
        if !todo_ids.insert(todo.id) {
            return Err(corrupt(format!(
                "board {id} repeats todo {}, already used in this document",
                todo.id
            )));
        }
        if todo.text.trim().is_empty() {
            return Err(corrupt(format!("board {id} has a blank todo {}", todo.id)));
        }
    }
    Ok(())
}

fn corrupt(message: String) -> StoreError {
    StoreError::CorruptData(message)
}
