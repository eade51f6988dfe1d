//! Document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist a whole `DocumentStore` and load it back.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - `save_document` replaces the persisted document in one transaction;
//!   on any error the previous document stays intact.
//! - `load_document` goes through snapshot validation, so structurally
//!   broken rows surface as `StoreError::CorruptData`.
//! - Child order on load is `sort_order ASC, uuid ASC` per parent.

use crate::codec::{DocumentSnapshot, EntityRecord, FORMAT_VERSION};
use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::block::ContentBlock;
use crate::model::entity::{now_epoch_ms, EntityId, EntityKind, TodoItem};
use crate::store::{DocumentStore, StoreError};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const SAVED_AT_KEY: &str = "saved_at";
const FORMAT_VERSION_KEY: &str = "format_version";

/// Result type used by document repository operations.
pub type DocumentRepoResult<T> = Result<T, DocumentRepoError>;

/// Errors from document repository operations.
#[derive(Debug)]
pub enum DocumentRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Document-level failure, including corrupt persisted data.
    Store(StoreError),
    /// Backing file could not be read or written.
    Io(std::io::Error),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for DocumentRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "document file error: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document repository requires table `{table}`")
            }
        }
    }
}

impl Error for DocumentRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for DocumentRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DocumentRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<StoreError> for DocumentRepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for DocumentRepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Repository interface for whole-document persistence.
pub trait DocumentRepository {
    /// Replaces the persisted document with `store`.
    fn save_document(&self, store: &DocumentStore) -> DocumentRepoResult<()>;
    /// Loads the persisted document; an untouched backend yields an empty one.
    fn load_document(&self) -> DocumentRepoResult<DocumentStore>;
    /// Epoch ms of the last successful save, if any.
    fn last_saved_at(&self) -> DocumentRepoResult<Option<i64>>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> DocumentRepoResult<Self> {
        ensure_document_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn save_document(&self, store: &DocumentStore) -> DocumentRepoResult<()> {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute_batch(
            "DELETE FROM board_todos;
             DELETE FROM notes;
             DELETE FROM chapters;
             DELETE FROM subjects;
             DELETE FROM boards;",
        )?;

        for (board_order, board) in store.boards().enumerate() {
            tx.execute(
                "INSERT INTO boards (board_uuid, display_name, sort_order, created_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    board.id.to_string(),
                    board.name,
                    board_order as i64,
                    board.created_at
                ],
            )?;
            for (todo_order, todo) in board.todos.iter().enumerate() {
                tx.execute(
                    "INSERT INTO board_todos (todo_uuid, board_uuid, todo_text, is_done, sort_order)
                     VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        todo.id.to_string(),
                        board.id.to_string(),
                        todo.text,
                        todo.done as i64,
                        todo_order as i64
                    ],
                )?;
            }

            for (subject_order, subject) in store.subjects_of(board.id)?.into_iter().enumerate() {
                tx.execute(
                    "INSERT INTO subjects (subject_uuid, board_uuid, display_name, sort_order)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![
                        subject.id.to_string(),
                        board.id.to_string(),
                        subject.name,
                        subject_order as i64
                    ],
                )?;

                for (chapter_order, chapter) in
                    store.chapters_of(subject.id)?.into_iter().enumerate()
                {
                    tx.execute(
                        "INSERT INTO chapters (chapter_uuid, subject_uuid, display_name, sort_order)
                         VALUES (?1, ?2, ?3, ?4);",
                        params![
                            chapter.id.to_string(),
                            subject.id.to_string(),
                            chapter.name,
                            chapter_order as i64
                        ],
                    )?;

                    for (note_order, note) in store.notes_of(chapter.id)?.into_iter().enumerate() {
                        let blocks_json = serde_json::to_string(&note.blocks).map_err(|err| {
                            StoreError::CorruptData(format!(
                                "note {} blocks cannot be encoded: {err}",
                                note.id
                            ))
                        })?;
                        tx.execute(
                            "INSERT INTO notes (note_uuid, chapter_uuid, title, sort_order, blocks_json, updated_at)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                            params![
                                note.id.to_string(),
                                chapter.id.to_string(),
                                note.title,
                                note_order as i64,
                                blocks_json,
                                note.updated_at
                            ],
                        )?;
                    }
                }
            }
        }

        for (key, value) in [
            (SAVED_AT_KEY, now_epoch_ms().to_string()),
            (FORMAT_VERSION_KEY, FORMAT_VERSION.to_string()),
        ] {
            tx.execute(
                "INSERT INTO document_meta (meta_key, meta_value) VALUES (?1, ?2)
                 ON CONFLICT(meta_key) DO UPDATE SET meta_value = excluded.meta_value;",
                params![key, value],
            )?;
        }

        tx.commit()?;
        info!(
            "event=document_save module=repo status=ok backend=sqlite entities={} duration_ms={}",
            store.entity_count(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn load_document(&self) -> DocumentRepoResult<DocumentStore> {
        let started_at = Instant::now();
        let mut records: Vec<EntityRecord> = Vec::new();
        let mut positions: HashMap<EntityId, usize> = HashMap::new();
        let mut board_order = Vec::new();

        let boards = collect_rows(
            self.conn,
            "SELECT board_uuid, display_name, created_at
             FROM boards
             ORDER BY sort_order ASC, board_uuid ASC;",
            |row| {
                let id = parse_uuid(&row.get::<_, String>(0)?, "boards.board_uuid")?;
                let mut record = entity_record(id, EntityKind::Board, None, row.get(1)?);
                record.timestamp = Some(row.get(2)?);
                Ok(record)
            },
        )?;
        for record in boards {
            board_order.push(record.id);
            push_record(&mut records, &mut positions, record);
        }

        let todos = collect_rows(
            self.conn,
            "SELECT todo_uuid, board_uuid, todo_text, is_done
             FROM board_todos
             ORDER BY board_uuid ASC, sort_order ASC, todo_uuid ASC;",
            |row| {
                let id = parse_uuid(&row.get::<_, String>(0)?, "board_todos.todo_uuid")?;
                let board_id = parse_uuid(&row.get::<_, String>(1)?, "board_todos.board_uuid")?;
                let done = match row.get::<_, i64>(3)? {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(corrupt(format!(
                            "invalid is_done value `{other}` in board_todos.is_done"
                        )))
                    }
                };
                let item = TodoItem {
                    id,
                    text: row.get(2)?,
                    done,
                };
                Ok((board_id, item))
            },
        )?;
        for (board_id, item) in todos {
            let position = positions.get(&board_id).copied().ok_or_else(|| {
                corrupt(format!("todo {} references missing board {board_id}", item.id))
            })?;
            records[position].todos.push(item);
        }

        let subjects = collect_rows(
            self.conn,
            "SELECT subject_uuid, board_uuid, display_name
             FROM subjects
             ORDER BY board_uuid ASC, sort_order ASC, subject_uuid ASC;",
            |row| {
                let id = parse_uuid(&row.get::<_, String>(0)?, "subjects.subject_uuid")?;
                let parent = parse_uuid(&row.get::<_, String>(1)?, "subjects.board_uuid")?;
                Ok(entity_record(
                    id,
                    EntityKind::Subject,
                    Some(parent),
                    row.get(2)?,
                ))
            },
        )?;
        let chapters = collect_rows(
            self.conn,
            "SELECT chapter_uuid, subject_uuid, display_name
             FROM chapters
             ORDER BY subject_uuid ASC, sort_order ASC, chapter_uuid ASC;",
            |row| {
                let id = parse_uuid(&row.get::<_, String>(0)?, "chapters.chapter_uuid")?;
                let parent = parse_uuid(&row.get::<_, String>(1)?, "chapters.subject_uuid")?;
                Ok(entity_record(
                    id,
                    EntityKind::Chapter,
                    Some(parent),
                    row.get(2)?,
                ))
            },
        )?;
        let notes = collect_rows(
            self.conn,
            "SELECT note_uuid, chapter_uuid, title, blocks_json, updated_at
             FROM notes
             ORDER BY chapter_uuid ASC, sort_order ASC, note_uuid ASC;",
            |row| {
                let id = parse_uuid(&row.get::<_, String>(0)?, "notes.note_uuid")?;
                let parent = parse_uuid(&row.get::<_, String>(1)?, "notes.chapter_uuid")?;
                let blocks_json: String = row.get(3)?;
                let blocks: Vec<ContentBlock> =
                    serde_json::from_str(&blocks_json).map_err(|err| {
                        corrupt(format!("invalid blocks_json for note {id}: {err}"))
                    })?;
                let mut record = entity_record(id, EntityKind::Note, Some(parent), row.get(2)?);
                record.blocks = blocks;
                record.timestamp = Some(row.get(4)?);
                Ok(record)
            },
        )?;

        for record in subjects.into_iter().chain(chapters).chain(notes) {
            if let Some(position) = record.parent.and_then(|parent| positions.get(&parent)) {
                records[*position].children.push(record.id);
            }
            push_record(&mut records, &mut positions, record);
        }

        let store = DocumentSnapshot {
            format_version: FORMAT_VERSION,
            boards: board_order,
            entities: records,
        }
        .into_store()?;
        info!(
            "event=document_load module=repo status=ok backend=sqlite entities={} duration_ms={}",
            store.entity_count(),
            started_at.elapsed().as_millis()
        );
        Ok(store)
    }

    fn last_saved_at(&self) -> DocumentRepoResult<Option<i64>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT meta_value FROM document_meta WHERE meta_key = ?1;",
                [SAVED_AT_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|text| {
                text.parse::<i64>()
                    .map_err(|_| corrupt(format!("invalid saved_at value `{text}`")))
            })
            .transpose()
    }
}

fn entity_record(
    id: EntityId,
    kind: EntityKind,
    parent: Option<EntityId>,
    name: String,
) -> EntityRecord {
    EntityRecord {
        id,
        kind,
        parent,
        name,
        children: Vec::new(),
        timestamp: None,
        blocks: Vec::new(),
        todos: Vec::new(),
    }
}

fn push_record(
    records: &mut Vec<EntityRecord>,
    positions: &mut HashMap<EntityId, usize>,
    record: EntityRecord,
) {
    // Duplicates keep both records so snapshot validation reports them.
    positions.entry(record.id).or_insert(records.len());
    records.push(record);
}

fn collect_rows<T>(
    conn: &Connection,
    sql: &str,
    mut map_row: impl FnMut(&Row<'_>) -> DocumentRepoResult<T>,
) -> DocumentRepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(map_row(row)?);
    }
    Ok(items)
}

fn corrupt(message: String) -> DocumentRepoError {
    DocumentRepoError::Store(StoreError::CorruptData(message))
}

fn parse_uuid(value: &str, column: &'static str) -> DocumentRepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| corrupt(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_document_connection_ready(conn: &Connection) -> DocumentRepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(DocumentRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in [
        "boards",
        "subjects",
        "chapters",
        "notes",
        "board_todos",
        "document_meta",
    ] {
        if !table_exists(conn, table)? {
            return Err(DocumentRepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DocumentRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
