use rusqlite::Connection;
use studynote_core::{
    open_db, open_db_in_memory, ContentBlock, DocumentRepoError, DocumentRepository,
    DocumentStore, EntityId, JsonFileDocumentRepository, SqliteDocumentRepository, StoreError,
};

fn sample_store() -> (DocumentStore, EntityId) {
    let mut store = DocumentStore::new();
    let physics = store.create_board("Physics").unwrap();
    let mechanics = store.create_subject(physics, "Mechanics").unwrap();
    let kinematics = store.create_chapter(mechanics, "Kinematics").unwrap();
    let dynamics = store.create_chapter(mechanics, "Dynamics").unwrap();
    let note = store.create_note(kinematics, "Free Fall").unwrap();
    store
        .append_block(note, ContentBlock::heading(1, "Free Fall Equations"))
        .unwrap();
    store
        .append_block(note, ContentBlock::math("v^2 = u^2 + 2as"))
        .unwrap();
    store.create_note(dynamics, "Newton's Laws").unwrap();
    store.create_note(kinematics, "Projectiles").unwrap();
    let todo = store.add_todo(physics, "Revise formulas").unwrap();
    store.set_todo_done(physics, todo, true).unwrap();
    store.add_todo(physics, "Past paper").unwrap();

    let chemistry = store.create_board("Chemistry").unwrap();
    store.create_subject(chemistry, "Organic").unwrap();
    (store, note)
}

#[test]
fn sqlite_round_trip_preserves_document() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    let (store, _) = sample_store();

    repo.save_document(&store).unwrap();
    let loaded = repo.load_document().unwrap();

    assert_eq!(loaded, store);
}

#[test]
fn sqlite_round_trip_preserves_reordered_children() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    let (mut store, note) = sample_store();
    let chapter = store.parent_of(note).unwrap().unwrap();
    let last = store.notes_of(chapter).unwrap().len() - 1;
    store.move_entity(note, chapter, last).unwrap();
    let biology = store.create_board("Biology").unwrap();
    store.move_board(biology, 0).unwrap();

    repo.save_document(&store).unwrap();
    let loaded = repo.load_document().unwrap();

    assert_eq!(loaded, store);
    assert_eq!(loaded.boards().next().unwrap().id, biology);
}

#[test]
fn second_save_replaces_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studynote.sqlite3");
    let (mut store, note) = sample_store();

    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
        repo.save_document(&store).unwrap();
        store.delete_entity(note).unwrap();
        repo.save_document(&store).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    let loaded = repo.load_document().unwrap();
    assert_eq!(loaded, store);
    assert!(loaded.note(note).is_none());
}

#[test]
fn fresh_database_loads_empty_document() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    assert!(repo.load_document().unwrap().is_empty());
    assert_eq!(repo.last_saved_at().unwrap(), None);

    repo.save_document(&DocumentStore::new()).unwrap();
    assert!(repo.last_saved_at().unwrap().is_some());
}

#[test]
fn corrupt_blocks_json_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    let (store, note) = sample_store();
    repo.save_document(&store).unwrap();

    conn.execute(
        "UPDATE notes SET blocks_json = '[{\"type\":\"hologram\"}]' WHERE note_uuid = ?1;",
        [note.to_string()],
    )
    .unwrap();

    let err = repo.load_document().unwrap_err();
    assert!(matches!(
        err,
        DocumentRepoError::Store(StoreError::CorruptData(_))
    ));
}

#[test]
fn orphan_rows_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO subjects (subject_uuid, board_uuid, display_name, sort_order)
         VALUES ('6f1c1f4e-8d3f-4a51-9c53-0c7f4a0f5b11',
                 '0b0a43a2-67c2-4b5e-9a0e-0f6a9f7f3e22', 'Orphan', 0);",
    )
    .unwrap();

    let err = repo.load_document().unwrap_err();
    assert!(matches!(
        err,
        DocumentRepoError::Store(StoreError::CorruptData(_))
    ));
}

#[test]
fn invalid_uuid_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO boards (board_uuid, display_name, sort_order, created_at)
         VALUES ('not-a-uuid', 'Physics', 0, 0);",
        [],
    )
    .unwrap();

    let err = repo.load_document().unwrap_err();
    assert!(matches!(
        err,
        DocumentRepoError::Store(StoreError::CorruptData(_))
    ));
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteDocumentRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        DocumentRepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn missing_table_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE board_todos;").unwrap();
    let err = SqliteDocumentRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        DocumentRepoError::MissingRequiredTable("board_todos")
    ));
}

#[test]
fn json_file_round_trip_preserves_document() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileDocumentRepository::new(dir.path().join("nested").join("document.json"));
    let (store, _) = sample_store();

    assert!(repo.load_document().unwrap().is_empty());
    assert_eq!(repo.last_saved_at().unwrap(), None);

    repo.save_document(&store).unwrap();
    assert_eq!(repo.load_document().unwrap(), store);
    assert!(repo.last_saved_at().unwrap().is_some());
}

#[test]
fn json_file_with_garbage_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("document.json");
    std::fs::write(&path, b"{ \"format_version\": 1, ").unwrap();
    let repo = JsonFileDocumentRepository::new(&path);

    let err = repo.load_document().unwrap_err();
    assert!(matches!(
        err,
        DocumentRepoError::Store(StoreError::CorruptData(_))
    ));
}
