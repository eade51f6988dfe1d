use std::sync::Arc;
use std::thread;
use studynote_core::{
    open_db_in_memory, ContentBlock, DocumentRepository, DocumentService, DocumentServiceError,
    DocumentStore, JsonFileDocumentRepository, NoteId, SearchQuery, SqliteDocumentRepository,
    StoreError,
};

#[test]
fn failed_write_publishes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());
    let board = service
        .write("create_board", |store| store.create_board("Physics"))
        .unwrap();

    let err = service
        .write("seed", |store| {
            let subject = store.create_subject(board, "Mechanics")?;
            store.create_chapter(subject, "Kinematics")?;
            store.create_chapter(subject, "  ")
        })
        .unwrap_err();

    assert!(matches!(
        err,
        DocumentServiceError::Store(StoreError::Validation(_))
    ));
    let subjects = service
        .read(|store| store.subjects_of(board).map(|subjects| subjects.len()))
        .unwrap()
        .unwrap();
    assert_eq!(subjects, 0);
}

#[test]
fn commit_then_reload_restores_persisted_state() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());
    let board = service
        .write("create_board", |store| store.create_board("Physics"))
        .unwrap();
    service.commit().unwrap();

    service
        .write("rename", |store| store.rename_entity(board, "Scratch"))
        .unwrap();
    service.reload().unwrap();

    let name = service
        .read(|store| store.display_name(board).map(str::to_string))
        .unwrap()
        .unwrap();
    assert_eq!(name, "Physics");
    assert!(service.repository().last_saved_at().unwrap().is_some());
}

#[test]
fn open_loads_persisted_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("document.json");
    let mut store = DocumentStore::new();
    let board = store.create_board("Physics").unwrap();
    JsonFileDocumentRepository::new(&path)
        .save_document(&store)
        .unwrap();

    let service = DocumentService::open(JsonFileDocumentRepository::new(&path)).unwrap();

    assert_eq!(service.snapshot().unwrap(), store);
    assert!(service.read(|store| store.contains(board)).unwrap());
}

#[test]
fn open_reports_corrupt_file_as_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("document.json");
    std::fs::write(&path, b"garbage").unwrap();

    let err = DocumentService::open(JsonFileDocumentRepository::new(&path))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        DocumentServiceError::Store(StoreError::CorruptData(_))
    ));
}

#[test]
fn note_preview_and_search_read_live_document() {
    let service = DocumentService::new(JsonFileDocumentRepository::new("unused.json"));
    let note = service
        .write("seed", |store| {
            let board = store.create_board("Physics")?;
            let subject = store.create_subject(board, "Mechanics")?;
            let chapter = store.create_chapter(subject, "Kinematics")?;
            let note = store.create_note(chapter, "Free Fall")?;
            store.append_block(note, ContentBlock::paragraph("Objects accelerate at g."))?;
            store.append_block(note, ContentBlock::image("graphs/fall.png"))?;
            Ok(note)
        })
        .unwrap();

    let preview = service.note_preview(note).unwrap();
    assert_eq!(
        preview.preview_text.as_deref(),
        Some("Objects accelerate at g.")
    );
    assert_eq!(preview.preview_image.as_deref(), Some("graphs/fall.png"));

    let hits = service.search(&SearchQuery::new("ACCELERATE")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].note_id, note);
    assert_eq!(hits[0].path, vec!["Physics", "Mechanics", "Kinematics"]);

    let missing = NoteId::new_v4();
    assert!(matches!(
        service.note_preview(missing).unwrap_err(),
        DocumentServiceError::Store(StoreError::NotFound(_))
    ));
}

#[test]
fn concurrent_readers_see_whole_writes() {
    let service = Arc::new(DocumentService::new(JsonFileDocumentRepository::new(
        "unused.json",
    )));
    let board = service
        .write("create_board", |store| store.create_board("Physics"))
        .unwrap();

    let writer = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            for index in 0..50 {
                service
                    .write("pair", |store| {
                        store.create_subject(board, format!("Subject {index}a"))?;
                        store.create_subject(board, format!("Subject {index}b"))
                    })
                    .unwrap();
            }
        })
    };
    let reader = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            for _ in 0..50 {
                let count = service
                    .read(|store| store.subjects_of(board).map(|subjects| subjects.len()))
                    .unwrap()
                    .unwrap();
                assert_eq!(count % 2, 0);
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    let total = service
        .read(|store| store.subjects_of(board).map(|subjects| subjects.len()))
        .unwrap()
        .unwrap();
    assert_eq!(total, 100);
}
