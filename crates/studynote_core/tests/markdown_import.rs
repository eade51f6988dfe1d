use studynote_core::markdown::parse_blocks;
use studynote_core::{ChapterId, ContentBlock, DocumentStore, StoreError};

const CHAPTER_MD: &str = "# Kinematics

Motion described by **displacement** and *velocity*.
Uses `SI` units.

- distance
- speed
1. drop the ball
2. time the fall

$$ s = ut + \\frac{1}{2}at^2 $$
![free fall graph](graphs/free_fall.png)
";

#[test]
fn chapter_file_becomes_ordered_blocks() {
    let blocks = parse_blocks(CHAPTER_MD);

    let tags: Vec<&str> = blocks.iter().map(ContentBlock::tag).collect();
    assert_eq!(
        tags,
        vec![
            "heading",
            "paragraph",
            "bullet_list",
            "numbered_list",
            "inline_math",
            "image"
        ]
    );
    assert_eq!(blocks[0], ContentBlock::heading(1, "Kinematics"));
    assert_eq!(
        blocks[1].plain_text(),
        "Motion described by displacement and velocity. Uses SI units."
    );
    assert_eq!(
        blocks[2],
        ContentBlock::BulletList {
            items: vec!["distance".to_string(), "speed".to_string()]
        }
    );
    assert_eq!(
        blocks[3],
        ContentBlock::NumberedList {
            items: vec!["drop the ball".to_string(), "time the fall".to_string()]
        }
    );
    assert_eq!(blocks[4], ContentBlock::math("s = ut + \\frac{1}{2}at^2"));
    assert_eq!(blocks[5], ContentBlock::image("graphs/free_fall.png"));
    assert!(blocks.iter().all(|block| block.validate().is_ok()));
}

#[test]
fn import_creates_note_with_parsed_blocks() {
    let mut store = DocumentStore::new();
    let board = store.create_board("Physics").unwrap();
    let subject = store.create_subject(board, "Mechanics").unwrap();
    let chapter = store.create_chapter(subject, "Kinematics").unwrap();

    let note = store
        .import_markdown_note(chapter, "Kinematics notes", CHAPTER_MD)
        .unwrap();

    assert_eq!(store.blocks(note).unwrap(), parse_blocks(CHAPTER_MD).as_slice());
    assert_eq!(store.chapter(chapter).unwrap().notes, vec![note]);
}

#[test]
fn import_into_missing_chapter_changes_nothing() {
    let mut store = DocumentStore::new();
    let board = store.create_board("Physics").unwrap();
    let before = store.clone();

    let missing = ChapterId::new_v4();
    let err = store
        .import_markdown_note(missing, "Orphan", CHAPTER_MD)
        .unwrap_err();

    assert_eq!(err, StoreError::NotFound(missing));
    assert_eq!(store, before);
    assert!(store.subjects_of(board).unwrap().is_empty());
}

#[test]
fn empty_markdown_creates_empty_note() {
    let mut store = DocumentStore::new();
    let board = store.create_board("Physics").unwrap();
    let subject = store.create_subject(board, "Mechanics").unwrap();
    let chapter = store.create_chapter(subject, "Kinematics").unwrap();

    let note = store.import_markdown_note(chapter, "Blank", "\n\n").unwrap();
    assert!(store.blocks(note).unwrap().is_empty());
}

#[test]
fn line_with_two_formulas_stays_a_paragraph() {
    assert_eq!(
        parse_blocks("$a$ and $b$"),
        vec![ContentBlock::paragraph("$a$ and $b$")]
    );
    assert_eq!(
        parse_blocks("$$ E = mc^2 $$ or $$ F = ma $$"),
        vec![ContentBlock::paragraph("$$ E = mc^2 $$ or $$ F = ma $$")]
    );
    assert_eq!(parse_blocks("$v = at$"), vec![ContentBlock::math("v = at")]);
}
