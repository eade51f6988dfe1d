use studynote_core::search::note_search::MAX_SEARCH_LIMIT;
use studynote_core::{search_notes, BoardId, ContentBlock, DocumentStore, NoteId, SearchQuery};

struct Library {
    store: DocumentStore,
    physics: BoardId,
    chemistry: BoardId,
    free_fall: NoteId,
    projectiles: NoteId,
    rates: NoteId,
}

fn library() -> Library {
    let mut store = DocumentStore::new();
    let physics = store.create_board("Physics").unwrap();
    let mechanics = store.create_subject(physics, "Mechanics").unwrap();
    let kinematics = store.create_chapter(mechanics, "Kinematics").unwrap();
    let free_fall = store.create_note(kinematics, "Free Fall").unwrap();
    store
        .append_block(
            free_fall,
            ContentBlock::paragraph("Objects accelerate under gravity."),
        )
        .unwrap();
    let projectiles = store.create_note(kinematics, "Projectiles").unwrap();
    store
        .append_block(
            projectiles,
            ContentBlock::paragraph("Horizontal velocity is constant; gravity acts vertically."),
        )
        .unwrap();

    let chemistry = store.create_board("Chemistry").unwrap();
    let physical = store.create_subject(chemistry, "Physical").unwrap();
    let kinetics = store.create_chapter(physical, "Kinetics").unwrap();
    let rates = store.create_note(kinetics, "Reaction Rates").unwrap();
    store
        .append_block(rates, ContentBlock::math("rate = k[A]^m"))
        .unwrap();

    Library {
        store,
        physics,
        chemistry,
        free_fall,
        projectiles,
        rates,
    }
}

fn ids(hits: &[studynote_core::SearchHit]) -> Vec<NoteId> {
    hits.iter().map(|hit| hit.note_id).collect()
}

#[test]
fn hits_follow_hierarchy_order() {
    let lib = library();
    let hits = search_notes(&lib.store, &SearchQuery::new("gravity"));
    assert_eq!(ids(&hits), vec![lib.free_fall, lib.projectiles]);
    assert_eq!(hits[0].snippet, "Objects accelerate under gravity.");
}

#[test]
fn every_term_must_match() {
    let lib = library();
    let hits = search_notes(&lib.store, &SearchQuery::new("gravity HORIZONTAL"));
    assert_eq!(ids(&hits), vec![lib.projectiles]);
}

#[test]
fn titles_and_math_are_searchable() {
    let lib = library();
    assert_eq!(
        ids(&search_notes(&lib.store, &SearchQuery::new("reaction"))),
        vec![lib.rates]
    );
    assert_eq!(
        ids(&search_notes(&lib.store, &SearchQuery::new("k[a]"))),
        vec![lib.rates]
    );
}

#[test]
fn board_filter_restricts_hits() {
    let lib = library();
    let query = SearchQuery {
        board: Some(lib.chemistry),
        ..SearchQuery::new("reaction")
    };
    assert_eq!(ids(&search_notes(&lib.store, &query)), vec![lib.rates]);

    let query = SearchQuery {
        board: Some(lib.physics),
        ..SearchQuery::new("reaction")
    };
    assert!(search_notes(&lib.store, &query).is_empty());
}

#[test]
fn limit_caps_hits_and_zero_or_blank_returns_nothing() {
    let lib = library();
    let query = SearchQuery {
        limit: 1,
        ..SearchQuery::new("gravity")
    };
    assert_eq!(ids(&search_notes(&lib.store, &query)), vec![lib.free_fall]);

    let query = SearchQuery {
        limit: 0,
        ..SearchQuery::new("gravity")
    };
    assert!(search_notes(&lib.store, &query).is_empty());
    assert!(search_notes(&lib.store, &SearchQuery::new("   ")).is_empty());
}

#[test]
fn oversized_limit_is_clamped() {
    let mut store = DocumentStore::new();
    let board = store.create_board("Bulk").unwrap();
    let subject = store.create_subject(board, "Many").unwrap();
    let chapter = store.create_chapter(subject, "Notes").unwrap();
    for index in 0..(MAX_SEARCH_LIMIT + 5) {
        store
            .create_note(chapter, format!("Entry {index}"))
            .unwrap();
    }

    let query = SearchQuery {
        limit: u32::MAX,
        ..SearchQuery::new("entry")
    };
    assert_eq!(
        search_notes(&store, &query).len(),
        MAX_SEARCH_LIMIT as usize
    );
}

#[test]
fn deleted_notes_disappear_from_results() {
    let mut lib = library();
    lib.store.delete_entity(lib.free_fall).unwrap();
    let hits = search_notes(&lib.store, &SearchQuery::new("gravity"));
    assert_eq!(ids(&hits), vec![lib.projectiles]);
}
