//! In-memory keyword search over note titles and block text.
//!
//! # Responsibility
//! - Match every query term case-insensitively against each live note.
//! - Return typed hits with stable IDs and a readable location path.
//!
//! # Invariants
//! - Hits follow hierarchy order: board, subject, chapter, then note order.
//! - Blank queries and `limit == 0` return no hits.

use crate::model::entity::{BoardId, Note, NoteId};
use crate::store::DocumentStore;

/// Default number of hits returned by [`SearchQuery::new`].
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
/// Upper bound applied to any requested limit.
pub const MAX_SEARCH_LIMIT: u32 = 100;
const SNIPPET_MAX_CHARS: usize = 80;

/// Search options for note keyword queries.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Whitespace-separated terms; all must match.
    pub text: String,
    /// Restricts hits to one board when set.
    pub board: Option<BoardId>,
    /// Maximum number of hits, clamped to [`MAX_SEARCH_LIMIT`].
    pub limit: u32,
}

impl SearchQuery {
    /// Creates a query over all boards with the default limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            board: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Single search hit returned by [`search_notes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub note_id: NoteId,
    pub title: String,
    /// Board, subject and chapter names leading to the note.
    pub path: Vec<String>,
    /// First title or block text containing a query term.
    pub snippet: String,
}

/// Searches live notes of `store`.
pub fn search_notes(store: &DocumentStore, query: &SearchQuery) -> Vec<SearchHit> {
    let terms: Vec<String> = query
        .text
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    let limit = query.limit.min(MAX_SEARCH_LIMIT) as usize;
    if terms.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for board in store.boards() {
        if query.board.is_some_and(|wanted| wanted != board.id) {
            continue;
        }
        for subject in board.subjects.iter().filter_map(|id| store.subject(*id)) {
            for chapter in subject.chapters.iter().filter_map(|id| store.chapter(*id)) {
                for note in chapter.notes.iter().filter_map(|id| store.note(*id)) {
                    let Some(snippet) = match_note(note, &terms) else {
                        continue;
                    };
                    hits.push(SearchHit {
                        note_id: note.id,
                        title: note.title.clone(),
                        path: vec![
                            board.name.clone(),
                            subject.name.clone(),
                            chapter.name.clone(),
                        ],
                        snippet,
                    });
                    if hits.len() == limit {
                        return hits;
                    }
                }
            }
        }
    }
    hits
}

/// Returns a snippet when every term occurs somewhere in the note.
fn match_note(note: &Note, terms: &[String]) -> Option<String> {
    let segments: Vec<String> = std::iter::once(note.title.clone())
        .chain(note.blocks.iter().map(|block| block.plain_text()))
        .filter(|segment| !segment.is_empty())
        .collect();
    let lowered: Vec<String> = segments.iter().map(|segment| segment.to_lowercase()).collect();

    let all_terms_present = terms
        .iter()
        .all(|term| lowered.iter().any(|segment| segment.contains(term.as_str())));
    if !all_terms_present {
        return None;
    }

    let first = lowered
        .iter()
        .position(|segment| terms.iter().any(|term| segment.contains(term.as_str())))
        .unwrap_or(0);
    Some(truncate_chars(&segments[first], SNIPPET_MAX_CHARS))
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    if value.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("ĀĀĀ", 2), "ĀĀ...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
