//! Note preview projection.

use crate::model::block::ContentBlock;
use crate::model::entity::Note;
use once_cell::sync::Lazy;
use regex::Regex;

const PREVIEW_MAX_CHARS: usize = 80;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Block-derived summary shown in note lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePreview {
    /// Whitespace-collapsed leading text, capped at 80 chars.
    pub preview_text: Option<String>,
    /// Asset reference of the first image block.
    pub preview_image: Option<String>,
}

/// Derives the preview projection of one note.
pub fn derive_note_preview(note: &Note) -> NotePreview {
    let joined = note
        .blocks
        .iter()
        .map(ContentBlock::plain_text)
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = WHITESPACE_RE.replace_all(joined.trim(), " ");

    let preview_text = if collapsed.is_empty() {
        None
    } else {
        let mut text = collapsed.chars().take(PREVIEW_MAX_CHARS).collect::<String>();
        if collapsed.chars().count() > PREVIEW_MAX_CHARS {
            text.push_str("...");
        }
        Some(text)
    };

    let preview_image = note.blocks.iter().find_map(|block| match block {
        ContentBlock::Image { asset } => Some(asset.clone()),
        _ => None,
    });

    NotePreview {
        preview_text,
        preview_image,
    }
}

#[cfg(test)]
mod tests {
    use super::derive_note_preview;
    use crate::model::block::ContentBlock;
    use crate::model::entity::Note;
    use uuid::Uuid;

    fn note_with(blocks: Vec<ContentBlock>) -> Note {
        Note {
            id: Uuid::new_v4(),
            title: "Free Fall".to_string(),
            chapter_id: Uuid::new_v4(),
            blocks,
            updated_at: 0,
        }
    }

    #[test]
    fn preview_collapses_whitespace_and_picks_first_image() {
        let preview = derive_note_preview(&note_with(vec![
            ContentBlock::heading(1, "Free   Fall"),
            ContentBlock::image("graphs/first.png"),
            ContentBlock::paragraph("Under\nconstant acceleration"),
            ContentBlock::image("graphs/second.png"),
        ]));
        assert_eq!(
            preview.preview_text.as_deref(),
            Some("Free Fall Under constant acceleration")
        );
        assert_eq!(preview.preview_image.as_deref(), Some("graphs/first.png"));
    }

    #[test]
    fn empty_note_has_no_preview() {
        let preview = derive_note_preview(&note_with(Vec::new()));
        assert_eq!(preview.preview_text, None);
        assert_eq!(preview.preview_image, None);
    }

    #[test]
    fn long_text_is_truncated() {
        let preview = derive_note_preview(&note_with(vec![ContentBlock::paragraph(
            "x".repeat(200),
        )]));
        let text = preview.preview_text.unwrap();
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), 83);
    }
}
