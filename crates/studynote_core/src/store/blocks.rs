//! Content block edits within one note.

use super::{check_index, normalize_name, DocumentStore, StoreResult};
use crate::markdown::parse_blocks;
use crate::model::block::ContentBlock;
use crate::model::entity::{now_epoch_ms, ChapterId, EntityKind, NoteId};

impl DocumentStore {
    /// Appends `block` and returns its index.
    pub fn append_block(&mut self, note_id: NoteId, block: ContentBlock) -> StoreResult<usize> {
        block.validate()?;
        let note = self.note_mut(note_id)?;
        note.blocks.push(block);
        note.updated_at = now_epoch_ms();
        Ok(note.blocks.len() - 1)
    }

    /// Inserts `block` before position `index`; `index == len` appends.
    pub fn insert_block(
        &mut self,
        note_id: NoteId,
        index: usize,
        block: ContentBlock,
    ) -> StoreResult<()> {
        block.validate()?;
        let note = self.note_mut(note_id)?;
        check_index(index, note.blocks.len() + 1)?;
        note.blocks.insert(index, block);
        note.updated_at = now_epoch_ms();
        Ok(())
    }

    /// Replaces the block at `index` and returns the previous one.
    pub fn replace_block(
        &mut self,
        note_id: NoteId,
        index: usize,
        block: ContentBlock,
    ) -> StoreResult<ContentBlock> {
        block.validate()?;
        let note = self.note_mut(note_id)?;
        check_index(index, note.blocks.len())?;
        let previous = std::mem::replace(&mut note.blocks[index], block);
        note.updated_at = now_epoch_ms();
        Ok(previous)
    }

    /// Removes and returns the block at `index`.
    pub fn remove_block(&mut self, note_id: NoteId, index: usize) -> StoreResult<ContentBlock> {
        let note = self.note_mut(note_id)?;
        check_index(index, note.blocks.len())?;
        let removed = note.blocks.remove(index);
        note.updated_at = now_epoch_ms();
        Ok(removed)
    }

    /// Moves the block at `from` so it ends up at position `to`.
    pub fn move_block(&mut self, note_id: NoteId, from: usize, to: usize) -> StoreResult<()> {
        let note = self.note_mut(note_id)?;
        let len = note.blocks.len();
        check_index(from, len)?;
        check_index(to, len)?;
        let block = note.blocks.remove(from);
        note.blocks.insert(to, block);
        note.updated_at = now_epoch_ms();
        Ok(())
    }

    /// Creates a note under `chapter_id` whose blocks are parsed from markdown.
    ///
    /// The note is only created when the chapter exists and every parsed
    /// block is valid.
    pub fn import_markdown_note(
        &mut self,
        chapter_id: ChapterId,
        title: impl Into<String>,
        markdown: &str,
    ) -> StoreResult<NoteId> {
        let title = normalize_name(title.into(), "note title")?;
        self.require(chapter_id, EntityKind::Chapter)?;
        let blocks = parse_blocks(markdown);
        for block in &blocks {
            block.validate()?;
        }

        let note_id = self.create_note(chapter_id, title)?;
        let note = self.note_mut(note_id)?;
        note.blocks = blocks;
        Ok(note_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::block::ContentBlock;
    use crate::store::{DocumentStore, StoreError};

    fn store_with_note() -> (DocumentStore, uuid::Uuid) {
        let mut store = DocumentStore::new();
        let board = store.create_board("B").unwrap();
        let subject = store.create_subject(board, "S").unwrap();
        let chapter = store.create_chapter(subject, "C").unwrap();
        let note = store.create_note(chapter, "N").unwrap();
        (store, note)
    }

    #[test]
    fn move_block_reorders_in_place() {
        let (mut store, note) = store_with_note();
        for text in ["a", "b", "c"] {
            store
                .append_block(note, ContentBlock::paragraph(text))
                .unwrap();
        }

        store.move_block(note, 0, 2).unwrap();

        let texts: Vec<String> = store
            .blocks(note)
            .unwrap()
            .iter()
            .map(ContentBlock::plain_text)
            .collect();
        assert_eq!(texts, vec!["b", "c", "a"]);
    }

    #[test]
    fn invalid_block_leaves_note_untouched() {
        let (mut store, note) = store_with_note();
        let before = store.clone();

        let err = store
            .append_block(note, ContentBlock::heading(9, "deep"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store, before);
    }

    #[test]
    fn insert_block_accepts_end_position_only_up_to_len() {
        let (mut store, note) = store_with_note();
        store
            .insert_block(note, 0, ContentBlock::paragraph("first"))
            .unwrap();
        store
            .insert_block(note, 1, ContentBlock::paragraph("second"))
            .unwrap();

        let err = store
            .insert_block(note, 3, ContentBlock::paragraph("third"))
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidIndex { index: 3, bound: 3 });
    }
}
