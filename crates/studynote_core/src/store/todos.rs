//! Board to-do list edits.

use super::{normalize_name, DocumentStore, StoreError, StoreResult};
use crate::model::entity::{BoardId, TodoId, TodoItem};
use uuid::Uuid;

impl DocumentStore {
    /// To-do items of one board in display order.
    pub fn todos(&self, board_id: BoardId) -> StoreResult<&[TodoItem]> {
        Ok(self.board_ref(board_id)?.todos.as_slice())
    }

    /// Appends an unchecked to-do item to a board.
    pub fn add_todo(&mut self, board_id: BoardId, text: impl Into<String>) -> StoreResult<TodoId> {
        let text = normalize_name(text.into(), "todo text")?;
        let board = self.board_mut(board_id)?;
        let id = Uuid::new_v4();
        board.todos.push(TodoItem {
            id,
            text,
            done: false,
        });
        Ok(id)
    }

    /// Checks or unchecks one to-do item.
    pub fn set_todo_done(
        &mut self,
        board_id: BoardId,
        todo_id: TodoId,
        done: bool,
    ) -> StoreResult<()> {
        let board = self.board_mut(board_id)?;
        let item = board
            .todos
            .iter_mut()
            .find(|item| item.id == todo_id)
            .ok_or(StoreError::NotFound(todo_id))?;
        item.done = done;
        Ok(())
    }

    /// Removes one to-do item and returns it.
    pub fn remove_todo(&mut self, board_id: BoardId, todo_id: TodoId) -> StoreResult<TodoItem> {
        let board = self.board_mut(board_id)?;
        let position = board
            .todos
            .iter()
            .position(|item| item.id == todo_id)
            .ok_or(StoreError::NotFound(todo_id))?;
        Ok(board.todos.remove(position))
    }
}
