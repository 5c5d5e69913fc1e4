//! Store collaborator interface
//!
//! `TodoStore` is the narrow, transactional repository the sync service
//! talks to. Implementations live in `storage`:
//! - `SqliteTodoStore`: durable, one transaction per call
//! - `MemoryTodoStore`: in-process, for tests and embedding
//!
//! ## Contract
//!
//! - `create_list` must reject a second list for the same context
//!   (including the default `None` context) with
//!   `StorageError::DuplicateContext`.
//! - `save_items` applies all upserts and removals atomically and returns
//!   the list as committed. Removals are evaluated inside that same
//!   transaction, so `Removals::All` empties whatever the list holds at
//!   commit time. Upserts overwrite content, status and priority of an
//!   existing item and keep its position; unknown items are appended.
//! - Deleting a list removes its items.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ContextId, TodoItem, TodoList};
use crate::storage::StorageResult;

/// Items a save detaches from its list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Removals {
    #[default]
    None,
    /// Every item on the list when the save commits
    All,
    /// Only these ids; unknown ids are ignored
    Ids(Vec<String>),
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Look up the list for a context. No side effects.
    async fn find_list_by_context(
        &self,
        context: Option<&ContextId>,
    ) -> StorageResult<Option<TodoList>>;

    /// Persist a new, empty list for a context.
    async fn create_list(&self, context: Option<&ContextId>) -> StorageResult<TodoList>;

    /// Atomically upsert and remove items of one list, returning the result.
    async fn save_items(
        &self,
        list_id: Uuid,
        upserts: &[TodoItem],
        removals: &Removals,
    ) -> StorageResult<TodoList>;

    /// Delete a list and, by cascade, its items.
    ///
    /// Returns `false` when no such list existed.
    async fn delete_list(&self, list_id: Uuid) -> StorageResult<bool>;
}
