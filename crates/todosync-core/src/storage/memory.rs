//! In-memory todo store
//!
//! Keeps lists in a `HashMap` behind a tokio mutex. Each call holds the
//! lock for its whole body, which gives the same all-or-nothing behavior
//! as a transaction. Useful as a test double and for embedders that do
//! not need durability.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{ContextId, TodoItem, TodoList};
use crate::storage::error::{StorageError, StorageResult};
use crate::store::{Removals, TodoStore};

#[derive(Default)]
struct MemoryInner {
    lists: HashMap<Uuid, TodoList>,
    by_context: HashMap<Option<ContextId>, Uuid>,
}

/// Non-durable `TodoStore`; clones share the same data
#[derive(Clone, Default)]
pub struct MemoryTodoStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lists across all contexts
    pub async fn list_count(&self) -> StorageResult<usize> {
        Ok(self.inner.lock().await.lists.len())
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn find_list_by_context(
        &self,
        context: Option<&ContextId>,
    ) -> StorageResult<Option<TodoList>> {
        let inner = self.inner.lock().await;
        let list = inner
            .by_context
            .get(&context.cloned())
            .and_then(|id| inner.lists.get(id))
            .cloned();
        Ok(list)
    }

    async fn create_list(&self, context: Option<&ContextId>) -> StorageResult<TodoList> {
        let mut inner = self.inner.lock().await;
        let key = context.cloned();

        if inner.by_context.contains_key(&key) {
            return Err(StorageError::DuplicateContext { context: key });
        }

        let list = TodoList::new(key.clone());
        inner.by_context.insert(key, list.id);
        inner.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn save_items(
        &self,
        list_id: Uuid,
        upserts: &[TodoItem],
        removals: &Removals,
    ) -> StorageResult<TodoList> {
        let mut inner = self.inner.lock().await;
        let list = inner
            .lists
            .get_mut(&list_id)
            .ok_or(StorageError::ListNotFound(list_id))?;

        match removals {
            Removals::None => {}
            Removals::All => list.items.clear(),
            Removals::Ids(ids) => list.items.retain(|item| !ids.contains(&item.id)),
        }

        for incoming in upserts {
            match list.items.iter_mut().find(|item| item.id == incoming.id) {
                Some(existing) => existing.apply_from(incoming),
                None => {
                    let mut item = incoming.clone();
                    item.list_id = Some(list_id);
                    list.items.push(item);
                }
            }
        }

        Ok(list.clone())
    }

    async fn delete_list(&self, list_id: Uuid) -> StorageResult<bool> {
        let mut inner = self.inner.lock().await;
        match inner.lists.remove(&list_id) {
            Some(list) => {
                inner.by_context.remove(&list.context);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
