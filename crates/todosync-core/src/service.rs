//! Context-scoped todo synchronization
//!
//! `TodoSyncService` is the entry point for callers. It resolves the one
//! list belonging to a context (creating it on first access) and merges
//! incoming items into it.
//!
//! ## Usage
//!
//! ```ignore
//! let store = SqliteTodoStore::open(&config)?;
//! let service = TodoSyncService::new(Arc::new(store));
//!
//! let list = service.write(None, vec![TodoItem::new("t1", "buy milk")]).await?;
//! let same = service.read(None).await?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{TodoError, TodoResult};
use crate::models::{ContextId, TodoItem, TodoList};
use crate::store::{Removals, TodoStore};

/// Item changes computed for one write
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    /// Items to insert or overwrite, already attached to the list
    pub upserts: Vec<TodoItem>,
    /// Items to detach from the list
    pub removals: Removals,
}

/// Decide how `candidates` change `current`
///
/// An empty candidate set clears the list. The clear is not a list of ids
/// taken from `current`: the store empties whatever the list holds when
/// the write commits. Otherwise every candidate is an upsert and nothing
/// is removed.
pub fn reconcile(current: &TodoList, candidates: Vec<TodoItem>) -> Reconciliation {
    if candidates.is_empty() {
        return Reconciliation {
            upserts: Vec::new(),
            removals: Removals::All,
        };
    }

    let upserts = candidates
        .into_iter()
        .map(|mut item| {
            item.list_id = Some(current.id);
            item
        })
        .collect();

    Reconciliation {
        upserts,
        removals: Removals::None,
    }
}

/// Reject candidate sets with a blank id or a repeated id
pub fn validate_candidates(candidates: &[TodoItem]) -> TodoResult<()> {
    let mut seen = HashSet::with_capacity(candidates.len());

    for (index, item) in candidates.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(TodoError::InvalidInput(format!(
                "item {} has an empty id",
                index
            )));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(TodoError::InvalidInput(format!(
                "duplicate item id '{}' in one write",
                item.id
            )));
        }
    }

    Ok(())
}

/// Reads and writes todo lists keyed by context
#[derive(Clone)]
pub struct TodoSyncService {
    store: Arc<dyn TodoStore>,
}

impl TodoSyncService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    /// Return the list for `context`, creating an empty one on first access
    ///
    /// Repeated reads with no writes in between return the same list id
    /// and items. A concurrent first access that loses the creation race
    /// fails with `TodoError::ConstraintViolation`; retrying resolves the
    /// winner's list.
    pub async fn read(&self, context: Option<&ContextId>) -> TodoResult<TodoList> {
        self.resolve(context).await
    }

    /// Merge `items` into the list for `context` and return the result
    ///
    /// This is NOT a full replace:
    ///
    /// - An empty `items` removes every item from the list, including items
    ///   another writer committed after this call resolved the list. The
    ///   list itself stays.
    /// - A non-empty `items` updates items whose id already exists
    ///   (content, status, priority) and appends the rest. Items already in
    ///   the list but missing from `items` are left untouched.
    ///
    /// To replace the list wholesale, write an empty collection first and
    /// then the new items.
    ///
    /// The whole write commits or nothing does. A blank or repeated id in
    /// `items` fails with `TodoError::InvalidInput` before anything is
    /// read or created.
    pub async fn write(
        &self,
        context: Option<&ContextId>,
        items: Vec<TodoItem>,
    ) -> TodoResult<TodoList> {
        validate_candidates(&items)?;

        let list = self.resolve(context).await?;
        let plan = reconcile(&list, items);

        if plan.removals == Removals::All {
            info!(list_id = %list.id, "Clearing todo list");
        } else {
            debug!(list_id = %list.id, upserts = plan.upserts.len(), "Upserting items");
        }

        let saved = self
            .store
            .save_items(list.id, &plan.upserts, &plan.removals)
            .await?;
        Ok(saved)
    }

    async fn resolve(&self, context: Option<&ContextId>) -> TodoResult<TodoList> {
        let label = context.map(ContextId::as_str).unwrap_or("<default>");

        if let Some(list) = self.store.find_list_by_context(context).await? {
            debug!(context = label, list_id = %list.id, "Resolved todo list");
            return Ok(list);
        }

        match self.store.create_list(context).await {
            Ok(list) => {
                info!(context = label, list_id = %list.id, "Created list on first access");
                Ok(list)
            }
            Err(e) => {
                if e.is_constraint_violation() {
                    warn!(context = label, "Lost list creation race: {}", e);
                }
                Err(e.into())
            }
        }
    }
}
