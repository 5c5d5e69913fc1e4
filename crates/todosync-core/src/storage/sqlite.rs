//! SQLite-backed todo store
//!
//! Each trait call runs on the blocking pool, takes the connection lock,
//! opens one transaction, and releases both before returning. Nothing is
//! held across calls.
//!
//! ## Tables
//!
//! - `todo_lists` - one row per context (unique indexes enforce it)
//! - `todo_items` - items keyed by `(list_id, id)`, ordered by `position`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{ContextId, TodoItem, TodoList};
use crate::storage::error::{is_sqlite_constraint, StorageError, StorageResult};
use crate::storage::schema::{get_schema_version, init_schema, needs_init};
use crate::store::{Removals, TodoStore};

/// Durable `TodoStore` on a single SQLite connection
#[derive(Clone)]
pub struct SqliteTodoStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTodoStore {
    /// Open or create the database at `config.sqlite_path()`
    pub fn open(config: &Config) -> StorageResult<Self> {
        let path = config.sqlite_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(&path).map_err(|source| StorageError::Open {
            path: path.clone(),
            source,
        })?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        debug!("Opened todo database at {:?}", path);
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Schema version recorded in the database
    pub async fn schema_version(&self) -> StorageResult<Option<i32>> {
        self.run(|conn| Ok(get_schema_version(conn)?)).await
    }

    /// Number of lists across all contexts
    pub async fn list_count(&self) -> StorageResult<usize> {
        self.run(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM todo_lists", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    /// Run one operation against the connection on the blocking pool
    async fn run<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            op(&mut *guard)
        })
        .await?
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn find_list_by_context(
        &self,
        context: Option<&ContextId>,
    ) -> StorageResult<Option<TodoList>> {
        let context = context.cloned();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let list = find_list_row(&tx, context.as_ref())?
                .map(|row| hydrate_list(&tx, row))
                .transpose()?;
            tx.commit()?;
            Ok(list)
        })
        .await
    }

    async fn create_list(&self, context: Option<&ContextId>) -> StorageResult<TodoList> {
        let list = TodoList::new(context.cloned());
        self.run(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO todo_lists (id, name, context, created_at) VALUES (?, ?, ?, ?)",
                params![
                    list.id.to_string(),
                    list.name,
                    list.context.as_ref().map(ContextId::as_str),
                    list.created_at.timestamp_millis(),
                ],
            );

            match inserted {
                Ok(_) => {
                    info!(list_id = %list.id, "Created todo list");
                    Ok(list)
                }
                Err(e) if is_sqlite_constraint(&e) => Err(StorageError::DuplicateContext {
                    context: list.context,
                }),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn save_items(
        &self,
        list_id: Uuid,
        upserts: &[TodoItem],
        removals: &Removals,
    ) -> StorageResult<TodoList> {
        let upserts = upserts.to_vec();
        let removals = removals.clone();
        self.run(move |conn| {
            // Take the write lock up front so the snapshot we return is ours
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let list_key = list_id.to_string();

            let row = find_list_row_by_id(&tx, &list_key)?
                .ok_or(StorageError::ListNotFound(list_id))?;

            let mut removed = 0;
            match &removals {
                Removals::None => {}
                Removals::All => {
                    removed = tx.execute(
                        "DELETE FROM todo_items WHERE list_id = ?",
                        params![list_key],
                    )?;
                }
                Removals::Ids(ids) => {
                    for item_id in ids {
                        removed += tx.execute(
                            "DELETE FROM todo_items WHERE list_id = ? AND id = ?",
                            params![list_key, item_id],
                        )?;
                    }
                }
            }

            let mut position: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM todo_items WHERE list_id = ?",
                params![list_key],
                |row| row.get(0),
            )?;

            for item in &upserts {
                // Existing rows keep their position; only new rows use it
                tx.execute(
                    r#"
                    INSERT INTO todo_items (list_id, id, content, status, priority, position)
                    VALUES (?, ?, ?, ?, ?, ?)
                    ON CONFLICT (list_id, id) DO UPDATE SET
                        content = excluded.content,
                        status = excluded.status,
                        priority = excluded.priority
                    "#,
                    params![
                        list_key,
                        item.id,
                        item.content,
                        item.status.as_str(),
                        item.priority.as_str(),
                        position,
                    ],
                )?;
                position += 1;
            }

            let list = hydrate_list(&tx, row)?;
            tx.commit()?;

            debug!(
                list_id = %list_id,
                upserted = upserts.len(),
                removed,
                total = list.items.len(),
                "Saved todo items"
            );
            Ok(list)
        })
        .await
    }

    async fn delete_list(&self, list_id: Uuid) -> StorageResult<bool> {
        self.run(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM todo_lists WHERE id = ?",
                params![list_id.to_string()],
            )?;
            Ok(deleted > 0)
        })
        .await
    }
}

// ==================== Internal structs ====================

struct ListRow {
    id: String,
    name: String,
    context: Option<String>,
    created_at: i64,
}

impl ListRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            context: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

// ==================== Query helpers ====================

fn find_list_row(conn: &Connection, context: Option<&ContextId>) -> StorageResult<Option<ListRow>> {
    // `IS` matches NULL against NULL, so the default list needs no special case
    let row = conn
        .query_row(
            "SELECT id, name, context, created_at FROM todo_lists WHERE context IS ?",
            params![context.map(ContextId::as_str)],
            ListRow::from_row,
        )
        .optional()?;
    Ok(row)
}

fn find_list_row_by_id(conn: &Connection, id: &str) -> StorageResult<Option<ListRow>> {
    let row = conn
        .query_row(
            "SELECT id, name, context, created_at FROM todo_lists WHERE id = ?",
            params![id],
            ListRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Build a `TodoList` from its row plus its items
fn hydrate_list(conn: &Connection, row: ListRow) -> StorageResult<TodoList> {
    let id = Uuid::parse_str(&row.id).map_err(|e| StorageError::CorruptRow {
        table: "todo_lists",
        details: format!("invalid id '{}': {}", row.id, e),
    })?;

    let created_at: DateTime<Utc> =
        DateTime::from_timestamp_millis(row.created_at).ok_or_else(|| StorageError::CorruptRow {
            table: "todo_lists",
            details: format!("invalid created_at {}", row.created_at),
        })?;

    let items = get_items_for_list(conn, id)?;

    Ok(TodoList {
        id,
        name: row.name,
        context: row.context.map(ContextId),
        created_at,
        items,
    })
}

fn get_items_for_list(conn: &Connection, list_id: Uuid) -> StorageResult<Vec<TodoItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, content, status, priority FROM todo_items WHERE list_id = ? ORDER BY position",
    )?;

    let rows = stmt
        .query_map(params![list_id.to_string()], |row| {
            let id: String = row.get(0)?;
            let content: String = row.get(1)?;
            let status: String = row.get(2)?;
            let priority: String = row.get(3)?;
            Ok((id, content, status, priority))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, content, status, priority)| {
            let corrupt = |details: String| StorageError::CorruptRow {
                table: "todo_items",
                details,
            };
            Ok(TodoItem {
                status: status.parse().map_err(|e| corrupt(format!("{}", e)))?,
                priority: priority.parse().map_err(|e| corrupt(format!("{}", e)))?,
                id,
                content,
                list_id: Some(list_id),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TodoPriority, TodoStatus};
    use tempfile::TempDir;

    fn ctx(value: &str) -> ContextId {
        ContextId::new(value)
    }

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_find_missing_list() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        assert!(store.find_list_by_context(None).await.unwrap().is_none());
        assert!(store
            .find_list_by_context(Some(&ctx("chat")))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_and_find_list() {
        let store = SqliteTodoStore::open_in_memory().unwrap();

        let created = store.create_list(Some(&ctx("chat"))).await.unwrap();
        let found = store
            .find_list_by_context(Some(&ctx("chat")))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.context, Some(ctx("chat")));
        assert_eq!(
            found.created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
        assert!(found.items.is_empty());
    }

    #[tokio::test]
    async fn test_default_context_distinct_from_named() {
        let store = SqliteTodoStore::open_in_memory().unwrap();

        let default = store.create_list(None).await.unwrap();
        let named = store.create_list(Some(&ctx("chat"))).await.unwrap();
        assert_ne!(default.id, named.id);

        let found = store.find_list_by_context(None).await.unwrap().unwrap();
        assert_eq!(found.id, default.id);
        assert!(found.context.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = SqliteTodoStore::open_in_memory().unwrap();

        store.create_list(Some(&ctx("chat"))).await.unwrap();
        let err = store.create_list(Some(&ctx("chat"))).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateContext { .. }));

        store.create_list(None).await.unwrap();
        let err = store.create_list(None).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateContext { context: None }));

        assert_eq!(store.list_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_save_items_inserts_and_updates() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        let list = store.create_list(None).await.unwrap();

        let saved = store
            .save_items(
                list.id,
                &[TodoItem::new("a", "first"), TodoItem::new("b", "second")],
                &Removals::None,
            )
            .await
            .unwrap();
        assert_eq!(saved.items.len(), 2);
        assert!(saved.items.iter().all(|i| i.list_id == Some(list.id)));

        let updated = store
            .save_items(
                list.id,
                &[TodoItem::new("a", "first, edited")
                    .with_status(TodoStatus::Completed)
                    .with_priority(TodoPriority::Low)],
                &Removals::None,
            )
            .await
            .unwrap();

        assert_eq!(updated.items.len(), 2);
        let a = updated.item("a").unwrap();
        assert_eq!(a.content, "first, edited");
        assert_eq!(a.status, TodoStatus::Completed);
        assert_eq!(a.priority, TodoPriority::Low);
    }

    #[tokio::test]
    async fn test_update_keeps_insertion_order() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        let list = store.create_list(None).await.unwrap();

        store
            .save_items(
                list.id,
                &[
                    TodoItem::new("a", "1"),
                    TodoItem::new("b", "2"),
                    TodoItem::new("c", "3"),
                ],
                &Removals::None,
            )
            .await
            .unwrap();

        let saved = store
            .save_items(
                list.id,
                &[TodoItem::new("d", "4"), TodoItem::new("a", "1 again")],
                &Removals::None,
            )
            .await
            .unwrap();

        let ids: Vec<&str> = saved.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_save_items_removes() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        let list = store.create_list(None).await.unwrap();
        store
            .save_items(
                list.id,
                &[TodoItem::new("a", "1"), TodoItem::new("b", "2")],
                &Removals::None,
            )
            .await
            .unwrap();

        let saved = store
            .save_items(
                list.id,
                &[],
                &Removals::Ids(vec!["a".to_string(), "missing".to_string()]),
            )
            .await
            .unwrap();
        assert_eq!(saved.items.len(), 1);
        assert_eq!(saved.items[0].id, "b");
    }

    #[tokio::test]
    async fn test_remove_all_is_evaluated_at_commit() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        let list = store.create_list(None).await.unwrap();
        store
            .save_items(list.id, &[TodoItem::new("a", "1")], &Removals::None)
            .await
            .unwrap();
        store
            .save_items(list.id, &[TodoItem::new("late", "2")], &Removals::None)
            .await
            .unwrap();

        let cleared = store
            .save_items(list.id, &[], &Removals::All)
            .await
            .unwrap();
        assert!(cleared.items.is_empty());

        // Positions restart once the list is empty
        let refilled = store
            .save_items(list.id, &[TodoItem::new("b", "3")], &Removals::None)
            .await
            .unwrap();
        assert_eq!(refilled.items.len(), 1);
        assert_eq!(refilled.items[0].id, "b");
    }

    #[tokio::test]
    async fn test_save_items_unknown_list() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        let missing = Uuid::new_v4();

        let err = store
            .save_items(missing, &[TodoItem::new("a", "1")], &Removals::None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ListNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_same_item_id_in_different_lists() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        let one = store.create_list(Some(&ctx("one"))).await.unwrap();
        let two = store.create_list(Some(&ctx("two"))).await.unwrap();

        store
            .save_items(one.id, &[TodoItem::new("a", "in one")], &Removals::None)
            .await
            .unwrap();
        let saved = store
            .save_items(two.id, &[TodoItem::new("a", "in two")], &Removals::None)
            .await
            .unwrap();
        assert_eq!(saved.items[0].content, "in two");

        let one = store
            .find_list_by_context(Some(&ctx("one")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(one.items[0].content, "in one");
    }

    #[tokio::test]
    async fn test_delete_list_cascades() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        let list = store.create_list(None).await.unwrap();
        store
            .save_items(list.id, &[TodoItem::new("a", "1")], &Removals::None)
            .await
            .unwrap();

        assert!(store.delete_list(list.id).await.unwrap());
        assert!(!store.delete_list(list.id).await.unwrap());
        assert!(store.find_list_by_context(None).await.unwrap().is_none());

        let orphans: i64 = {
            let conn = store.conn.lock().unwrap();
            conn.query_row("SELECT COUNT(*) FROM todo_items", [], |row| row.get(0))
                .unwrap()
        };
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_special_characters_in_content() {
        let store = SqliteTodoStore::open_in_memory().unwrap();
        let list = store.create_list(Some(&ctx("ctx with 'quotes'"))).await.unwrap();

        let content = "Line one\nline \"two\"\twith tab";
        let saved = store
            .save_items(
                list.id,
                &[TodoItem::new("weird id/1", content)],
                &Removals::None,
            )
            .await
            .unwrap();
        assert_eq!(saved.items[0].content, content);

        let found = store
            .find_list_by_context(Some(&ctx("ctx with 'quotes'")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.items[0].id, "weird id/1");
    }

    #[tokio::test]
    async fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let list_id = {
            let store = SqliteTodoStore::open(&config).unwrap();
            let list = store.create_list(Some(&ctx("chat"))).await.unwrap();
            store
                .save_items(list.id, &[TodoItem::new("t1", "buy milk")], &Removals::None)
                .await
                .unwrap();
            list.id
        };

        assert!(config.sqlite_path().exists());

        let store = SqliteTodoStore::open(&config).unwrap();
        let list = store
            .find_list_by_context(Some(&ctx("chat")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(list.id, list_id);
        assert_eq!(list.items.len(), 1);
        assert_eq!(store.schema_version().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_two_connections_share_uniqueness() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let first = SqliteTodoStore::open(&config).unwrap();
        let second = SqliteTodoStore::open(&config).unwrap();

        first.create_list(Some(&ctx("chat"))).await.unwrap();
        let err = second.create_list(Some(&ctx("chat"))).await.unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
