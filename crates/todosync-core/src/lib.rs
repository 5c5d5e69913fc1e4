//! todosync core library
//!
//! Context-scoped todo lists: one list per context (conversation,
//! workspace, or the default `None` context), created on first access,
//! with incoming item batches merged by item id.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let store = SqliteTodoStore::open(&config)?;
//! let service = TodoSyncService::new(Arc::new(store));
//!
//! let ctx = ContextId::new("chat-42");
//! service.write(Some(&ctx), vec![TodoItem::new("t1", "buy milk")]).await?;
//! let list = service.read(Some(&ctx)).await?;
//! ```
//!
//! # Modules
//!
//! - `service`: read/write entry point and the reconciliation rules
//! - `store`: the `TodoStore` trait the service persists through
//! - `storage`: SQLite and in-memory `TodoStore` implementations
//! - `models`: lists, items, status, priority, context ids
//! - `error`: errors returned to callers
//! - `config`: application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{TodoError, TodoResult};
pub use models::{ContextId, TodoItem, TodoList, TodoPriority, TodoStatus};
pub use service::{reconcile, Reconciliation, TodoSyncService};
pub use storage::{MemoryTodoStore, SqliteTodoStore, StorageError, StorageResult};
pub use store::{Removals, TodoStore};
