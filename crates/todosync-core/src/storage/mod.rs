//! Storage layer
//!
//! Implementations of the `TodoStore` collaborator.
//!
//! ## Backends
//!
//! - **SQLite**: durable, one transaction per call, uniqueness enforced by
//!   indexes
//! - **Memory**: in-process map, same contract, no durability

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryTodoStore;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteTodoStore;
