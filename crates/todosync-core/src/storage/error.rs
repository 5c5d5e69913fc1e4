//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ContextId;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Database file could not be opened
    #[error("Failed to open database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A list already exists for this context
    #[error("A list already exists for context {}", display_context(.context))]
    DuplicateContext { context: Option<ContextId> },

    /// The list an operation targets does not exist
    #[error("List not found: {0}")]
    ListNotFound(Uuid),

    /// A stored row could not be decoded
    #[error("Corrupt row in '{table}': {details}")]
    CorruptRow { table: &'static str, details: String },

    /// Store lock was poisoned by a panicking holder
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Background task running the operation failed
    #[error("Storage task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl StorageError {
    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            _ => StorageError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Check if this error reports a uniqueness or referential-integrity rule
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StorageError::DuplicateContext { .. } | StorageError::ListNotFound(_) => true,
            StorageError::Database(e) => is_sqlite_constraint(e),
            _ => false,
        }
    }

    /// Check if retrying the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::DuplicateContext { .. } => true,
            StorageError::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
            ),
            StorageError::LockPoisoned | StorageError::TaskJoin(_) => true,
            _ => false,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions, or point TODOSYNC_DATA_DIR somewhere writable.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::DuplicateContext { .. } => {
                Some("Another caller created this list concurrently. Retry the operation.")
            }
            StorageError::Database(_) if self.is_retryable() => {
                Some("The database is busy. Retry, or raise busy_timeout_ms.")
            }
            _ => None,
        }
    }
}

pub(crate) fn is_sqlite_constraint(error: &rusqlite::Error) -> bool {
    matches!(
        error.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}

fn display_context(context: &Option<ContextId>) -> String {
    match context {
        Some(c) => format!("'{}'", c),
        None => "<default>".to_string(),
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint_error() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: todo_lists.context".to_string()),
        )
    }

    #[test]
    fn test_permission_denied_classification() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::from_io(io_err, PathBuf::from("/test/path"));

        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(err.recovery_suggestion().is_some());
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_sqlite_constraint_detected() {
        let err = StorageError::from(constraint_error());
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_busy_is_retryable() {
        let err = StorageError::from(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(err.is_retryable());
        assert!(!err.is_constraint_violation());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_duplicate_context_display() {
        let err = StorageError::DuplicateContext {
            context: Some(ContextId::new("chat-9")),
        };
        assert!(err.to_string().contains("'chat-9'"));
        assert!(err.is_constraint_violation());
        assert!(err.is_retryable());

        let err = StorageError::DuplicateContext { context: None };
        assert!(err.to_string().contains("<default>"));
    }

    #[test]
    fn test_list_not_found_is_constraint() {
        let err = StorageError::ListNotFound(Uuid::new_v4());
        assert!(err.is_constraint_violation());
        assert!(!err.is_retryable());
    }
}
