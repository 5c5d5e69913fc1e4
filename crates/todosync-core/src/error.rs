//! Errors surfaced by `TodoSyncService`
//!
//! Three kinds, nothing retried internally:
//! - storage unavailable (transient)
//! - constraint violation (transient, e.g. racing list creation)
//! - invalid input (caller bug)

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum TodoError {
    /// The store could not be reached or a transaction failed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),

    /// A uniqueness or referential-integrity rule was violated
    #[error("Constraint violation: {0}")]
    ConstraintViolation(#[source] StorageError),

    /// A candidate item was malformed; nothing was written
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TodoError {
    /// Whether retrying the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TodoError::InvalidInput(_))
    }

    /// Underlying storage error, if any
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            TodoError::StorageUnavailable(e) | TodoError::ConstraintViolation(e) => Some(e),
            TodoError::InvalidInput(_) => None,
        }
    }
}

impl From<StorageError> for TodoError {
    fn from(error: StorageError) -> Self {
        if error.is_constraint_violation() {
            TodoError::ConstraintViolation(error)
        } else {
            TodoError::StorageUnavailable(error)
        }
    }
}

pub type TodoResult<T> = Result<T, TodoError>;
