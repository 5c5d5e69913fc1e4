//! Data models for todosync
//!
//! Defines the core data structures: TodoList, TodoItem and the context
//! identifier that scopes a list. Item identities are supplied by the
//! caller; list identities are generated here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name given to every newly created list
pub const DEFAULT_LIST_NAME: &str = "Todos";

/// Opaque identifier scoping a list to a conversation or workspace
///
/// `None` in an `Option<ContextId>` denotes the default list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ContextId(pub String);

impl ContextId {
    /// Create a new context identifier
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the raw value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContextId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContextId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Error returned when a status or priority string is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Progress state of a todo item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
            TodoStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TodoStatus::Pending),
            "in_progress" => Ok(TodoStatus::InProgress),
            "completed" => Ok(TodoStatus::Completed),
            "cancelled" => Ok(TodoStatus::Cancelled),
            other => Err(ParseEnumError {
                kind: "status",
                value: other.to_string(),
                expected: "pending, in_progress, completed, cancelled",
            }),
        }
    }
}

/// Importance of a todo item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl TodoPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoPriority::High => "high",
            TodoPriority::Medium => "medium",
            TodoPriority::Low => "low",
        }
    }
}

impl fmt::Display for TodoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoPriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(TodoPriority::High),
            "medium" => Ok(TodoPriority::Medium),
            "low" => Ok(TodoPriority::Low),
            other => Err(ParseEnumError {
                kind: "priority",
                value: other.to_string(),
                expected: "high, medium, low",
            }),
        }
    }
}

/// A single entry of a todo list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoItem {
    /// Caller-supplied identifier, unique within the owning list
    pub id: String,
    /// Free text
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub priority: TodoPriority,
    /// Owning list; set by the sync service when the item is attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<Uuid>,
}

impl TodoItem {
    /// Create a pending, medium priority item
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            status: TodoStatus::default(),
            priority: TodoPriority::default(),
            list_id: None,
        }
    }

    /// Builder-style status setter
    pub fn with_status(mut self, status: TodoStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder-style priority setter
    pub fn with_priority(mut self, priority: TodoPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Overwrite the mutable fields (content, status, priority) from another item
    pub fn apply_from(&mut self, other: &TodoItem) {
        self.content = other.content.clone();
        self.status = other.status;
        self.priority = other.priority;
    }
}

/// A todo list owned by one context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoList {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Owning context; `None` is the default list
    pub context: Option<ContextId>,
    /// When this list was created
    pub created_at: DateTime<Utc>,
    /// Items in insertion order
    pub items: Vec<TodoItem>,
}

impl TodoList {
    /// Create a new, empty list for the given context
    pub fn new(context: Option<ContextId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: DEFAULT_LIST_NAME.to_string(),
            context,
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }

    /// Find an item by its identifier
    pub fn item(&self, id: &str) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of items in the list
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
