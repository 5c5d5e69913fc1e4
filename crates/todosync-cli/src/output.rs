//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use todosync_core::{TodoItem, TodoList, TodoStatus};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a todo list with its items
    pub fn print_list(&self, list: &TodoList) {
        match self.format {
            OutputFormat::Human => {
                println!("List:     {}", list.id);
                println!("Name:     {}", list.name);
                println!(
                    "Context:  {}",
                    list.context
                        .as_ref()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "(default)".to_string())
                );
                println!("Created:  {}", list.created_at.format("%Y-%m-%d %H:%M"));
                println!();

                if list.items.is_empty() {
                    println!("No items.");
                    return;
                }

                println!("── Items ({}) ──", list.items.len());
                for item in &list.items {
                    println!("{}", format_item(item));
                }
            }
            OutputFormat::Json => match serde_json::to_string_pretty(list) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to serialize list: {}", e),
            },
            OutputFormat::Quiet => {
                for item in &list.items {
                    println!("{}\t{}", item.id, item.status);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// One human-readable line per item
fn format_item(item: &TodoItem) -> String {
    format!(
        "{} {} | {} ({})",
        status_marker(item.status),
        truncate(&item.id, 12),
        truncate_line(&item.content, 60),
        item.priority
    )
}

fn status_marker(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Pending => "[ ]",
        TodoStatus::InProgress => "[~]",
        TodoStatus::Completed => "[x]",
        TodoStatus::Cancelled => "[-]",
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
