//! Todo command handlers

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

use todosync_core::{ContextId, TodoItem, TodoPriority, TodoStatus, TodoSyncService};

use crate::output::Output;

/// Show the list for a context, creating it if needed
pub async fn read(
    service: &TodoSyncService,
    context: Option<&ContextId>,
    output: &Output,
) -> Result<()> {
    let list = service
        .read(context)
        .await
        .context("Failed to read todo list")?;
    output.print_list(&list);
    Ok(())
}

/// Upsert items given inline and/or from a JSON file
pub async fn write(
    service: &TodoSyncService,
    context: Option<&ContextId>,
    args: Vec<String>,
    file: Option<&Path>,
    output: &Output,
) -> Result<()> {
    let items = collect_items(&args, file)?;

    let count = items.len();
    let list = service
        .write(context, items)
        .await
        .context("Failed to write todo items")?;

    output.success(&format!("Wrote {} item(s)", count));
    output.print_list(&list);
    Ok(())
}

/// Remove every item from the list
pub async fn clear(
    service: &TodoSyncService,
    context: Option<&ContextId>,
    output: &Output,
) -> Result<()> {
    let list = service
        .write(context, Vec::new())
        .await
        .context("Failed to clear todo list")?;

    output.success("Cleared list");
    output.print_list(&list);
    Ok(())
}

/// Gather items from `--item` arguments and the optional JSON file
///
/// Refuses an empty result, including a file holding `[]`: an empty write
/// clears the list, and that is what `todosync clear` is for.
fn collect_items(args: &[String], file: Option<&Path>) -> Result<Vec<TodoItem>> {
    let mut items = args
        .iter()
        .map(|arg| parse_item_arg(arg))
        .collect::<Result<Vec<_>>>()?;

    if let Some(path) = file {
        items.extend(read_items_file(path)?);
    }

    if items.is_empty() {
        bail!("No items given. Use --item or --file, or `todosync clear` to empty the list.");
    }
    Ok(items)
}

/// Parse `<id>:<status>:<priority>:<content>` or `<id>:<content>`
///
/// The long form is only used when both status and priority parse, so
/// content may itself contain colons.
pub fn parse_item_arg(arg: &str) -> Result<TodoItem> {
    let parts: Vec<&str> = arg.splitn(4, ':').collect();

    if let [id, status, priority, content] = parts.as_slice() {
        if let (Ok(status), Ok(priority)) =
            (status.parse::<TodoStatus>(), priority.parse::<TodoPriority>())
        {
            return Ok(TodoItem::new(*id, *content)
                .with_status(status)
                .with_priority(priority));
        }
    }

    match arg.split_once(':') {
        Some((id, content)) => Ok(TodoItem::new(id, content)),
        None => bail!(
            "Invalid item '{}'. Expected <id>:<content> or <id>:<status>:<priority>:<content>",
            arg
        ),
    }
}

/// Read a JSON array of items from a file, or stdin when the path is `-`
fn read_items_file(path: &Path) -> Result<Vec<TodoItem>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read items from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read items file: {:?}", path))?
    };

    parse_items_json(&content)
}

fn parse_items_json(content: &str) -> Result<Vec<TodoItem>> {
    serde_json::from_str(content).context("Items must be a JSON array of {id, content, status, priority}")
}
