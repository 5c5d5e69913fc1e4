//! Status command handler

use anyhow::{Context, Result};

use todosync_core::{Config, SqliteTodoStore};

use crate::output::{Output, OutputFormat};

/// Show storage location and database state
pub async fn show(config: &Config, store: &SqliteTodoStore, output: &Output) -> Result<()> {
    let schema_version = store
        .schema_version()
        .await
        .context("Failed to read schema version")?;
    let lists = store.list_count().await.context("Failed to count lists")?;
    let db_path = config.sqlite_path();
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database": db_path,
                    "database_size": db_size,
                    "schema_version": schema_version,
                    "lists": lists
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", db_path.display());
        }
        OutputFormat::Human => {
            println!("todosync Status");
            println!("===============");
            println!();
            println!("Storage:");
            println!("  Data dir: {}", config.data_dir.display());
            println!("  Database: {} ({})", db_path.display(), format_size(db_size));
            println!(
                "  Schema:   {}",
                schema_version
                    .map(|v| format!("v{}", v))
                    .unwrap_or_else(|| "(uninitialized)".to_string())
            );
            println!();
            println!("Lists: {}", lists);
        }
    }

    Ok(())
}

/// Format a byte count for humans
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
