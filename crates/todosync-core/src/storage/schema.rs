//! SQLite schema for todo lists and their items
//!
//! One row per list, one row per item, with a cascading foreign key from
//! item to list. Context uniqueness (including the single default list)
//! is enforced by the indexes, not by callers.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Lists, one per context
        CREATE TABLE IF NOT EXISTS todo_lists (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            context TEXT,
            created_at INTEGER NOT NULL
        );

        -- Items, keyed by caller identity within their list
        CREATE TABLE IF NOT EXISTS todo_items (
            list_id TEXT NOT NULL,
            id TEXT NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL
                CHECK (status IN ('pending', 'in_progress', 'completed', 'cancelled')),
            priority TEXT NOT NULL
                CHECK (priority IN ('high', 'medium', 'low')),
            position INTEGER NOT NULL,
            PRIMARY KEY (list_id, id),
            FOREIGN KEY (list_id) REFERENCES todo_lists(id) ON DELETE CASCADE
        );

        -- At most one list per non-null context
        CREATE UNIQUE INDEX IF NOT EXISTS idx_todo_lists_context
            ON todo_lists(context) WHERE context IS NOT NULL;

        -- NULLs are distinct in a plain UNIQUE index, so the default list
        -- gets its own: every qualifying row indexes the same constant.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_todo_lists_default
            ON todo_lists((context IS NULL)) WHERE context IS NULL;

        -- Read items in insertion order
        CREATE INDEX IF NOT EXISTS idx_todo_items_position
            ON todo_items(list_id, position);
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn insert_list(conn: &Connection, id: &str, context: Option<&str>) -> Result<usize> {
        conn.execute(
            "INSERT INTO todo_lists (id, name, context, created_at) VALUES (?, 'Todos', ?, 0)",
            params![id, context],
        )
    }

    #[test]
    fn test_init_schema() {
        let conn = setup();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"todo_lists".to_string()));
        assert!(tables.contains(&"todo_items".to_string()));
        assert!(tables.contains(&"schema_info".to_string()));
    }

    #[test]
    fn test_schema_version() {
        let conn = Connection::open_in_memory().unwrap();

        assert!(needs_init(&conn));

        init_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
        assert!(!needs_init(&conn));
    }

    #[test]
    fn test_init_is_repeatable() {
        let conn = setup();
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_context_unique() {
        let conn = setup();
        insert_list(&conn, "l1", Some("chat")).unwrap();
        assert!(insert_list(&conn, "l2", Some("chat")).is_err());
        insert_list(&conn, "l3", Some("other")).unwrap();
    }

    #[test]
    fn test_single_default_list() {
        let conn = setup();
        insert_list(&conn, "l1", None).unwrap();
        assert!(insert_list(&conn, "l2", None).is_err());
        // The default list does not block named contexts
        insert_list(&conn, "l3", Some("chat")).unwrap();
    }

    #[test]
    fn test_item_status_checked() {
        let conn = setup();
        insert_list(&conn, "l1", None).unwrap();
        let result = conn.execute(
            "INSERT INTO todo_items (list_id, id, content, status, priority, position)
             VALUES ('l1', 'a', 'x', 'done', 'high', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_list_cascades_to_items() {
        let conn = setup();
        insert_list(&conn, "l1", None).unwrap();
        conn.execute(
            "INSERT INTO todo_items (list_id, id, content, status, priority, position)
             VALUES ('l1', 'a', 'x', 'pending', 'high', 0)",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM todo_lists WHERE id = 'l1'", [])
            .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM todo_items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_item_requires_existing_list() {
        let conn = setup();
        let result = conn.execute(
            "INSERT INTO todo_items (list_id, id, content, status, priority, position)
             VALUES ('missing', 'a', 'x', 'pending', 'high', 0)",
            [],
        );
        assert!(result.is_err());
    }
}
