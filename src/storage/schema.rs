use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS lists (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            logical_id INTEGER NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS todos (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            is_completed INTEGER NOT NULL DEFAULT 0,
            priority TEXT NOT NULL DEFAULT 'none'
                CHECK (priority IN ('none', 'low', 'medium', 'high')),
            due_date TEXT,
            list_id TEXT NOT NULL REFERENCES lists(id),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
            completed_at TEXT
        );

        -- index -> todo id mapping from the most recent listing, so commands
        -- can address rows by the number they were shown with
        CREATE TABLE IF NOT EXISTS _last_result (
            idx INTEGER PRIMARY KEY,
            todo_id TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_todos_list ON todos(list_id);
        CREATE INDEX IF NOT EXISTS idx_todos_due ON todos(due_date);

        CREATE TRIGGER IF NOT EXISTS trg_todos_updated_at
        AFTER UPDATE OF title, description, is_completed, priority, due_date, list_id ON todos
        BEGIN
            UPDATE todos
            SET updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
            WHERE id = new.id;
        END;

        CREATE TRIGGER IF NOT EXISTS trg_lists_updated_at
        AFTER UPDATE OF title, logical_id ON lists
        BEGIN
            UPDATE lists
            SET updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
            WHERE id = new.id;
        END;
        "#,
    )
    .context("applying schema migrations")?;
    Ok(())
}
