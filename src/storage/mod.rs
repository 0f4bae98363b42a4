use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rusqlite::config::DbConfig;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use crate::config::{ConfigPaths, StorageOptions};

mod schema;

/// Stable id of the seeded default list.
pub const DEFAULT_LIST_ID: &str = "00000000-0000-0000-0000-000000000001";

const SQL_NOW: &str = "strftime('%Y-%m-%dT%H:%M:%SZ', 'now')";

const TODO_COLUMNS: &str = "t.id,
        t.title,
        t.description,
        t.is_completed,
        t.priority,
        t.due_date,
        t.list_id,
        l.title,
        l.logical_id,
        t.created_at,
        t.updated_at,
        t.completed_at";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    /// Next level for the `p` keybinding, wrapping back to none.
    pub fn cycled(self) -> Self {
        match self {
            Priority::None => Priority::Low,
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TodoRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub list_id: String,
    pub list_title: String,
    pub list_logical_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ListRecord {
    pub id: String,
    pub title: String,
    pub logical_id: i64,
    pub created_at: String,
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub list_id: String,
}

/// Partial update. Outer `None` leaves the column alone; for nullable
/// columns the inner `Option` distinguishes set from clear.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<String>>,
    pub list_id: Option<String>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.list_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Active,
    Completed,
    All,
}

impl StatusFilter {
    /// `f` keybinding cycle: active, completed, all.
    pub fn cycled(self) -> Self {
        match self {
            StatusFilter::Active => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
            StatusFilter::All => StatusFilter::Active,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
            StatusFilter::All => "all",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub list_id: Option<String>,
    pub status: StatusFilter,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Stats {
    pub total: i64,
    pub active: i64,
    pub completed: i64,
    pub overdue: i64,
    pub lists: i64,
}

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Todos ordered the way every surface shows them: incomplete first,
    /// then list position, due date with undated rows last, priority, title.
    pub fn query_todos(&self, filter: &TodoFilter) -> Result<Vec<TodoRecord>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(list_id) = &filter.list_id {
            values.push(Box::new(list_id.clone()));
            clauses.push(format!("t.list_id = ?{}", values.len()));
        }
        match filter.status {
            StatusFilter::Active => clauses.push("t.is_completed = 0".to_string()),
            StatusFilter::Completed => clauses.push("t.is_completed = 1".to_string()),
            StatusFilter::All => {}
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {TODO_COLUMNS}
             FROM todos t
             INNER JOIN lists l ON l.id = t.list_id
             {where_clause}
             ORDER BY t.is_completed ASC,
                      l.logical_id ASC,
                      t.due_date IS NULL ASC,
                      t.due_date ASC,
                      CASE t.priority
                          WHEN 'high' THEN 0
                          WHEN 'medium' THEN 1
                          WHEN 'low' THEN 2
                          ELSE 3
                      END ASC,
                      t.title ASC"
        );

        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter().map(|v| v.as_ref())), |row| {
                    read_todo_row(row)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("querying todos")?;
            Ok(rows)
        })
    }

    pub fn fetch_todo(&self, todo_id: &str) -> Result<Option<TodoRecord>> {
        let sql = format!(
            "SELECT {TODO_COLUMNS}
             FROM todos t
             INNER JOIN lists l ON l.id = t.list_id
             WHERE t.id = ?1"
        );
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let record = stmt
                .query_row(params![todo_id], |row| read_todo_row(row))
                .optional()?;
            Ok(record)
        })
    }

    pub fn create_todo(&self, new: &NewTodo) -> Result<String> {
        let title = new.title.trim();
        if title.is_empty() {
            bail!("todo title cannot be empty");
        }
        let id = Uuid::new_v4().to_string();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO todos (id, title, description, priority, due_date, list_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    title,
                    new.description.as_deref(),
                    new.priority.to_string(),
                    new.due_date.as_deref(),
                    new.list_id,
                ],
            )
            .context("inserting todo")?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn update_todo(&self, todo_id: &str, patch: &TodoPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(title) = &patch.title {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                bail!("todo title cannot be empty");
            }
            values.push(Box::new(trimmed.to_string()));
            sets.push(format!("title = ?{}", values.len()));
        }
        if let Some(description) = &patch.description {
            values.push(Box::new(description.clone()));
            sets.push(format!("description = ?{}", values.len()));
        }
        if let Some(priority) = patch.priority {
            values.push(Box::new(priority.to_string()));
            sets.push(format!("priority = ?{}", values.len()));
        }
        if let Some(due_date) = &patch.due_date {
            values.push(Box::new(due_date.clone()));
            sets.push(format!("due_date = ?{}", values.len()));
        }
        if let Some(list_id) = &patch.list_id {
            values.push(Box::new(list_id.clone()));
            sets.push(format!("list_id = ?{}", values.len()));
        }

        values.push(Box::new(todo_id.to_string()));
        let sql = format!(
            "UPDATE todos SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );
        self.with_connection(|conn| {
            let updated = conn
                .execute(&sql, params_from_iter(values.iter().map(|v| v.as_ref())))
                .context("updating todo")?;
            if updated == 0 {
                bail!("todo {todo_id} not found");
            }
            Ok(())
        })
    }

    pub fn complete_todo(&self, todo_id: &str) -> Result<()> {
        let sql =
            format!("UPDATE todos SET is_completed = 1, completed_at = {SQL_NOW} WHERE id = ?1");
        self.with_connection(|conn| {
            let updated = conn
                .execute(&sql, params![todo_id])
                .context("completing todo")?;
            if updated == 0 {
                bail!("todo {todo_id} not found");
            }
            Ok(())
        })
    }

    pub fn reopen_todo(&self, todo_id: &str) -> Result<()> {
        self.with_connection(|conn| {
            let updated = conn
                .execute(
                    "UPDATE todos SET is_completed = 0, completed_at = NULL WHERE id = ?1",
                    params![todo_id],
                )
                .context("reopening todo")?;
            if updated == 0 {
                bail!("todo {todo_id} not found");
            }
            Ok(())
        })
    }

    pub fn delete_todo(&self, todo_id: &str) -> Result<()> {
        self.with_connection(|conn| {
            let deleted = conn
                .execute("DELETE FROM todos WHERE id = ?1", params![todo_id])
                .context("deleting todo")?;
            if deleted == 0 {
                bail!("todo {todo_id} not found");
            }
            Ok(())
        })
    }

    pub fn fetch_all_lists(&self) -> Result<Vec<ListRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id,
                        l.title,
                        l.logical_id,
                        l.created_at,
                        COUNT(t.id),
                        COALESCE(SUM(CASE WHEN t.is_completed = 0 THEN 1 ELSE 0 END), 0)
                 FROM lists l
                 LEFT JOIN todos t ON t.list_id = l.id
                 GROUP BY l.id
                 ORDER BY l.logical_id ASC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ListRecord {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        logical_id: row.get(2)?,
                        created_at: row.get(3)?,
                        total: row.get(4)?,
                        active: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("fetching lists")?;
            Ok(rows)
        })
    }

    /// Look a list up by logical position or title, in that order.
    pub fn find_list(&self, token: &str) -> Result<Option<ListRecord>> {
        let lists = self.fetch_all_lists()?;
        if let Ok(logical) = token.trim().parse::<i64>() {
            if let Some(list) = lists.iter().find(|l| l.logical_id == logical) {
                return Ok(Some(list.clone()));
            }
        }
        Ok(lists
            .into_iter()
            .find(|l| l.title.eq_ignore_ascii_case(token.trim())))
    }

    pub fn create_list(&self, title: &str) -> Result<String> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            bail!("list title cannot be empty");
        }
        let id = Uuid::new_v4().to_string();
        self.with_connection(|conn| {
            let duplicate = conn
                .query_row(
                    "SELECT 1 FROM lists WHERE title = ?1 COLLATE NOCASE",
                    params![trimmed],
                    |_row| Ok(()),
                )
                .optional()?
                .is_some();
            if duplicate {
                bail!("list '{trimmed}' already exists");
            }
            conn.execute(
                "INSERT INTO lists (id, title, logical_id)
                 VALUES (?1, ?2, (SELECT COALESCE(MAX(logical_id), 0) + 1 FROM lists))",
                params![id, trimmed],
            )
            .context("inserting list")?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn rename_list(&self, list_id: &str, title: &str) -> Result<()> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            bail!("list title cannot be empty");
        }
        self.with_connection(|conn| {
            let taken = conn
                .query_row(
                    "SELECT 1 FROM lists WHERE title = ?1 COLLATE NOCASE AND id != ?2",
                    params![trimmed, list_id],
                    |_row| Ok(()),
                )
                .optional()?
                .is_some();
            if taken {
                bail!("list '{trimmed}' already exists");
            }
            let updated = conn
                .execute(
                    "UPDATE lists SET title = ?1 WHERE id = ?2",
                    params![trimmed, list_id],
                )
                .context("renaming list")?;
            if updated == 0 {
                bail!("list {list_id} not found");
            }
            Ok(())
        })
    }

    /// Deleting a list moves its todos into the default list.
    pub fn delete_list(&self, list_id: &str) -> Result<usize> {
        if list_id == DEFAULT_LIST_ID {
            bail!("the default list cannot be deleted");
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM lists WHERE id = ?1",
                params![list_id],
                |_row| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            bail!("list {list_id} not found");
        }
        let moved = tx.execute(
            "UPDATE todos SET list_id = ?1 WHERE list_id = ?2",
            params![DEFAULT_LIST_ID, list_id],
        )?;
        tx.execute("DELETE FROM lists WHERE id = ?1", params![list_id])?;
        tx.commit()?;
        Ok(moved)
    }

    /// Move a list to a new position. When another list already holds the
    /// target position the two swap, parking the occupant on a sentinel
    /// position first so the UNIQUE constraint never fires mid-swap.
    pub fn reassign_list_position(&self, list_id: &str, new_logical: i64) -> Result<()> {
        if new_logical < 1 {
            bail!("list position must be at least 1");
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let current: i64 = tx
            .query_row(
                "SELECT logical_id FROM lists WHERE id = ?1",
                params![list_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| anyhow::anyhow!("list {list_id} not found"))?;
        if current == new_logical {
            return Ok(());
        }
        let occupant: Option<String> = tx
            .query_row(
                "SELECT id FROM lists WHERE logical_id = ?1",
                params![new_logical],
                |row| row.get(0),
            )
            .optional()?;
        match occupant {
            Some(other_id) => {
                tx.execute(
                    "UPDATE lists SET logical_id = -1 WHERE id = ?1",
                    params![other_id],
                )?;
                tx.execute(
                    "UPDATE lists SET logical_id = ?1 WHERE id = ?2",
                    params![new_logical, list_id],
                )?;
                tx.execute(
                    "UPDATE lists SET logical_id = ?1 WHERE id = ?2",
                    params![current, other_id],
                )?;
            }
            None => {
                tx.execute(
                    "UPDATE lists SET logical_id = ?1 WHERE id = ?2",
                    params![new_logical, list_id],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Replace the index mapping with the rows just shown, numbered from 1.
    pub fn save_last_shown(&self, todo_ids: &[String]) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM _last_result", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO _last_result (idx, todo_id) VALUES (?1, ?2)")?;
            for (pos, id) in todo_ids.iter().enumerate() {
                stmt.execute(params![(pos + 1) as i64, id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn todo_id_by_index(&self, index: i64) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let id = conn
                .query_row(
                    "SELECT todo_id FROM _last_result WHERE idx = ?1",
                    params![index],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    pub fn last_shown_count(&self) -> Result<i64> {
        self.with_connection(|conn| {
            let count =
                conn.query_row("SELECT COUNT(*) FROM _last_result", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    pub fn todo_ids_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        // LIKE metacharacters in the token must match literally
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM todos WHERE lower(id) LIKE lower(?1) || '%' ESCAPE '\\' ORDER BY id",
            )?;
            let rows = stmt
                .query_map(params![escaped], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("matching id prefix")?;
            Ok(rows)
        })
    }

    pub fn stats(&self, today: &str) -> Result<Stats> {
        self.with_connection(|conn| {
            let (total, completed, overdue) = conn.query_row(
                "SELECT COUNT(*),
                        SUM(CASE WHEN is_completed = 1 THEN 1 ELSE 0 END),
                        SUM(CASE WHEN is_completed = 0
                                  AND due_date IS NOT NULL
                                  AND due_date < ?1 THEN 1 ELSE 0 END)
                 FROM todos",
                params![today],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                        row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                    ))
                },
            )?;
            let lists: i64 = conn.query_row("SELECT COUNT(*) FROM lists", [], |row| row.get(0))?;
            Ok(Stats {
                total,
                active: total - completed,
                completed,
                overdue,
                lists,
            })
        })
    }
}

fn read_todo_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TodoRecord> {
    let priority_raw: String = row.get(4)?;
    let priority = priority_raw.parse::<Priority>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(TodoRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_completed: row.get::<_, i64>(3)? != 0,
        priority,
        due_date: row.get(5)?,
        list_id: row.get(6)?,
        list_title: row.get(7)?,
        list_logical_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        completed_at: row.get(11)?,
    })
}

pub fn init(
    paths: &ConfigPaths,
    storage: &StorageOptions,
    default_list: &str,
) -> Result<StorageHandle> {
    let db_path = &paths.database_path;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)?;
    schema::apply(&conn)?;
    ensure_default_list(&conn, default_list)?;
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(storage.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)
        .context("enabling foreign keys")?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

fn ensure_default_list(conn: &Connection, title: &str) -> Result<()> {
    let title = title.trim();
    let title = if title.is_empty() { "Todos" } else { title };
    conn.execute(
        "INSERT OR IGNORE INTO lists (id, title, logical_id) VALUES (?1, ?2, 1)",
        params![DEFAULT_LIST_ID, title],
    )
    .context("seeding default list")?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ConfigPaths;
    use tempfile::TempDir;

    fn temp_paths(root: &TempDir) -> ConfigPaths {
        let base = root.path();
        let config_dir = base.join("config");
        let data_dir = base.join("data");
        let state_dir = base.join("state");
        ConfigPaths {
            config_dir: config_dir.clone(),
            config_file: config_dir.join("config.toml"),
            data_dir: data_dir.clone(),
            database_path: data_dir.join("todos.db"),
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    fn storage_options(paths: &ConfigPaths) -> StorageOptions {
        let mut options = StorageOptions::default();
        options.database_path = paths.database_path.clone();
        options
    }

    pub(crate) fn init_storage() -> anyhow::Result<(TempDir, StorageHandle)> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        let opts = storage_options(&paths);
        let storage = init(&paths, &opts, "Todos")?;
        Ok((temp, storage))
    }

    pub(crate) fn add(
        storage: &StorageHandle,
        title: &str,
        priority: Priority,
        due: Option<&str>,
        list_id: &str,
    ) -> anyhow::Result<String> {
        storage.create_todo(&NewTodo {
            title: title.to_string(),
            description: None,
            priority,
            due_date: due.map(str::to_string),
            list_id: list_id.to_string(),
        })
    }

    #[test]
    fn default_list_is_seeded_once() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let lists = storage.fetch_all_lists()?;
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, DEFAULT_LIST_ID);
        assert_eq!(lists[0].title, "Todos");
        assert_eq!(lists[0].logical_id, 1);
        Ok(())
    }

    #[test]
    fn query_orders_by_status_list_due_priority_title() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let work = storage.create_list("Work")?;

        let done = add(&storage, "Already done", Priority::High, None, DEFAULT_LIST_ID)?;
        storage.complete_todo(&done)?;
        let undated = add(&storage, "Undated", Priority::High, None, DEFAULT_LIST_ID)?;
        let late_due = add(
            &storage,
            "Later due",
            Priority::High,
            Some("2025-06-02"),
            DEFAULT_LIST_ID,
        )?;
        let early_low = add(
            &storage,
            "B early low",
            Priority::Low,
            Some("2025-06-01"),
            DEFAULT_LIST_ID,
        )?;
        let early_high = add(
            &storage,
            "A early high",
            Priority::High,
            Some("2025-06-01"),
            DEFAULT_LIST_ID,
        )?;
        let second_list = add(&storage, "Work item", Priority::None, None, &work)?;

        let rows = storage.query_todos(&TodoFilter {
            list_id: None,
            status: StatusFilter::All,
        })?;
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                early_high.as_str(),
                early_low.as_str(),
                late_due.as_str(),
                undated.as_str(),
                second_list.as_str(),
                done.as_str(),
            ]
        );
        Ok(())
    }

    #[test]
    fn title_breaks_ties_between_equal_rows() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let b = add(&storage, "Bravo", Priority::Medium, None, DEFAULT_LIST_ID)?;
        let a = add(&storage, "Alpha", Priority::Medium, None, DEFAULT_LIST_ID)?;
        let rows = storage.query_todos(&TodoFilter::default())?;
        assert_eq!(rows[0].id, a);
        assert_eq!(rows[1].id, b);
        Ok(())
    }

    #[test]
    fn status_filter_partitions_rows() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let open = add(&storage, "Open", Priority::None, None, DEFAULT_LIST_ID)?;
        let closed = add(&storage, "Closed", Priority::None, None, DEFAULT_LIST_ID)?;
        storage.complete_todo(&closed)?;

        let active = storage.query_todos(&TodoFilter::default())?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open);

        let completed = storage.query_todos(&TodoFilter {
            list_id: None,
            status: StatusFilter::Completed,
        })?;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, closed);
        Ok(())
    }

    #[test]
    fn patch_updates_and_clears_nullable_columns() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(
            &storage,
            "Patch me",
            Priority::None,
            Some("2025-06-01"),
            DEFAULT_LIST_ID,
        )?;

        storage.update_todo(
            &id,
            &TodoPatch {
                title: Some("Patched".to_string()),
                description: Some(Some("details".to_string())),
                priority: Some(Priority::High),
                due_date: Some(None),
                list_id: None,
            },
        )?;

        let todo = storage.fetch_todo(&id)?.expect("todo present");
        assert_eq!(todo.title, "Patched");
        assert_eq!(todo.description.as_deref(), Some("details"));
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.due_date, None);
        Ok(())
    }

    #[test]
    fn complete_and_reopen_track_completed_at() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(&storage, "Cycle", Priority::None, None, DEFAULT_LIST_ID)?;

        storage.complete_todo(&id)?;
        let done = storage.fetch_todo(&id)?.expect("todo present");
        assert!(done.is_completed);
        assert!(done.completed_at.is_some());

        storage.reopen_todo(&id)?;
        let open = storage.fetch_todo(&id)?.expect("todo present");
        assert!(!open.is_completed);
        assert_eq!(open.completed_at, None);
        Ok(())
    }

    #[test]
    fn missing_rows_report_not_found() {
        let (_temp, storage) = init_storage().expect("storage");
        let missing = "ffffffff-ffff-ffff-ffff-ffffffffffff";
        assert!(storage.complete_todo(missing).is_err());
        assert!(storage.delete_todo(missing).is_err());
        assert!(storage
            .update_todo(
                missing,
                &TodoPatch {
                    title: Some("x".to_string()),
                    ..TodoPatch::default()
                },
            )
            .is_err());
    }

    #[test]
    fn last_shown_mapping_is_replaced_wholesale() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let first = add(&storage, "First", Priority::None, None, DEFAULT_LIST_ID)?;
        let second = add(&storage, "Second", Priority::None, None, DEFAULT_LIST_ID)?;

        storage.save_last_shown(&[first.clone(), second.clone()])?;
        assert_eq!(storage.todo_id_by_index(1)?, Some(first));
        assert_eq!(storage.todo_id_by_index(2)?, Some(second.clone()));
        assert_eq!(storage.todo_id_by_index(3)?, None);

        storage.save_last_shown(&[second.clone()])?;
        assert_eq!(storage.todo_id_by_index(1)?, Some(second));
        assert_eq!(storage.todo_id_by_index(2)?, None);
        assert_eq!(storage.last_shown_count()?, 1);
        Ok(())
    }

    #[test]
    fn list_positions_swap_through_sentinel() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let work = storage.create_list("Work")?;
        let home = storage.create_list("Home")?;

        storage.reassign_list_position(&home, 2)?;

        let lists = storage.fetch_all_lists()?;
        let position = |id: &str| {
            lists
                .iter()
                .find(|l| l.id == id)
                .map(|l| l.logical_id)
                .expect("list present")
        };
        assert_eq!(position(DEFAULT_LIST_ID), 1);
        assert_eq!(position(&home), 2);
        assert_eq!(position(&work), 3);
        Ok(())
    }

    #[test]
    fn deleting_a_list_moves_todos_to_default() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let work = storage.create_list("Work")?;
        let id = add(&storage, "Orphan", Priority::None, None, &work)?;

        let moved = storage.delete_list(&work)?;
        assert_eq!(moved, 1);
        let todo = storage.fetch_todo(&id)?.expect("todo present");
        assert_eq!(todo.list_id, DEFAULT_LIST_ID);

        assert!(storage.delete_list(DEFAULT_LIST_ID).is_err());
        Ok(())
    }

    #[test]
    fn duplicate_list_titles_are_rejected() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.create_list("Work")?;
        assert!(storage.create_list("work").is_err());
        let home = storage.create_list("Home")?;
        assert!(storage.rename_list(&home, "WORK").is_err());
        storage.rename_list(&home, "Household")?;
        Ok(())
    }

    #[test]
    fn find_list_by_position_or_title() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let work = storage.create_list("Work")?;
        assert_eq!(storage.find_list("2")?.map(|l| l.id), Some(work.clone()));
        assert_eq!(storage.find_list("work")?.map(|l| l.id), Some(work));
        assert_eq!(
            storage.find_list("todos")?.map(|l| l.id),
            Some(DEFAULT_LIST_ID.to_string())
        );
        assert!(storage.find_list("nope")?.is_none());
        Ok(())
    }

    #[test]
    fn prefix_lookup_is_case_insensitive() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(&storage, "Find me", Priority::None, None, DEFAULT_LIST_ID)?;
        let prefix = id[..8].to_uppercase();
        let matches = storage.todo_ids_with_prefix(&prefix)?;
        assert_eq!(matches, vec![id]);
        Ok(())
    }

    #[test]
    fn prefix_lookup_treats_like_metacharacters_literally() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        add(&storage, "One", Priority::None, None, DEFAULT_LIST_ID)?;
        add(&storage, "Two", Priority::None, None, DEFAULT_LIST_ID)?;
        assert!(storage.todo_ids_with_prefix("%")?.is_empty());
        assert!(storage.todo_ids_with_prefix("________")?.is_empty());
        assert!(storage.todo_ids_with_prefix("a%")?.is_empty());
        Ok(())
    }

    #[test]
    fn stats_count_overdue_against_reference_day() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        add(
            &storage,
            "Late",
            Priority::None,
            Some("2025-01-01"),
            DEFAULT_LIST_ID,
        )?;
        add(
            &storage,
            "On time",
            Priority::None,
            Some("2025-01-02"),
            DEFAULT_LIST_ID,
        )?;
        let done = add(
            &storage,
            "Late but done",
            Priority::None,
            Some("2024-12-01"),
            DEFAULT_LIST_ID,
        )?;
        storage.complete_todo(&done)?;

        let stats = storage.stats("2025-01-02")?;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.lists, 1);
        Ok(())
    }
}
