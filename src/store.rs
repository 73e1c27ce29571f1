//! SQLite-backed task storage.
//!
//! Each call opens its own connection and drops it before returning, so no
//! transaction ever spans more than one user action.

use rusqlite::{params, types::Type, Connection, Row};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::{Result, TaskError};
use crate::task::{Status, Task};

const SCHEMA_TASKS: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
)";
const INSERT_TASK: &str = "INSERT INTO tasks (title, description) VALUES (?1, ?2)";
const SELECT_TASKS: &str = "SELECT id, title, description, status FROM tasks";
const UPDATE_STATUS: &str = "UPDATE tasks SET status = ?1 WHERE id = ?2";
const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = ?1";
const IMPORT_TASK: &str =
    "INSERT OR IGNORE INTO tasks (id, title, description, status) VALUES (?1, ?2, ?3, ?4)";

#[derive(Debug, Clone)]
pub struct TaskStore {
    db_path: PathBuf,
}

impl TaskStore {
    /// Points the store at `db_path` and makes sure the `tasks` table exists.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            db_path: db_path.into(),
        };
        if let Some(parent) = store.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        store.open()?.execute(SCHEMA_TASKS, [])?;
        info!(path = %store.db_path.display(), "task store ready");
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Inserts a pending task. Blank titles are rejected before touching the database.
    pub fn create(&self, title: &str, description: Option<&str>) -> Result<Task> {
        if title.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        let conn = self.open()?;
        conn.execute(INSERT_TASK, params![title, description])?;
        let task = Task {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
            description: description.map(str::to_string),
            status: Status::Pending,
        };
        info!(id = task.id, "task created");
        Ok(task)
    }

    /// All rows in storage order.
    pub fn list(&self) -> Result<Vec<Task>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(SELECT_TASKS)?;
        let tasks = stmt
            .query_map([], parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    /// Returns `false` when no row has `id`.
    pub fn set_status(&self, id: i64, status: Status) -> Result<bool> {
        let changed = self
            .open()?
            .execute(UPDATE_STATUS, params![status.as_str(), id])?;
        info!(id, %status, changed, "task status updated");
        Ok(changed > 0)
    }

    /// Removes the row, then vacuums the database file.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let removed = conn.execute(DELETE_TASK, params![id])?;
        conn.execute_batch("VACUUM")?;
        info!(id, removed, "task deleted");
        Ok(removed > 0)
    }

    /// Writes every task to `path` as an indented JSON array, replacing the file.
    pub fn export_all(&self, path: &Path) -> Result<usize> {
        let tasks = self.list()?;
        fs::write(path, serde_json::to_string_pretty(&tasks)?)?;
        info!(count = tasks.len(), path = %path.display(), "tasks exported");
        Ok(tasks.len())
    }

    /// Inserts every record from `path`, keeping its id. Records whose id is
    /// already taken are skipped. Returns the number of rows inserted.
    pub fn import_all(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Err(TaskError::ImportFileMissing(path.to_path_buf()));
        }
        let tasks: Vec<Task> = serde_json::from_slice(&fs::read(path)?)?;
        let conn = self.open()?;
        let mut inserted = 0;
        for task in &tasks {
            inserted += conn.execute(
                IMPORT_TASK,
                params![task.id, task.title, task.description, task.status.as_str()],
            )?;
        }
        info!(
            read = tasks.len(),
            inserted,
            path = %path.display(),
            "tasks imported"
        );
        Ok(inserted)
    }
}

fn parse_task(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: status
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
    })
}
