//! SQLite task store
//!
//! Tables follow the task manager's relational layout:
//! `tasks(id, title, priority, status, dueDate, creationTime, ownerId)` and
//! `task_dependencies(taskId, dependsOnTaskId)`. Timestamps are unix seconds;
//! a `dueDate` of 0 means no due date.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::store::{StoreError, TaskStore};
use crate::domain::{Dependency, NewTask, Task, TaskId, TaskStatus};

const TASK_COLUMNS: &str = "id, title, priority, status, dueDate, creationTime, ownerId";

/// Task store backed by a SQLite database
pub struct SqliteStore {
    /// Path to the SQLite database, `None` for in-memory stores
    db_path: Option<PathBuf>,

    /// Database connection
    conn: Connection,
}

/// A `tasks` row before validation
struct TaskRow {
    id: TaskId,
    title: String,
    priority: i64,
    status: i64,
    due_date: i64,
    creation_time: i64,
    owner_id: Option<i64>,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            priority: row.get(2)?,
            status: row.get(3)?,
            due_date: row.get(4)?,
            creation_time: row.get(5)?,
            owner_id: row.get(6)?,
        })
    }

    fn into_task(self) -> Result<Task, StoreError> {
        let id = self.id;
        let corrupt = move |reason: String| StoreError::Corrupt { id, reason };

        let priority = u8::try_from(self.priority)
            .map_err(|_| corrupt(format!("priority {} out of range", self.priority)))?;
        let status = TaskStatus::from_code(self.status)
            .ok_or_else(|| corrupt(format!("unknown status code {}", self.status)))?;
        let due = match self.due_date {
            0 => None,
            secs => Some(
                DateTime::from_timestamp(secs, 0)
                    .ok_or_else(|| corrupt(format!("invalid due date {}", secs)))?,
            ),
        };
        let created_at = DateTime::from_timestamp(self.creation_time, 0)
            .ok_or_else(|| corrupt(format!("invalid creation time {}", self.creation_time)))?;

        Ok(Task {
            id: self.id,
            title: self.title,
            priority,
            status,
            due,
            created_at,
            owner_id: self.owner_id,
        })
    }
}

fn due_to_column(due: Option<DateTime<Utc>>) -> i64 {
    due.map_or(0, |d| d.timestamp())
}

impl SqliteStore {
    /// Schema version - bump when schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened task database");

        // WAL for better concurrent access from several shells
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let store = Self { db_path, conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Ensures the schema is up to date
    fn ensure_schema(&self) -> Result<(), StoreError> {
        let current_version = self.schema_version()?;

        if current_version > Self::SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: current_version,
                supported: Self::SCHEMA_VERSION,
            });
        }

        if current_version < Self::SCHEMA_VERSION {
            self.create_schema()?;
        }

        Ok(())
    }

    /// Gets the current schema version
    fn schema_version(&self) -> Result<i32, StoreError> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 2,
                status INTEGER NOT NULL DEFAULT 0,
                dueDate INTEGER NOT NULL DEFAULT 0,
                creationTime INTEGER NOT NULL,
                ownerId INTEGER
            );

            CREATE TABLE IF NOT EXISTS task_dependencies (
                taskId INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                dependsOnTaskId INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                PRIMARY KEY (taskId, dependsOnTaskId)
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_deps_depends_on ON task_dependencies(dependsOnTaskId);
            ",
        )?;

        self.conn.execute_batch(&format!(
            "PRAGMA user_version = {}",
            Self::SCHEMA_VERSION
        ))?;

        debug!(version = Self::SCHEMA_VERSION, "created task schema");
        Ok(())
    }

    /// Returns the path to the database, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn query_tasks(&self, sql: &str) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], TaskRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }
}

impl TaskStore for SqliteStore {
    fn create_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        let now = Utc::now().timestamp();

        self.conn.execute(
            "INSERT INTO tasks (title, priority, status, dueDate, creationTime)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.title,
                task.priority,
                task.status.code(),
                due_to_column(task.due),
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, title = %task.title, "created task");

        self.get_task(id)?.ok_or(StoreError::NotFound(id))
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![id],
                TaskRow::from_row,
            )
            .optional()?;

        row.map(TaskRow::into_task).transpose()
    }

    fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.query_tasks(&format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS))
    }

    fn list_incomplete_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.query_tasks(&format!(
            "SELECT {} FROM tasks WHERE status IN (0, 1) ORDER BY id",
            TASK_COLUMNS
        ))
    }

    fn update_task(&mut self, task: &Task) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?1, priority = ?2, status = ?3, dueDate = ?4
             WHERE id = ?5",
            params![
                task.title,
                task.priority,
                task.status.code(),
                due_to_column(task.due),
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(task.id));
        }

        info!(id = task.id, "updated task");
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM task_dependencies WHERE taskId = ?1 OR dependsOnTaskId = ?1",
            params![id],
        )?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;

        tx.commit()?;

        if deleted > 0 {
            info!(id, "deleted task");
        }
        Ok(deleted > 0)
    }

    fn list_dependencies(&self) -> Result<Vec<Dependency>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT taskId, dependsOnTaskId FROM task_dependencies
             ORDER BY taskId, dependsOnTaskId",
        )?;

        let deps = stmt
            .query_map([], |row| Ok(Dependency::new(row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(deps)
    }

    fn insert_dependency(&mut self, dependency: Dependency) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO task_dependencies (taskId, dependsOnTaskId) VALUES (?1, ?2)",
            params![dependency.task_id, dependency.depends_on],
        )?;

        info!(%dependency, "stored dependency");
        Ok(())
    }

    fn delete_dependency(&mut self, dependency: Dependency) -> Result<bool, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM task_dependencies WHERE taskId = ?1 AND dependsOnTaskId = ?2",
            params![dependency.task_id, dependency.depends_on],
        )?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_store_creation_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cascade.db");

        let store = SqliteStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn test_schema_version() {
        let store = store();
        assert_eq!(store.schema_version().unwrap(), SqliteStore::SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cascade.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.create_task(NewTask::new("Persist me")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let tasks = store.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Persist me");
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cascade.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("PRAGMA user_version = 99").unwrap();
        }

        let result = SqliteStore::open(&path);
        assert!(matches!(
            result,
            Err(StoreError::UnsupportedSchema { found: 99, .. })
        ));
    }

    #[test]
    fn test_create_and_get() {
        let mut store = store();
        let due = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();

        let task = store
            .create_task(NewTask::new("Book flights").priority(1).due(Some(due)))
            .unwrap();

        assert!(task.id > 0);
        assert_eq!(task.priority, 1);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.due, Some(due));

        let fetched = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(fetched, task);
        assert!(store.get_task(task.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_parsed_due_dates_survive_storage() {
        let mut store = store();
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();

        // The earliest date parse_due accepts must not collide with the unset sentinel
        assert!(crate::domain::parse_due("1970-01-01", now).is_err());
        let due = crate::domain::parse_due("1970-01-02", now).unwrap();

        let task = store
            .create_task(NewTask::new("Ancient").due(due))
            .unwrap();
        assert_eq!(task.due, due);
        assert!(task.due.is_some());
    }

    #[test]
    fn test_incomplete_tasks() {
        let mut store = store();
        store.create_task(NewTask::new("a")).unwrap();
        store
            .create_task(NewTask::new("b").status(TaskStatus::InProgress))
            .unwrap();
        store
            .create_task(NewTask::new("c").status(TaskStatus::Done))
            .unwrap();
        store
            .create_task(NewTask::new("d").status(TaskStatus::WontDo))
            .unwrap();

        let titles: Vec<_> = store
            .list_incomplete_tasks()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(store.list_tasks().unwrap().len(), 4);
    }

    #[test]
    fn test_update() {
        let mut store = store();
        let mut task = store.create_task(NewTask::new("Draft")).unwrap();

        task.title = "Final".to_string();
        task.status = TaskStatus::Done;
        task.due = None;
        store.update_task(&task).unwrap();

        let fetched = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Final");
        assert_eq!(fetched.status, TaskStatus::Done);

        let missing = Task::new(404, "ghost");
        assert!(matches!(store.update_task(&missing), Err(StoreError::NotFound(404))));
    }

    #[test]
    fn test_dependencies() {
        let mut store = store();
        let a = store.create_task(NewTask::new("a")).unwrap();
        let b = store.create_task(NewTask::new("b")).unwrap();

        store.insert_dependency(Dependency::new(b.id, a.id)).unwrap();
        // Duplicate rows are ignored
        store.insert_dependency(Dependency::new(b.id, a.id)).unwrap();

        assert_eq!(store.list_dependencies().unwrap(), vec![Dependency::new(b.id, a.id)]);

        assert!(store.delete_dependency(Dependency::new(b.id, a.id)).unwrap());
        assert!(!store.delete_dependency(Dependency::new(b.id, a.id)).unwrap());
        assert!(store.list_dependencies().unwrap().is_empty());
    }

    #[test]
    fn test_delete_task_removes_dependency_rows() {
        let mut store = store();
        let a = store.create_task(NewTask::new("a")).unwrap();
        let b = store.create_task(NewTask::new("b")).unwrap();
        let c = store.create_task(NewTask::new("c")).unwrap();
        store.insert_dependency(Dependency::new(b.id, a.id)).unwrap();
        store.insert_dependency(Dependency::new(c.id, b.id)).unwrap();

        assert!(store.delete_task(b.id).unwrap());
        assert!(store.list_dependencies().unwrap().is_empty());
        assert!(!store.delete_task(b.id).unwrap());
        assert_eq!(store.list_tasks().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let store = store();
        store
            .conn
            .execute(
                "INSERT INTO tasks (title, priority, status, dueDate, creationTime) VALUES ('x', 2, 9, 0, 0)",
                [],
            )
            .unwrap();

        assert!(matches!(store.list_tasks(), Err(StoreError::Corrupt { .. })));
    }
}
