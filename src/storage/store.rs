//! The task store interface
//!
//! The scheduling core never touches a store; the planner receives one
//! explicitly and reads a consistent snapshot of tasks and dependency rows
//! before every query.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{Dependency, NewTask, Task, TaskId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Corrupt task row {id}: {reason}")]
    Corrupt { id: TaskId, reason: String },

    #[error("Database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },

    #[error("Failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Persistent collection of tasks and dependency rows
pub trait TaskStore {
    /// Stores a new task and returns it with its assigned id
    fn create_task(&mut self, task: NewTask) -> Result<Task, StoreError>;

    /// Returns the task with `id`, if any
    fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Returns every task in id order
    fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Returns todo and in-progress tasks in id order
    fn list_incomplete_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .list_tasks()?
            .into_iter()
            .filter(Task::is_incomplete)
            .collect())
    }

    /// Overwrites the stored fields of an existing task
    fn update_task(&mut self, task: &Task) -> Result<(), StoreError>;

    /// Deletes a task together with every dependency row that mentions it
    fn delete_task(&mut self, id: TaskId) -> Result<bool, StoreError>;

    /// Returns every dependency row
    fn list_dependencies(&self) -> Result<Vec<Dependency>, StoreError>;

    /// Persists an accepted dependency; inserting an existing row is a no-op
    fn insert_dependency(&mut self, dependency: Dependency) -> Result<(), StoreError>;

    /// Removes a dependency row, returning whether it existed
    fn delete_dependency(&mut self, dependency: Dependency) -> Result<bool, StoreError>;
}
