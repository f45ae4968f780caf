//! In-memory task store

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;

use super::store::{StoreError, TaskStore};
use crate::domain::{Dependency, NewTask, Task, TaskId};

/// Task store that keeps everything in ordered maps
///
/// Ids are assigned from 1 upward and never reused, mirroring the SQLite
/// store's `AUTOINCREMENT` column.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: BTreeMap<TaskId, Task>,
    dependencies: BTreeSet<Dependency>,
    last_id: TaskId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryStore {
    fn create_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        self.last_id += 1;

        let created = Task {
            id: self.last_id,
            title: task.title,
            priority: task.priority,
            status: task.status,
            due: task.due,
            created_at: Utc::now(),
            owner_id: None,
        };

        self.tasks.insert(created.id, created.clone());
        Ok(created)
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.get(&id).cloned())
    }

    fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.values().cloned().collect())
    }

    fn update_task(&mut self, task: &Task) -> Result<(), StoreError> {
        let stored = self
            .tasks
            .get_mut(&task.id)
            .ok_or(StoreError::NotFound(task.id))?;

        stored.title = task.title.clone();
        stored.priority = task.priority;
        stored.status = task.status;
        stored.due = task.due;
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> Result<bool, StoreError> {
        self.dependencies
            .retain(|dep| dep.task_id != id && dep.depends_on != id);
        Ok(self.tasks.remove(&id).is_some())
    }

    fn list_dependencies(&self) -> Result<Vec<Dependency>, StoreError> {
        Ok(self.dependencies.iter().copied().collect())
    }

    fn insert_dependency(&mut self, dependency: Dependency) -> Result<(), StoreError> {
        self.dependencies.insert(dependency);
        Ok(())
    }

    fn delete_dependency(&mut self, dependency: Dependency) -> Result<bool, StoreError> {
        Ok(self.dependencies.remove(&dependency))
    }
}
