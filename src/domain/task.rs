//! Task domain model
//!
//! Tasks are owned by the store. The scheduling algorithms treat them as
//! immutable values for the duration of a query and only ever inspect
//! `id`, `priority`, `status`, `due` and (for listings) `created_at`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a task, assigned by the store
pub type TaskId = i64;

/// Most urgent priority
pub const MIN_PRIORITY: u8 = 1;

/// Least urgent priority
pub const MAX_PRIORITY: u8 = 4;

/// Priority given to tasks created without one
pub const DEFAULT_PRIORITY: u8 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum StatusError {
    #[error("Unknown task status '{0}' (expected todo, in_progress, done or wont_do)")]
    Unknown(String),
}

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    WontDo,
}

impl TaskStatus {
    /// Returns true if the task needs no further work
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::WontDo)
    }

    /// Returns true if this task is not yet started
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::Todo)
    }

    /// Returns true if this task is currently being worked on
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::InProgress)
    }

    /// Integer code used by the store
    pub fn code(&self) -> i64 {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
            TaskStatus::WontDo => 3,
        }
    }

    /// Decodes the store's integer code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Todo),
            1 => Some(TaskStatus::InProgress),
            2 => Some(TaskStatus::Done),
            3 => Some(TaskStatus::WontDo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::WontDo => "wont_do",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "0" => Ok(TaskStatus::Todo),
            "in_progress" | "in-progress" | "1" => Ok(TaskStatus::InProgress),
            "done" | "complete" | "2" => Ok(TaskStatus::Done),
            "wont_do" | "wont-do" | "3" => Ok(TaskStatus::WontDo),
            other => Err(StatusError::Unknown(other.to_string())),
        }
    }
}

/// A task as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title
    pub title: String,

    /// Urgency, lower is more urgent
    pub priority: u8,

    /// Current status
    pub status: TaskStatus,

    /// Due date, if one was set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// Owning user, carried for the store but never inspected here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
}

impl Task {
    /// Creates a todo task with default priority and no due date
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            priority: DEFAULT_PRIORITY,
            status: TaskStatus::Todo,
            due: None,
            created_at: Utc::now(),
            owner_id: None,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due(mut self, due: Option<DateTime<Utc>>) -> Self {
        self.due = due;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns true if the task still needs work
    pub fn is_incomplete(&self) -> bool {
        !self.status.is_complete()
    }

    /// Transitions to in_progress status
    pub fn start(&mut self) {
        if self.status == TaskStatus::Todo {
            self.status = TaskStatus::InProgress;
        }
    }

    /// Transitions to done status
    pub fn complete(&mut self) {
        self.status = TaskStatus::Done;
    }

    /// Applies every field set in `update`
    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(due) = update.due {
            self.due = due;
        }
    }
}

/// Fields for a task that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub priority: u8,
    pub status: TaskStatus,
    pub due: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: DEFAULT_PRIORITY,
            status: TaskStatus::Todo,
            due: None,
        }
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn due(mut self, due: Option<DateTime<Utc>>) -> Self {
        self.due = due;
        self
    }
}

/// A partial change to a stored task
///
/// `due: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub priority: Option<u8>,
    pub status: Option<TaskStatus>,
    pub due: Option<Option<DateTime<Utc>>>,
}

impl TaskUpdate {
    /// Returns true if no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.priority.is_none() && self.status.is_none() && self.due.is_none()
    }
}

/// Dependency edge: `task_id` cannot be ready until `depends_on` is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub task_id: TaskId,
    pub depends_on: TaskId,
}

impl Dependency {
    pub fn new(task_id: TaskId, depends_on: TaskId) -> Self {
        Self { task_id, depends_on }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.task_id, self.depends_on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_has_todo_status() {
        let task = Task::new(1, "Write report");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, DEFAULT_PRIORITY);
        assert!(task.status.is_pending());
        assert!(task.due.is_none());
    }

    #[test]
    fn task_status_transitions() {
        let mut task = Task::new(1, "Write report");

        task.start();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.status.is_active());

        task.complete();
        assert_eq!(task.status, TaskStatus::Done);
        assert!(!task.is_incomplete());

        // start only moves tasks out of todo
        task.start();
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn wont_do_counts_as_complete() {
        assert!(TaskStatus::WontDo.is_complete());
        assert!(TaskStatus::Done.is_complete());
        assert!(!TaskStatus::InProgress.is_complete());
        assert!(!TaskStatus::Todo.is_complete());
    }

    #[test]
    fn status_codes_match_store() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done, TaskStatus::WontDo] {
            assert_eq!(TaskStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(TaskStatus::from_code(7), None);
    }

    #[test]
    fn parse_status() {
        assert_eq!("todo".parse::<TaskStatus>(), Ok(TaskStatus::Todo));
        assert_eq!("In_Progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("complete".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert_eq!("3".parse::<TaskStatus>(), Ok(TaskStatus::WontDo));
        assert!(matches!("later".parse::<TaskStatus>(), Err(StatusError::Unknown(_))));
    }

    #[test]
    fn apply_update() {
        let mut task = Task::new(4, "Old").with_due(Some(Utc::now()));
        let update = TaskUpdate {
            title: Some("New".into()),
            priority: Some(1),
            status: None,
            due: Some(None),
        };
        assert!(!update.is_empty());

        task.apply(&update);
        assert_eq!(task.title, "New");
        assert_eq!(task.priority, 1);
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.due.is_none());
    }

    #[test]
    fn empty_update() {
        assert!(TaskUpdate::default().is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let task = Task::new(9, "Ship it").with_priority(1).with_status(TaskStatus::InProgress);

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"in_progress\""));
        let parsed: Task = serde_json::from_str(&json).unwrap();

        assert_eq!(task, parsed);
    }

    #[test]
    fn dependency_display() {
        assert_eq!(Dependency::new(3, 2).to_string(), "3 -> 2");
    }
}
