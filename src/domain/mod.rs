//! Domain models for Cascade
//!
//! Contains the scheduling core without any I/O concerns: the dependency
//! graph engine, the priority queue, the stable sort and the comparators
//! they share.

mod task;
mod compare;
mod sort;
mod queue;
mod graph;
mod due;

pub use task::{
    Dependency, NewTask, StatusError, Task, TaskId, TaskStatus, TaskUpdate, DEFAULT_PRIORITY,
    MAX_PRIORITY, MIN_PRIORITY,
};
pub use compare::{
    by_created_at, by_due_date, by_due_date_then_priority, by_id, by_priority,
    by_priority_then_due_date, by_status, outranks, Comparator, SortKey,
};
pub use sort::{merge_sort, sorted_by};
pub use queue::TaskQueue;
pub use graph::{CriticalPath, CycleReport, DependencyGraph, GraphError};
pub use due::{format_due, parse_due, DueDateError};
