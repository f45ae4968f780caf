//! Task comparators
//!
//! Every comparator is a "strictly before" predicate: `cmp(a, b)` is true
//! when `a` must be placed before `b`. They are total over the task record
//! and form strict weak orderings, which both the merge sort and the
//! priority queue rely on.

use serde::{Deserialize, Serialize};

use super::task::Task;

/// A "strictly before" predicate over two tasks
pub type Comparator = fn(&Task, &Task) -> bool;

pub fn by_priority(a: &Task, b: &Task) -> bool {
    a.priority < b.priority
}

/// Unset due dates sort before every set date
pub fn by_due_date(a: &Task, b: &Task) -> bool {
    a.due < b.due
}

pub fn by_priority_then_due_date(a: &Task, b: &Task) -> bool {
    (a.priority, a.due) < (b.priority, b.due)
}

pub fn by_due_date_then_priority(a: &Task, b: &Task) -> bool {
    (a.due, a.priority) < (b.due, b.priority)
}

pub fn by_id(a: &Task, b: &Task) -> bool {
    a.id < b.id
}

pub fn by_status(a: &Task, b: &Task) -> bool {
    a.status < b.status
}

pub fn by_created_at(a: &Task, b: &Task) -> bool {
    a.created_at < b.created_at
}

/// Heap ordering used to pick the next task to work on
///
/// Priority first, then due date, then id so that exact ties still have a
/// reproducible order.
pub fn outranks(a: &Task, b: &Task) -> bool {
    (a.priority, a.due, a.id) < (b.priority, b.due, b.id)
}

/// User-facing sort keys for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    Priority,
    Due,
    #[default]
    PriorityDue,
    DuePriority,
    Id,
    Status,
    Created,
}

impl SortKey {
    /// Returns the comparator implementing this key
    pub fn comparator(&self) -> Comparator {
        match self {
            SortKey::Priority => by_priority,
            SortKey::Due => by_due_date,
            SortKey::PriorityDue => by_priority_then_due_date,
            SortKey::DuePriority => by_due_date_then_priority,
            SortKey::Id => by_id,
            SortKey::Status => by_status,
            SortKey::Created => by_created_at,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Priority => "priority",
            SortKey::Due => "due",
            SortKey::PriorityDue => "priority-due",
            SortKey::DuePriority => "due-priority",
            SortKey::Id => "id",
            SortKey::Status => "status",
            SortKey::Created => "created",
        }
    }
}
