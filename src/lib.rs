//! Cascade - a task manager with dependency-aware planning
//!
//! Tasks may depend on one another. The [`domain`] core keeps those
//! dependencies as a directed acyclic graph and derives scheduling
//! information from it: cycle prevention, an execution order and the
//! critical path. A binary min-heap picks the next task to work on and a
//! stable merge sort orders listings. The [`planner`] feeds both from an
//! injected [`storage::TaskStore`].

pub mod domain;
pub mod storage;
pub mod planner;
pub mod cli;
pub mod logging;

pub use domain::{DependencyGraph, Task, TaskId, TaskQueue, TaskStatus};
pub use planner::{PlanError, Planner};
