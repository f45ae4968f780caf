//! Planning operations over an injected task store
//!
//! The planner is the only place where stored records meet the scheduling
//! core. Every query reads a fresh snapshot from the store and builds a
//! throwaway [`DependencyGraph`] or [`TaskQueue`] from it; nothing is cached
//! between calls.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    sorted_by, Dependency, DependencyGraph, GraphError, NewTask, SortKey, Task, TaskId,
    TaskQueue, TaskStatus, TaskUpdate, MAX_PRIORITY, MIN_PRIORITY,
};
use crate::storage::{StoreError, TaskStore};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Invalid priority {0} (expected 1-4)")]
    InvalidPriority(u8),

    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which tasks `list_tasks` returns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Include done and won't-do tasks
    pub all: bool,

    /// Only tasks with this status (implies `all` for complete statuses)
    pub status: Option<TaskStatus>,

    /// Only tasks with this priority
    pub priority: Option<u8>,
}

impl ListFilter {
    fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        } else if !self.all && !task.is_incomplete() {
            return false;
        }

        self.priority.map_or(true, |p| task.priority == p)
    }
}

/// A task together with its neighbours in the dependency graph
#[derive(Debug, Clone, Serialize)]
pub struct DependencyView {
    pub task: Task,

    /// Tasks this task waits on
    pub dependencies: Vec<Task>,

    /// Tasks waiting on this task
    pub dependents: Vec<Task>,

    /// True when the task is incomplete and every dependency is complete
    pub ready: bool,
}

/// Orchestrates store access and the scheduling algorithms
pub struct Planner<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> Planner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Validates and stores a new task
    pub fn add_task(&mut self, task: NewTask) -> Result<Task, PlanError> {
        if task.title.trim().is_empty() {
            return Err(PlanError::EmptyTitle);
        }
        check_priority(task.priority)?;

        Ok(self.store.create_task(task)?)
    }

    /// Returns a task or `TaskNotFound`
    pub fn task(&self, id: TaskId) -> Result<Task, PlanError> {
        self.store.get_task(id)?.ok_or(PlanError::TaskNotFound(id))
    }

    /// Applies a partial update and returns the stored result
    pub fn update_task(&mut self, id: TaskId, update: &TaskUpdate) -> Result<Task, PlanError> {
        if let Some(priority) = update.priority {
            check_priority(priority)?;
        }
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(PlanError::EmptyTitle);
        }

        let mut task = self.task(id)?;
        task.apply(update);
        self.store.update_task(&task)?;
        Ok(task)
    }

    /// Sets a task's status
    pub fn set_status(&mut self, id: TaskId, status: TaskStatus) -> Result<Task, PlanError> {
        self.update_task(
            id,
            &TaskUpdate {
                status: Some(status),
                ..TaskUpdate::default()
            },
        )
    }

    /// Deletes a task and every dependency that mentions it
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task, PlanError> {
        let task = self.task(id)?;
        self.store.delete_task(id)?;
        Ok(task)
    }

    /// Lists tasks matching `filter`, ordered by `sort` with the stable merge sort
    pub fn list_tasks(&self, filter: &ListFilter, sort: SortKey) -> Result<Vec<Task>, PlanError> {
        let source = if filter.all || filter.status.is_some_and(|s| s.is_complete()) {
            self.store.list_tasks()?
        } else {
            self.store.list_incomplete_tasks()?
        };

        let tasks: Vec<Task> = source.into_iter().filter(|t| filter.matches(t)).collect();
        debug!(count = tasks.len(), sort = sort.as_str(), "sorting task listing");

        Ok(sorted_by(tasks, sort))
    }

    /// Picks the most urgent incomplete task
    ///
    /// With `ready_only`, tasks still waiting on an incomplete dependency are
    /// skipped.
    pub fn next_task(&self, ready_only: bool) -> Result<Option<Task>, PlanError> {
        let mut candidates = self.store.list_incomplete_tasks()?;

        if ready_only {
            let graph = self.full_graph()?;
            let ready = graph.ready_tasks(&statuses(&graph));
            candidates.retain(|t| ready.binary_search(&t.id).is_ok());
        }

        let mut queue: TaskQueue = candidates.into_iter().collect();
        debug!(candidates = queue.len(), ready_only, "built priority queue snapshot");

        Ok(queue.extract_min())
    }

    // ========================================================================
    // Dependencies
    // ========================================================================

    /// Records that `task` depends on `depends_on`
    ///
    /// Both tasks must exist. The edge is validated against the full graph,
    /// completed tasks included, and only persisted once accepted.
    pub fn add_dependency(&mut self, task: TaskId, depends_on: TaskId) -> Result<(), PlanError> {
        self.task(task)?;
        self.task(depends_on)?;

        let mut graph = self.full_graph()?;
        graph.add_dependency(task, depends_on)?;

        self.store.insert_dependency(Dependency::new(task, depends_on))?;
        info!(task, depends_on, "added dependency");
        Ok(())
    }

    /// Removes a dependency, returning whether it existed
    pub fn remove_dependency(&mut self, task: TaskId, depends_on: TaskId) -> Result<bool, PlanError> {
        let removed = self
            .store
            .delete_dependency(Dependency::new(task, depends_on))?;

        if removed {
            info!(task, depends_on, "removed dependency");
        }
        Ok(removed)
    }

    /// Returns a task with its dependencies, dependents and readiness
    pub fn dependencies(&self, id: TaskId) -> Result<DependencyView, PlanError> {
        let graph = self.full_graph()?;
        let task = graph
            .task(id)
            .cloned()
            .ok_or(PlanError::TaskNotFound(id))?;

        let records = |ids: Vec<TaskId>| -> Vec<Task> {
            ids.into_iter()
                .filter_map(|dep| graph.task(dep).cloned())
                .collect()
        };

        let dependencies = records(graph.dependencies(id));
        let dependents = records(graph.dependents(id));
        let ready = task.is_incomplete() && dependencies.iter().all(|d| d.status.is_complete());

        Ok(DependencyView {
            task,
            dependencies,
            dependents,
            ready,
        })
    }

    /// Orders the remaining work so that every task follows its dependencies
    ///
    /// Completed tasks and their edges are left out; they no longer constrain
    /// anything. Returns `GraphError::Cycle` if the stored edges are cyclic.
    pub fn execution_plan(&self) -> Result<Vec<Task>, PlanError> {
        let graph = self.remaining_graph()?;
        let order = graph.topological_sort()?;
        Ok(resolve(&graph, order))
    }

    /// Returns the longest chain of remaining dependent tasks
    pub fn critical_path(&self) -> Result<Vec<Task>, PlanError> {
        let graph = self.remaining_graph()?;
        let critical = graph.critical_path()?;
        Ok(resolve(&graph, critical.path))
    }

    /// Snapshot of every task and dependency row
    fn full_graph(&self) -> Result<DependencyGraph, PlanError> {
        let tasks = self.store.list_tasks()?;
        let edges = self.store.list_dependencies()?;
        Ok(DependencyGraph::from_parts(&tasks, &edges))
    }

    /// Snapshot of incomplete tasks and the edges between them
    fn remaining_graph(&self) -> Result<DependencyGraph, PlanError> {
        let tasks = self.store.list_incomplete_tasks()?;
        let open: HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();

        let edges: Vec<Dependency> = self
            .store
            .list_dependencies()?
            .into_iter()
            .filter(|d| open.contains(&d.task_id) && open.contains(&d.depends_on))
            .collect();

        Ok(DependencyGraph::from_parts(&tasks, &edges))
    }
}

fn check_priority(priority: u8) -> Result<(), PlanError> {
    if (MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        Ok(())
    } else {
        Err(PlanError::InvalidPriority(priority))
    }
}

fn statuses(graph: &DependencyGraph) -> HashMap<TaskId, TaskStatus> {
    graph
        .task_ids()
        .into_iter()
        .filter_map(|id| graph.task(id).map(|t| (id, t.status)))
        .collect()
}

fn resolve(graph: &DependencyGraph, ids: Vec<TaskId>) -> Vec<Task> {
    ids.into_iter()
        .filter_map(|id| graph.task(id).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn planner() -> Planner<MemoryStore> {
        Planner::new(MemoryStore::new())
    }

    fn ids(tasks: &[Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id).collect()
    }

    /// Tasks 1, 2, 3 with 3 -> 2 -> 1
    fn chain() -> Planner<MemoryStore> {
        let mut planner = planner();
        for title in ["Design", "Build", "Ship"] {
            planner.add_task(NewTask::new(title)).unwrap();
        }
        planner.add_dependency(2, 1).unwrap();
        planner.add_dependency(3, 2).unwrap();
        planner
    }

    #[test]
    fn round_trip_scenario() {
        let mut planner = chain();

        let err = planner.add_dependency(1, 3).unwrap_err();
        assert!(matches!(err, PlanError::Graph(GraphError::CycleDetected(1, 3))));

        assert_eq!(ids(&planner.execution_plan().unwrap()), vec![1, 2, 3]);
        assert_eq!(ids(&planner.critical_path().unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn rejected_dependency_is_not_persisted() {
        let mut planner = chain();
        let _ = planner.add_dependency(1, 3);
        let _ = planner.add_dependency(2, 2);

        assert_eq!(planner.store().list_dependencies().unwrap().len(), 2);
    }

    #[test]
    fn dependency_on_missing_task() {
        let mut planner = planner();
        planner.add_task(NewTask::new("only")).unwrap();

        let err = planner.add_dependency(1, 42).unwrap_err();
        assert!(matches!(err, PlanError::TaskNotFound(42)));
    }

    #[test]
    fn self_dependency_rejected() {
        let mut planner = planner();
        planner.add_task(NewTask::new("loop")).unwrap();

        let err = planner.add_dependency(1, 1).unwrap_err();
        assert!(matches!(err, PlanError::Graph(GraphError::SelfDependency(1))));
    }

    #[test]
    fn add_task_validation() {
        let mut planner = planner();
        assert!(matches!(
            planner.add_task(NewTask::new("x").priority(0)),
            Err(PlanError::InvalidPriority(0))
        ));
        assert!(matches!(
            planner.add_task(NewTask::new("   ")),
            Err(PlanError::EmptyTitle)
        ));
    }

    #[test]
    fn update_and_status_changes() {
        let mut planner = planner();
        planner.add_task(NewTask::new("Draft")).unwrap();

        let update = TaskUpdate {
            title: Some("Final".into()),
            priority: Some(1),
            ..TaskUpdate::default()
        };
        let task = planner.update_task(1, &update).unwrap();
        assert_eq!(task.title, "Final");
        assert_eq!(task.priority, 1);

        let task = planner.set_status(1, TaskStatus::Done).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert!(matches!(
            planner.set_status(9, TaskStatus::Done),
            Err(PlanError::TaskNotFound(9))
        ));
    }

    #[test]
    fn delete_task_drops_edges() {
        let mut planner = chain();
        planner.delete_task(2).unwrap();

        assert!(planner.store().list_dependencies().unwrap().is_empty());
        assert!(matches!(planner.task(2), Err(PlanError::TaskNotFound(2))));
    }

    #[test]
    fn listing_filters_and_sorts() {
        let mut planner = planner();
        planner.add_task(NewTask::new("low").priority(4)).unwrap();
        planner.add_task(NewTask::new("urgent").priority(1)).unwrap();
        planner
            .add_task(NewTask::new("finished").priority(1).status(TaskStatus::Done))
            .unwrap();

        let open = planner
            .list_tasks(&ListFilter::default(), SortKey::Priority)
            .unwrap();
        assert_eq!(ids(&open), vec![2, 1]);

        let all = planner
            .list_tasks(&ListFilter { all: true, ..ListFilter::default() }, SortKey::Id)
            .unwrap();
        assert_eq!(ids(&all), vec![1, 2, 3]);

        let done = planner
            .list_tasks(
                &ListFilter {
                    status: Some(TaskStatus::Done),
                    ..ListFilter::default()
                },
                SortKey::Id,
            )
            .unwrap();
        assert_eq!(ids(&done), vec![3]);

        let p1 = planner
            .list_tasks(
                &ListFilter {
                    all: true,
                    priority: Some(1),
                    ..ListFilter::default()
                },
                SortKey::Id,
            )
            .unwrap();
        assert_eq!(ids(&p1), vec![2, 3]);
    }

    #[test]
    fn next_task_by_priority_then_due() {
        let mut planner = planner();
        let later = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        let sooner = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        planner.add_task(NewTask::new("p2").priority(2)).unwrap();
        planner
            .add_task(NewTask::new("p1 later").priority(1).due(Some(later)))
            .unwrap();
        planner
            .add_task(NewTask::new("p1 sooner").priority(1).due(Some(sooner)))
            .unwrap();

        let next = planner.next_task(false).unwrap().unwrap();
        assert_eq!(next.title, "p1 sooner");
    }

    #[test]
    fn next_task_ready_only_skips_blocked() {
        let mut planner = planner();
        planner.add_task(NewTask::new("base").priority(3)).unwrap();
        planner.add_task(NewTask::new("urgent but blocked").priority(1)).unwrap();
        planner.add_dependency(2, 1).unwrap();

        assert_eq!(planner.next_task(false).unwrap().unwrap().id, 2);
        assert_eq!(planner.next_task(true).unwrap().unwrap().id, 1);

        planner.set_status(1, TaskStatus::Done).unwrap();
        assert_eq!(planner.next_task(true).unwrap().unwrap().id, 2);
    }

    #[test]
    fn next_task_empty() {
        let planner = planner();
        assert!(planner.next_task(false).unwrap().is_none());
        assert!(planner.next_task(true).unwrap().is_none());
    }

    #[test]
    fn dependency_view() {
        let mut planner = chain();
        planner.set_status(1, TaskStatus::Done).unwrap();

        let view = planner.dependencies(2).unwrap();
        assert_eq!(view.task.id, 2);
        assert_eq!(ids(&view.dependencies), vec![1]);
        assert_eq!(ids(&view.dependents), vec![3]);
        assert!(view.ready);

        let view = planner.dependencies(3).unwrap();
        assert!(!view.ready);

        assert!(matches!(
            planner.dependencies(99),
            Err(PlanError::TaskNotFound(99))
        ));
    }

    #[test]
    fn plan_skips_completed_work() {
        let mut planner = chain();
        planner.set_status(1, TaskStatus::Done).unwrap();

        assert_eq!(ids(&planner.execution_plan().unwrap()), vec![2, 3]);
        assert_eq!(ids(&planner.critical_path().unwrap()), vec![2, 3]);
    }

    #[test]
    fn empty_plan() {
        let planner = planner();
        assert!(planner.execution_plan().unwrap().is_empty());
        assert!(planner.critical_path().unwrap().is_empty());
    }

    #[test]
    fn cyclic_store_data_is_reported() {
        let mut store = MemoryStore::new();
        for title in ["a", "b"] {
            store.create_task(NewTask::new(title)).unwrap();
        }
        store.insert_dependency(Dependency::new(1, 2)).unwrap();
        store.insert_dependency(Dependency::new(2, 1)).unwrap();

        let planner = Planner::new(store);
        assert!(matches!(
            planner.execution_plan(),
            Err(PlanError::Graph(GraphError::Cycle(_)))
        ));
        assert!(matches!(
            planner.critical_path(),
            Err(PlanError::Graph(GraphError::Cycle(_)))
        ));
    }
}
