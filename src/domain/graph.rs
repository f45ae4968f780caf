//! Dependency graph for tasks
//!
//! Keeps two mirrored adjacency views: forward (`task -> tasks it depends on`)
//! and reverse (`task -> tasks that depend on it`). An edge is present in one
//! view if and only if its mirror is present in the other. Ordered maps keep
//! every traversal, and therefore every plan, reproducible.
//!
//! The graph is a per-query snapshot: callers rebuild it from the store,
//! ask their question and drop it. Traversals use explicit stacks so deep
//! dependency chains cannot exhaust the call stack.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use thiserror::Error;
use tracing::{debug, trace};

use super::task::{Dependency, Task, TaskId, TaskStatus};

static NO_EDGES: BTreeSet<TaskId> = BTreeSet::new();

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Adding dependency would create a cycle: {0} -> {1}")]
    CycleDetected(TaskId, TaskId),

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(TaskId),

    #[error("Dependency graph contains a cycle: {}", format_path(.0))]
    Cycle(Vec<TaskId>),
}

fn format_path(path: &[TaskId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Outcome of a full-graph cycle scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The cyclic walk, first node repeated at the end; empty when acyclic
    pub cycle: Vec<TaskId>,
}

impl CycleReport {
    pub fn has_cycle(&self) -> bool {
        !self.cycle.is_empty()
    }
}

/// Longest chain of dependency-linked tasks, dependencies first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriticalPath {
    pub path: Vec<TaskId>,
}

impl CriticalPath {
    /// Number of tasks on the path
    pub fn length(&self) -> usize {
        self.path.len()
    }

    /// True when the path links at least two tasks
    pub fn has_chain(&self) -> bool {
        self.path.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A dependency graph for tasks
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// task -> tasks it depends on
    forward: BTreeMap<TaskId, BTreeSet<TaskId>>,

    /// task -> tasks that depend on it
    reverse: BTreeMap<TaskId, BTreeSet<TaskId>>,

    /// Optional task records attached to nodes
    tasks: BTreeMap<TaskId, Task>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from store records
    ///
    /// Edges are loaded as-is; use [`detect_cycle`](Self::detect_cycle) to
    /// validate data that did not pass through [`add_dependency`](Self::add_dependency).
    pub fn from_parts<'a>(
        tasks: impl IntoIterator<Item = &'a Task>,
        edges: impl IntoIterator<Item = &'a Dependency>,
    ) -> Self {
        let mut graph = Self::new();
        for task in tasks {
            graph.add_task_record(task.clone());
        }
        graph.load_dependencies(edges);
        debug!(
            tasks = graph.len(),
            dependencies = graph.dependency_count(),
            "built dependency graph snapshot"
        );
        graph
    }

    /// Ensures a node exists for `task_id`
    pub fn add_task(&mut self, task_id: TaskId) {
        self.forward.entry(task_id).or_default();
        self.reverse.entry(task_id).or_default();
    }

    /// Ensures a node exists and attaches the task record to it
    pub fn add_task_record(&mut self, task: Task) {
        self.add_task(task.id);
        self.tasks.insert(task.id, task);
    }

    /// Returns the record attached to a node, if any
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    /// Removes a task and every edge touching it
    pub fn remove_task(&mut self, task_id: TaskId) -> bool {
        let Some(dependencies) = self.forward.remove(&task_id) else {
            return false;
        };

        for dependency in &dependencies {
            if let Some(dependents) = self.reverse.get_mut(dependency) {
                dependents.remove(&task_id);
            }
        }

        if let Some(dependents) = self.reverse.remove(&task_id) {
            for dependent in &dependents {
                if let Some(deps) = self.forward.get_mut(dependent) {
                    deps.remove(&task_id);
                }
            }
        }

        self.tasks.remove(&task_id);
        true
    }

    /// Adds a dependency edge: `task` depends on `depends_on`
    ///
    /// Both endpoints are created if missing. An edge that would close a
    /// cycle is rejected and the edge set is left untouched.
    pub fn add_dependency(&mut self, task: TaskId, depends_on: TaskId) -> Result<(), GraphError> {
        self.add_task(task);
        self.add_task(depends_on);

        if task == depends_on {
            debug!(task, "rejected self-dependency");
            return Err(GraphError::SelfDependency(task));
        }

        if self.would_create_cycle(task, depends_on) {
            debug!(task, depends_on, "rejected dependency that would close a cycle");
            return Err(GraphError::CycleDetected(task, depends_on));
        }

        self.insert_edge(task, depends_on);
        Ok(())
    }

    /// Removes a dependency edge from both views
    pub fn remove_dependency(&mut self, task: TaskId, depends_on: TaskId) -> bool {
        let removed = self
            .forward
            .get_mut(&task)
            .is_some_and(|deps| deps.remove(&depends_on));

        if let Some(dependents) = self.reverse.get_mut(&depends_on) {
            dependents.remove(&task);
        }

        removed
    }

    /// Loads edges without cycle checks, creating endpoints as needed
    pub fn load_dependencies<'a>(&mut self, edges: impl IntoIterator<Item = &'a Dependency>) {
        for edge in edges {
            self.add_task(edge.task_id);
            self.add_task(edge.depends_on);
            self.insert_edge(edge.task_id, edge.depends_on);
        }
    }

    /// Removes every node, edge and record
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
        self.tasks.clear();
    }

    fn insert_edge(&mut self, task: TaskId, depends_on: TaskId) {
        self.forward.entry(task).or_default().insert(depends_on);
        self.reverse.entry(depends_on).or_default().insert(task);
    }

    fn forward_edges(&self, task_id: TaskId) -> &BTreeSet<TaskId> {
        self.forward.get(&task_id).unwrap_or(&NO_EDGES)
    }

    fn reverse_edges(&self, task_id: TaskId) -> &BTreeSet<TaskId> {
        self.reverse.get(&task_id).unwrap_or(&NO_EDGES)
    }

    /// Returns true if the graph contains the task
    pub fn has_task(&self, task_id: TaskId) -> bool {
        self.forward.contains_key(&task_id)
    }

    /// Returns true if `task` directly depends on `depends_on`
    pub fn has_dependency(&self, task: TaskId, depends_on: TaskId) -> bool {
        self.forward_edges(task).contains(&depends_on)
    }

    /// Returns the direct dependencies of a task
    pub fn dependencies(&self, task_id: TaskId) -> Vec<TaskId> {
        self.forward_edges(task_id).iter().copied().collect()
    }

    /// Returns the direct dependents of a task (tasks that depend on it)
    pub fn dependents(&self, task_id: TaskId) -> Vec<TaskId> {
        self.reverse_edges(task_id).iter().copied().collect()
    }

    /// Returns all task IDs in ascending order
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.forward.keys().copied().collect()
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Returns the number of dependency edges
    pub fn dependency_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Returns true if adding `task -> depends_on` would close a cycle
    ///
    /// That is the case for a self-loop, or when `depends_on` already
    /// depends on `task`, directly or transitively.
    pub fn would_create_cycle(&self, task: TaskId, depends_on: TaskId) -> bool {
        if task == depends_on {
            return true;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([depends_on]);

        while let Some(current) = queue.pop_front() {
            if current == task {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for &next in self.forward_edges(current) {
                if !visited.contains(&next) {
                    queue.push_back(next);
                }
            }
        }

        false
    }

    /// Scans the whole graph for a cycle
    ///
    /// Three-colour depth-first search from every unvisited node. On the
    /// first back edge the reported cycle runs from the revisited node
    /// through the current DFS path and back to the revisited node.
    pub fn detect_cycle(&self) -> CycleReport {
        let mut colors: HashMap<TaskId, Color> =
            self.forward.keys().map(|&id| (id, Color::White)).collect();
        let mut path: Vec<TaskId> = Vec::new();

        for &root in self.forward.keys() {
            if colors.get(&root) != Some(&Color::White) {
                continue;
            }

            colors.insert(root, Color::Gray);
            path.push(root);
            let mut stack = vec![(root, self.forward_edges(root).iter())];

            loop {
                let Some((node, neighbors)) = stack.last_mut() else {
                    break;
                };
                let node = *node;
                let next = neighbors.next().copied();

                match next {
                    Some(next) => match colors.get(&next).copied().unwrap_or(Color::White) {
                        Color::Gray => {
                            let start = path.iter().position(|&id| id == next).unwrap_or(0);
                            let mut cycle = path[start..].to_vec();
                            cycle.push(next);
                            trace!(?cycle, "back edge found");
                            return CycleReport { cycle };
                        }
                        Color::White => {
                            colors.insert(next, Color::Gray);
                            path.push(next);
                            stack.push((next, self.forward_edges(next).iter()));
                        }
                        Color::Black => {}
                    },
                    None => {
                        colors.insert(node, Color::Black);
                        path.pop();
                        stack.pop();
                    }
                }
            }
        }

        CycleReport::default()
    }

    /// Returns every task ordered so that dependencies come before dependents
    ///
    /// Kahn's algorithm, where a task's in-degree is its number of
    /// unsatisfied dependencies. Among simultaneously ready tasks the lower
    /// id goes first. An empty graph yields an empty order; a cyclic graph
    /// yields [`GraphError::Cycle`] naming one cycle.
    pub fn topological_sort(&self) -> Result<Vec<TaskId>, GraphError> {
        let mut remaining: HashMap<TaskId, usize> = self
            .forward
            .iter()
            .map(|(&id, deps)| (id, deps.len()))
            .collect();

        let mut ready: VecDeque<TaskId> = self
            .forward
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(&id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.forward.len());

        while let Some(current) = ready.pop_front() {
            order.push(current);

            for &dependent in self.reverse_edges(current) {
                if let Some(count) = remaining.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(dependent);
                    }
                }
            }
        }

        if order.len() != self.forward.len() {
            return Err(GraphError::Cycle(self.detect_cycle().cycle));
        }

        Ok(order)
    }

    /// Returns the longest chain of dependency-linked tasks
    ///
    /// Length is counted in tasks. For every node the longest chain that
    /// starts there is computed once over the reverse edges (dependency
    /// toward dependents) together with the next hop achieving it; ties keep
    /// the first candidate seen. The result starts at the first node that
    /// reaches the global maximum.
    pub fn critical_path(&self) -> Result<CriticalPath, GraphError> {
        let report = self.detect_cycle();
        if report.has_cycle() {
            return Err(GraphError::Cycle(report.cycle));
        }

        let mut memo: HashMap<TaskId, usize> = HashMap::with_capacity(self.forward.len());
        let mut next_hop: HashMap<TaskId, TaskId> = HashMap::new();
        let mut best_start: Option<TaskId> = None;
        let mut best_length = 0;

        for &root in self.forward.keys() {
            if !memo.contains_key(&root) {
                self.longest_chain_from(root, &mut memo, &mut next_hop);
            }

            let length = memo.get(&root).copied().unwrap_or(1);
            if length > best_length {
                best_length = length;
                best_start = Some(root);
            }
        }

        let mut path = Vec::with_capacity(best_length);
        let mut current = best_start;
        while let Some(id) = current {
            if path.len() == self.forward.len() {
                break;
            }
            path.push(id);
            current = next_hop.get(&id).copied();
        }

        Ok(CriticalPath { path })
    }

    /// Post-order walk over dependents filling `memo` and `next_hop`
    fn longest_chain_from(
        &self,
        root: TaskId,
        memo: &mut HashMap<TaskId, usize>,
        next_hop: &mut HashMap<TaskId, TaskId>,
    ) {
        let mut stack = vec![(root, false)];

        while let Some((node, expanded)) = stack.pop() {
            if memo.contains_key(&node) {
                continue;
            }

            let dependents = self.reverse_edges(node);

            if !expanded {
                stack.push((node, true));
                for &dependent in dependents.iter().rev() {
                    if !memo.contains_key(&dependent) {
                        stack.push((dependent, false));
                    }
                }
                continue;
            }

            let mut best = 1;
            let mut best_next = None;
            for &dependent in dependents {
                let length = 1 + memo.get(&dependent).copied().unwrap_or(1);
                if length > best {
                    best = length;
                    best_next = Some(dependent);
                }
            }

            memo.insert(node, best);
            if let Some(next) = best_next {
                next_hop.insert(node, next);
            }
        }
    }

    /// Returns incomplete tasks whose dependencies are all complete
    pub fn ready_tasks(&self, statuses: &HashMap<TaskId, TaskStatus>) -> Vec<TaskId> {
        self.forward
            .iter()
            .filter(|(task_id, deps)| {
                // Task must not be complete
                let status = statuses.get(*task_id).copied().unwrap_or_default();
                if status.is_complete() {
                    return false;
                }

                deps.iter()
                    .all(|dep_id| statuses.get(dep_id).is_some_and(|s| s.is_complete()))
            })
            .map(|(&id, _)| id)
            .collect()
    }

    /// Returns incomplete tasks waiting on at least one incomplete dependency
    pub fn blocked_tasks(&self, statuses: &HashMap<TaskId, TaskStatus>) -> Vec<TaskId> {
        self.forward
            .iter()
            .filter(|(task_id, deps)| {
                let status = statuses.get(*task_id).copied().unwrap_or_default();
                if status.is_complete() {
                    return false;
                }

                // Unknown dependency = blocked
                deps.iter()
                    .any(|dep_id| statuses.get(dep_id).map_or(true, |s| !s.is_complete()))
            })
            .map(|(&id, _)| id)
            .collect()
    }
}
