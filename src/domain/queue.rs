//! Priority queue of tasks
//!
//! A binary min-heap stored in a `Vec`, ordered by [`outranks`]: lower
//! priority number first, then earlier due date, then lower id. The heap
//! property holds between every public call.

use super::compare::outranks;
use super::task::Task;

/// Binary min-heap of tasks
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    heap: Vec<Task>,
}

impl TaskQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    /// Adds a task, O(log n)
    pub fn insert(&mut self, task: Task) {
        self.heap.push(task);
        self.sift_up(self.heap.len() - 1);
    }

    /// Removes and returns the highest-ranked task, O(log n)
    pub fn extract_min(&mut self) -> Option<Task> {
        if self.heap.is_empty() {
            return None;
        }

        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let min = self.heap.pop();
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        min
    }

    /// Returns the highest-ranked task without removing it
    pub fn peek(&self) -> Option<&Task> {
        self.heap.first()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of inserted but not yet extracted tasks
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Drains the queue in rank order
    pub fn into_sorted_vec(mut self) -> Vec<Task> {
        let mut sorted = Vec::with_capacity(self.heap.len());
        while let Some(task) = self.extract_min() {
            sorted.push(task);
        }
        sorted
    }

    fn parent(i: usize) -> usize {
        (i - 1) / 2
    }

    fn left_child(i: usize) -> usize {
        2 * i + 1
    }

    fn right_child(i: usize) -> usize {
        2 * i + 2
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = Self::parent(index);
            if !outranks(&self.heap[index], &self.heap[parent]) {
                break;
            }
            self.heap.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = Self::left_child(index);
            if left >= len {
                break;
            }

            let right = Self::right_child(index);
            let best_child = if right < len && outranks(&self.heap[right], &self.heap[left]) {
                right
            } else {
                left
            };

            if !outranks(&self.heap[best_child], &self.heap[index]) {
                break;
            }
            self.heap.swap(index, best_child);
            index = best_child;
        }
    }
}

impl FromIterator<Task> for TaskQueue {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        let mut queue = TaskQueue::new();
        queue.extend(iter);
        queue
    }
}

impl Extend<Task> for TaskQueue {
    fn extend<I: IntoIterator<Item = Task>>(&mut self, iter: I) {
        for task in iter {
            self.insert(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn day(d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap())
    }

    fn task(id: i64, priority: u8, due: Option<DateTime<Utc>>) -> Task {
        Task::new(id, format!("Task {}", id)).with_priority(priority).with_due(due)
    }

    impl TaskQueue {
        fn is_heap(&self) -> bool {
            (1..self.heap.len()).all(|i| !outranks(&self.heap[i], &self.heap[Self::parent(i)]))
        }
    }

    #[test]
    fn empty_queue() {
        let mut queue = TaskQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.peek().is_none());
        assert!(queue.extract_min().is_none());
    }

    #[test]
    fn extracts_by_priority_then_due_date() {
        let mut queue = TaskQueue::new();
        queue.insert(task(1, 3, day(1)));
        queue.insert(task(2, 1, day(20)));
        queue.insert(task(3, 1, day(5)));
        queue.insert(task(4, 2, None));

        assert_eq!(queue.peek().map(|t| t.id), Some(3));
        assert_eq!(queue.len(), 4);

        let order: Vec<_> = std::iter::from_fn(|| queue.extract_min()).map(|t| t.id).collect();
        assert_eq!(order, vec![3, 2, 4, 1]);
        assert!(queue.is_empty());
    }

    #[test]
    fn size_drops_by_one_per_extraction() {
        let mut queue: TaskQueue = (1..=5).map(|i| task(i, 2, None)).collect();
        for expected in (0..5).rev() {
            assert!(queue.extract_min().is_some());
            assert_eq!(queue.len(), expected);
        }
        assert!(queue.extract_min().is_none());
    }

    #[test]
    fn exact_ties_come_out_by_id() {
        let queue: TaskQueue = [7, 3, 5].into_iter().map(|i| task(i, 2, day(2))).collect();
        let ids: Vec<_> = queue.into_sorted_vec().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }

    #[test]
    fn peek_does_not_remove() {
        let mut queue = TaskQueue::new();
        queue.insert(task(1, 4, None));
        assert_eq!(queue.peek().map(|t| t.id), Some(1));
        assert_eq!(queue.len(), 1);
    }

    proptest! {
        #[test]
        fn extraction_is_non_decreasing(
            entries in proptest::collection::vec((1u8..=4, proptest::option::of(1u32..=28)), 0..50)
        ) {
            let mut queue = TaskQueue::new();
            for (i, (priority, due_day)) in entries.iter().enumerate() {
                queue.insert(task(i as i64, *priority, due_day.and_then(day)));
                prop_assert!(queue.is_heap());
            }
            prop_assert_eq!(queue.len(), entries.len());

            let mut previous: Option<Task> = None;
            while let Some(next) = queue.extract_min() {
                prop_assert!(queue.is_heap());
                if let Some(prev) = &previous {
                    prop_assert!((prev.priority, prev.due) <= (next.priority, next.due));
                }
                previous = Some(next);
            }
        }
    }
}
