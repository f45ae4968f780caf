//! Stable merge sort with an injected comparator
//!
//! Listings rely on stability: tasks that compare equal keep the relative
//! order they arrived in (usually id order from the store).

use super::compare::SortKey;
use super::task::Task;

/// Sorts `items` in place so that `less(a, b)` implies `a` precedes `b`.
///
/// Equal elements keep their input order. One scratch buffer the size of
/// the whole input is allocated per call and shared by every merge.
pub fn merge_sort<T, F>(items: &mut [T], less: F)
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    if items.len() <= 1 {
        return;
    }

    let mut scratch = items.to_vec();
    sort_run(items, &mut scratch, &less);
}

fn sort_run<T, F>(items: &mut [T], scratch: &mut [T], less: &F)
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let len = items.len();
    if len <= 1 {
        return;
    }

    let mid = len / 2;
    sort_run(&mut items[..mid], &mut scratch[..mid], less);
    sort_run(&mut items[mid..], &mut scratch[mid..], less);
    merge(items, scratch, mid, less);
}

fn merge<T, F>(items: &mut [T], scratch: &mut [T], mid: usize, less: &F)
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let len = items.len();
    let (mut i, mut j, mut k) = (0, mid, 0);

    while i < mid && j < len {
        // Ties take from the left run
        if !less(&items[j], &items[i]) {
            scratch[k] = items[i].clone();
            i += 1;
        } else {
            scratch[k] = items[j].clone();
            j += 1;
        }
        k += 1;
    }

    while i < mid {
        scratch[k] = items[i].clone();
        i += 1;
        k += 1;
    }

    while j < len {
        scratch[k] = items[j].clone();
        j += 1;
        k += 1;
    }

    items.clone_from_slice(&scratch[..len]);
}

/// Returns `tasks` sorted by `key`
pub fn sorted_by(mut tasks: Vec<Task>, key: SortKey) -> Vec<Task> {
    merge_sort(&mut tasks, key.comparator());
    tasks
}
