//! Comparator-driven ordering.
//!
//! [`sort`] orders any collection that exposes the [`Sortable`] capability set
//! (`len`, `swap`, `less`) and knows nothing else about the elements. [`By`]
//! adapts a plain "less-than" closure over two values into that capability
//! set for a slice, so callers can sort responses (or anything else) by a key
//! they derive themselves.
//!
//! ```
//! use rangefetch::sort::By;
//!
//! let mut words = vec!["pear", "fig", "banana"];
//! By::new(|a: &&str, b: &&str| a.len() < b.len()).sort(&mut words);
//! assert_eq!(words, vec!["fig", "pear", "banana"]);
//! ```

/// Inputs shorter than this use insertion sort.
const INSERTION_SORT_THRESHOLD: usize = 12;

/// Minimal capability set a collection needs to be sorted in place.
pub trait Sortable {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Swaps the elements at `i` and `j`.
    fn swap(&mut self, i: usize, j: usize);

    /// Returns true if the element at `i` must sort before the one at `j`.
    fn less(&self, i: usize, j: usize) -> bool;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sorts `data` in place using only its [`Sortable`] operations. Not stable.
pub fn sort<S: Sortable + ?Sized>(data: &mut S) {
    let n = data.len();
    if n < INSERTION_SORT_THRESHOLD {
        insertion_sort(data, n);
    } else {
        heap_sort(data, n);
    }
    debug_assert!(is_sorted(data));
}

/// Returns true if no element is `less` than its predecessor.
pub fn is_sorted<S: Sortable + ?Sized>(data: &S) -> bool {
    (1..data.len()).all(|i| !data.less(i, i - 1))
}

fn insertion_sort<S: Sortable + ?Sized>(data: &mut S, n: usize) {
    for i in 1..n {
        let mut j = i;
        while j > 0 && data.less(j, j - 1) {
            data.swap(j, j - 1);
            j -= 1;
        }
    }
}

fn heap_sort<S: Sortable + ?Sized>(data: &mut S, n: usize) {
    for root in (0..n / 2).rev() {
        sift_down(data, root, n);
    }
    for end in (1..n).rev() {
        data.swap(0, end);
        sift_down(data, 0, end);
    }
}

/// Restores the max-heap property for the subtree at `root`, within `[0, end)`.
fn sift_down<S: Sortable + ?Sized>(data: &mut S, mut root: usize, end: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && data.less(child, child + 1) {
            child += 1;
        }
        if !data.less(root, child) {
            return;
        }
        data.swap(root, child);
        root = child;
    }
}

/// A "less-than" comparator that defines an ordering over `T`.
pub struct By<F>(F);

impl<F> By<F> {
    /// Wraps a comparator returning true when its first argument sorts first.
    pub fn new(less: F) -> Self {
        Self(less)
    }

    /// Sorts `items` in place according to the comparator.
    pub fn sort<T>(&self, items: &mut [T])
    where
        F: Fn(&T, &T) -> bool,
    {
        let mut sorter = SliceSorter {
            items,
            less: &self.0,
        };
        sort(&mut sorter);
    }
}

/// Joins a slice with the comparator used by its `less` method.
struct SliceSorter<'a, T, F> {
    items: &'a mut [T],
    less: &'a F,
}

impl<T, F> Sortable for SliceSorter<'_, T, F>
where
    F: Fn(&T, &T) -> bool,
{
    fn len(&self) -> usize {
        self.items.len()
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.items.swap(i, j);
    }

    fn less(&self, i: usize, j: usize) -> bool {
        (self.less)(&self.items[i], &self.items[j])
    }
}
