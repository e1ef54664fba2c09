use std::cmp::Ordering;

use crate::types::{Lit, Var};

use super::assignment::Assignment;

/// Conflict activity. Important variables form a tier of their own that
/// outranks every other variable regardless of score.
#[derive(Clone, Copy, PartialEq)]
struct Activity {
    important: bool,
    score: f64,
}

impl Activity {
    const ZERO: Self = Self {
        important: false,
        score: 0.0,
    };
}

impl Eq for Activity {}

impl PartialOrd for Activity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Activity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.important
            .cmp(&other.important)
            .then_with(|| self.score.total_cmp(&other.score))
    }
}

/// Binary max-heap over variables. Entries past `size` are parked by
/// `extract` and brought back by `restore`.
struct VarHeap<T> {
    heap: Vec<(T, Var)>,
    index: Vec<usize>,
    size: usize,
    default: T,
}

impl<T: Ord + Copy> VarHeap<T> {
    fn new(var_count: usize, default: T) -> Self {
        let mut heap = Self {
            heap: vec![],
            // 0 inserted for indexing by variables
            index: vec![0],
            size: 0,
            default,
        };
        heap.grow(var_count);
        heap
    }

    /// Adds variables up to `var_count`. Must not be called while entries are parked.
    fn grow(&mut self, var_count: usize) {
        debug_assert_eq!(self.size, self.heap.len());
        for var in self.index.len()..=var_count {
            self.index.push(self.heap.len());
            self.heap.push((self.default, var));
            self.size += 1;
            self.sift_up(self.size - 1);
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.index.swap(self.heap[i].1, self.heap[j].1);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].0 <= self.heap[parent].0 {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let mut max = pos;
            let left = 2 * pos + 1;
            if left < self.size && self.heap[left].0 > self.heap[max].0 {
                max = left;
            }
            let right = left + 1;
            if right < self.size && self.heap[right].0 > self.heap[max].0 {
                max = right;
            }

            if max == pos {
                break;
            }
            self.swap(pos, max);
            pos = max;
        }
    }

    fn set(&mut self, var: Var, val: T) {
        let pos = self.index[var];
        self.heap[pos] = (val, var);

        if pos < self.size {
            self.sift_up(pos);
            self.sift_down(pos);
        }
    }

    fn get(&self, var: Var) -> T {
        self.heap[self.index[var]].0
    }

    /// Applies `f` to every value in the heap.
    /// The supplied function must preserve the ordering of the items!
    fn transform(&mut self, mut f: impl FnMut(T) -> T) {
        for (val, _) in &mut self.heap {
            *val = f(*val);
        }
    }

    fn max(&self) -> Option<Var> {
        (self.size != 0).then(|| self.heap[0].1)
    }

    fn extract(&mut self) -> Option<Var> {
        let var = self.max()?;
        self.swap(0, self.size - 1);
        self.size -= 1;
        self.sift_down(0);
        Some(var)
    }

    fn restore(&mut self) -> Option<Var> {
        if self.size == self.heap.len() {
            return None;
        }
        self.size += 1;
        let var = self.heap[self.size - 1].1;
        self.sift_up(self.size - 1);
        Some(var)
    }
}

/// Picks the unassigned variable with the highest conflict activity.
pub struct Chooser {
    k: f64,
    seen: Vec<bool>,
    heap: VarHeap<Activity>,
}

impl Chooser {
    pub fn new(var_count: usize) -> Self {
        Self {
            k: 1.0,
            seen: vec![false; var_count + 1],
            heap: VarHeap::new(var_count, Activity::ZERO),
        }
    }

    pub fn grow(&mut self, var_count: usize) {
        if var_count + 1 > self.seen.len() {
            self.seen.resize(var_count + 1, false);
            self.heap.grow(var_count);
        }
    }

    /// Bumps `var` once per conflict.
    pub fn touch(&mut self, var: Var) {
        if !self.seen[var] {
            self.seen[var] = true;

            let activity = self.heap.get(var);
            self.heap.set(
                var,
                Activity {
                    score: activity.score + self.k,
                    ..activity
                },
            );
        }
    }

    /// Lifts `var` above every variable that has not been prioritized.
    pub fn prioritize(&mut self, var: Var) {
        let activity = self.heap.get(var);
        self.heap.set(
            var,
            Activity {
                important: true,
                ..activity
            },
        );
    }

    pub fn rescale(&mut self) {
        self.k *= 1.01;

        if self.k > THRESHOLD {
            self.heap.transform(|activity| Activity {
                score: activity.score / THRESHOLD,
                ..activity
            });
            self.k /= THRESHOLD;
        }

        self.seen.fill(false);
    }

    pub fn choose(&mut self, assignment: &Assignment) -> Option<Var> {
        let mut res = None;

        while let Some(var) = self.heap.max() {
            if assignment.eval(var as Lit).is_none() {
                res = Some(var);
                break;
            }
            self.heap.extract();
        }
        while self.heap.restore().is_some() {}

        res
    }
}

const THRESHOLD: f64 = 10e100;
