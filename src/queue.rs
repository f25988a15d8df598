//! Indexed min-heap keyed by a lexicographically-ordered `(f64, f64)` pair,
//! with O(1) removal via lazy deletion and an auxiliary cell->entry index.
//!
//! Grounded on `algorithms/d_star_lite.rs` (`vertex_generations`
//! tombstone map alongside a `BinaryHeap<(Key, Position, u64)>`) and the
//! original Python `PriorityQueue` (`src/utils/data_structures.py`), which
//! uses the same entry-finder + monotonic counter idea via `heapq`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::grid::Position;

/// Lexicographic `(k1, k2)` priority key. Ordered ascending for the
/// min-heap semantics `open_set` needs (smallest key pops first).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key {
    pub k1: f64,
    pub k2: f64,
}

impl Key {
    pub fn infinite() -> Self {
        Key {
            k1: f64::INFINITY,
            k2: f64::INFINITY,
        }
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.k1
            .partial_cmp(&other.k1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.k2.partial_cmp(&other.k2).unwrap_or(Ordering::Equal))
    }
}

/// A heap entry. `BinaryHeap` is a max-heap, so `Ord` is reversed relative
/// to `Key`'s natural (ascending) order, and ties break on insertion order
/// (earlier insertions win, i.e. pop first) to make pops deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    key: Key,
    cell: Position,
    generation: u64,
    seq: u64,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The open set: cells known to be locally inconsistent, ordered by key.
#[derive(Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<Entry>,
    /// Current valid generation per cell. An entry popped from `heap` whose
    /// generation no longer matches this map is a tombstone and is skipped.
    generations: FxHashMap<Position, u64>,
    next_generation: u64,
    next_seq: u64,
}

impl PriorityQueue {
    pub fn new() -> Self {
        PriorityQueue {
            heap: BinaryHeap::new(),
            generations: FxHashMap::default(),
            next_generation: 0,
            next_seq: 0,
        }
    }

    /// Inserts `cell` with `key`. If `cell` is already present its old
    /// entry is tombstoned first, then a fresh entry is pushed — duplicate
    /// insertions of the same cell are therefore impossible to observe from
    /// the outside.
    pub fn insert(&mut self, cell: Position, key: Key) {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.generations.insert(cell, generation);

        self.next_seq += 1;
        self.heap.push(Entry {
            key,
            cell,
            generation,
            seq: self.next_seq,
        });
    }

    /// Marks `cell`'s current entry as removed. O(1).
    pub fn remove(&mut self, cell: Position) {
        self.generations.remove(&cell);
    }

    /// True iff `cell` has a live (non-tombstoned) entry.
    pub fn contains(&self, cell: Position) -> bool {
        self.generations.contains_key(&cell)
    }

    fn drop_stale(&mut self) {
        while let Some(top) = self.heap.peek() {
            let is_live = self
                .generations
                .get(&top.cell)
                .is_some_and(|&g| g == top.generation);
            if is_live {
                break;
            }
            self.heap.pop();
        }
    }

    /// The key of the head of the queue, discarding tombstoned entries
    /// first. `(+inf, +inf)` if empty.
    pub fn top_key(&mut self) -> Key {
        self.drop_stale();
        self.heap.peek().map(|e| e.key).unwrap_or_else(Key::infinite)
    }

    /// Pops and returns the cell at the head of the queue.
    pub fn pop(&mut self) -> Option<Position> {
        self.drop_stale();
        let entry = self.heap.pop()?;
        self.generations.remove(&entry.cell);
        Some(entry.cell)
    }

    pub fn is_empty(&mut self) -> bool {
        self.drop_stale();
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.generations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k1: f64, k2: f64) -> Key {
        Key { k1, k2 }
    }

    #[test]
    fn pops_in_ascending_key_order() {
        let mut q = PriorityQueue::new();
        q.insert(Position::new(0, 0), key(3.0, 0.0));
        q.insert(Position::new(1, 0), key(1.0, 0.0));
        q.insert(Position::new(2, 0), key(2.0, 0.0));
        assert_eq!(q.pop(), Some(Position::new(1, 0)));
        assert_eq!(q.pop(), Some(Position::new(2, 0)));
        assert_eq!(q.pop(), Some(Position::new(0, 0)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn reinsert_replaces_old_entry() {
        let mut q = PriorityQueue::new();
        let cell = Position::new(0, 0);
        q.insert(cell, key(5.0, 0.0));
        q.insert(cell, key(1.0, 0.0));
        assert_eq!(q.top_key(), key(1.0, 0.0));
        assert_eq!(q.pop(), Some(cell));
        assert!(q.is_empty());
    }

    #[test]
    fn remove_tombstones_without_shrinking_observably() {
        let mut q = PriorityQueue::new();
        let cell = Position::new(0, 0);
        q.insert(cell, key(1.0, 0.0));
        q.remove(cell);
        assert!(!q.contains(cell));
        assert!(q.is_empty());
    }

    #[test]
    fn top_key_is_infinite_when_empty() {
        let mut q = PriorityQueue::new();
        assert_eq!(q.top_key(), Key::infinite());
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let mut q = PriorityQueue::new();
        q.insert(Position::new(0, 0), key(1.0, 1.0));
        q.insert(Position::new(1, 0), key(1.0, 1.0));
        assert_eq!(q.pop(), Some(Position::new(0, 0)));
        assert_eq!(q.pop(), Some(Position::new(1, 0)));
    }
}
