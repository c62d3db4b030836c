use std::collections::VecDeque;

/// Default number of snapshots kept for undo.
pub const MAX_HISTORY: usize = 20;

/// Bounded stack of full-buffer snapshots.
///
/// Once seeded it is never empty: the bottom entry is the state undo falls back to.
/// When full, pushing evicts the oldest snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotHistory<T> {
    snapshots: VecDeque<T>,
    capacity: usize,
}

impl<T> SnapshotHistory<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Drop everything and start over from a single base snapshot.
    pub fn seed(&mut self, base: T) {
        self.snapshots.clear();
        self.snapshots.push_back(base);
    }

    /// Store a snapshot, evicting the oldest entry when at capacity.
    pub fn push(&mut self, snapshot: T) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Discard the newest snapshot and return the one now on top.
    ///
    /// Returns `None` when only one snapshot is left; nothing is removed in that case and
    /// the caller is expected to reset to its base state instead.
    pub fn undo(&mut self) -> Option<&T> {
        if self.snapshots.len() <= 1 {
            return None;
        }
        self.snapshots.pop_back();
        self.snapshots.back()
    }

    pub fn top(&self) -> Option<&T> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.snapshots.iter()
    }
}

impl<T> Default for SnapshotHistory<T> {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}
