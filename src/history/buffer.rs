//! Bounded, insertion-ordered poll history.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::history::PollRecord;

/// Default number of entries retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Fixed-capacity ring of [`PollRecord`]s, newest first.
///
/// Order is insertion order, never timestamp order, so a clock step cannot
/// reshuffle entries.
#[derive(Debug)]
pub struct PollHistory {
    capacity: usize,
    entries: Mutex<VecDeque<PollRecord>>,
}

impl PollHistory {
    /// Create an empty history. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity + 1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PollRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert at the front, evicting the oldest entry when full.
    pub fn append(&self, record: PollRecord) {
        let mut entries = self.lock();
        entries.push_front(record);
        if entries.len() > self.capacity {
            entries.pop_back();
        }
    }

    /// Current contents, newest first.
    pub fn snapshot(&self) -> Vec<PollRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PollHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
