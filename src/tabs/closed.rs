//! Fixed-capacity, newest-first history of closed tabs.

use std::collections::VecDeque;

use super::ClosedTabEntry;
use crate::commands::Command;

/// Number of closed tabs remembered.
pub const CLOSED_TAB_CAPACITY: usize = 50;

/// Ring of closed tabs. Index 0 is always the most recently closed.
#[derive(Debug)]
pub struct ClosedTabRing {
    entries: VecDeque<ClosedTabEntry>,
    capacity: usize,
}

impl Default for ClosedTabRing {
    fn default() -> Self {
        Self::with_capacity(CLOSED_TAB_CAPACITY)
    }
}

impl ClosedTabRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Insert at the front, evicting the oldest entry when full.
    /// Returns the evicted entry, if any.
    pub fn push(&mut self, entry: ClosedTabEntry) -> Option<ClosedTabEntry> {
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClosedTabEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ClosedTabEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `CLOSED_TAB` commands, newest first.
    pub fn commands(&self) -> Vec<Command> {
        self.entries.iter().map(ClosedTabEntry::to_command).collect()
    }
}
