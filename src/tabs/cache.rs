//! Currently open tabs keyed by tab id.

use std::collections::HashMap;

use super::TabRecord;
use crate::platform::TabId;

/// In-memory map of open tabs.
#[derive(Debug, Default)]
pub struct TabCache {
    tabs: HashMap<TabId, TabRecord>,
}

impl TabCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for its tab id.
    pub fn upsert(&mut self, record: TabRecord) {
        self.tabs.insert(record.id, record);
    }

    pub fn remove(&mut self, tab_id: TabId) -> Option<TabRecord> {
        self.tabs.remove(&tab_id)
    }

    pub fn get(&self, tab_id: TabId) -> Option<&TabRecord> {
        self.tabs.get(&tab_id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
