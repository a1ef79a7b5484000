//! Tab lifecycle tracking: feeds the cache from update notifications and
//! moves removed tabs into the closed-tab ring.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use url::Url;

use super::{ClosedTabEntry, ClosedTabRing, TabCache, TabRecord};
use crate::commands::Command;
use crate::platform::{BrowserTab, TabChangeInfo, TabEvent, TabId, TabStatus};

/// Tracker shared between the background service (sole writer) and the
/// aggregator (reader). The lock is never held across an await.
pub type SharedTracker = Arc<Mutex<TabTracker>>;

/// Owner of the open-tab cache and the closed-tab ring.
#[derive(Debug, Default)]
pub struct TabTracker {
    cache: TabCache,
    closed: ClosedTabRing,
}

fn is_secure(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| u.scheme() == "https")
}

impl TabTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedTracker {
        Arc::new(Mutex::new(self))
    }

    /// Capture a tab once it has finished loading a secure page.
    ///
    /// In-progress loads and non-https pages are ignored, so a record is never
    /// partial.
    pub fn on_tab_updated(&mut self, tab_id: TabId, change_info: &TabChangeInfo, tab: &BrowserTab) {
        if change_info.status != Some(TabStatus::Complete) {
            return;
        }
        if !tab.url.as_deref().is_some_and(is_secure) {
            return;
        }
        let Some(mut record) = TabRecord::from_browser_tab(tab) else {
            return;
        };
        record.id = tab_id;
        self.cache.upsert(record);
    }

    /// Move a removed tab into the closed-tab ring, stamped with the current time.
    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        self.on_tab_removed_at(tab_id, chrono::Utc::now().timestamp_millis());
    }

    /// Move a removed tab into the closed-tab ring with an explicit close time.
    ///
    /// Tabs that were never captured (closed before loading, or not https)
    /// leave no entry.
    pub fn on_tab_removed_at(&mut self, tab_id: TabId, close_date: i64) {
        let Some(record) = self.cache.remove(tab_id) else {
            debug!(tab_id, "removed tab was never captured");
            return;
        };
        if let Some(evicted) = self.closed.push(ClosedTabEntry::new(record, close_date)) {
            debug!(tab_id = evicted.record().id, "evicted oldest closed tab");
        }
    }

    /// Apply one platform notification.
    pub fn apply(&mut self, event: &TabEvent) {
        match event {
            TabEvent::Updated {
                tab_id,
                change_info,
                tab,
            } => self.on_tab_updated(*tab_id, change_info, tab),
            TabEvent::Removed { tab_id } => self.on_tab_removed(*tab_id),
        }
    }

    /// `CLOSED_TAB` commands, newest first, with `sortDate = closeDate`.
    pub fn list_closed_tab_commands(&self) -> Vec<Command> {
        self.closed.commands()
    }

    pub fn open_tabs(&self) -> &TabCache {
        &self.cache
    }

    pub fn closed_tabs(&self) -> &ClosedTabRing {
        &self.closed
    }
}
