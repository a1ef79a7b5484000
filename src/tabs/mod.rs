//! Live view of open tabs and a bounded history of closed ones.
//!
//! Both structures are owned by the background service through
//! [`TabTracker`]; everything else sees them only as derived snapshots.

pub mod cache;
pub mod closed;
pub mod tracker;

use serde::{Deserialize, Serialize};

use crate::commands::{Command, CommandType, DEFAULT_FAVICON_URL};
use crate::platform::{BrowserTab, TabId};

pub use cache::TabCache;
pub use closed::{ClosedTabRing, CLOSED_TAB_CAPACITY};
pub use tracker::{SharedTracker, TabTracker};

/// One open tab, as captured once it finished loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub id: TabId,
    pub url: String,
    pub title: String,
    pub fav_icon_url: String,
    pub index: usize,
    pub pinned: bool,
    /// Set only on snapshots taken from the closed-tab history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<i64>,
}

impl TabRecord {
    /// Build a record from a host tab. Returns `None` for tabs without an id.
    pub fn from_browser_tab(tab: &BrowserTab) -> Option<Self> {
        let id = tab.id?;
        Some(Self {
            id,
            url: tab.url.clone().unwrap_or_default(),
            title: tab.title.clone().unwrap_or_default(),
            fav_icon_url: tab
                .fav_icon_url
                .clone()
                .filter(|icon| !icon.is_empty())
                .unwrap_or_else(|| DEFAULT_FAVICON_URL.to_string()),
            index: tab.index,
            pinned: tab.pinned,
            close_date: None,
        })
    }
}

/// Immutable snapshot of a tab at the moment it was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedTabEntry {
    record: TabRecord,
    close_date: i64,
}

impl ClosedTabEntry {
    pub fn new(mut record: TabRecord, close_date: i64) -> Self {
        record.close_date = Some(close_date);
        Self { record, close_date }
    }

    /// The tab as it was when closed, with `close_date` filled in.
    pub fn record(&self) -> &TabRecord {
        &self.record
    }

    /// Milliseconds since the epoch.
    pub fn close_date(&self) -> i64 {
        self.close_date
    }

    pub fn to_command(&self) -> Command {
        Command {
            kind: CommandType::ClosedTab,
            id: format!("{}-{}", CommandType::ClosedTab.as_str(), self.record.id),
            icon: self.record.fav_icon_url.clone(),
            url: self.record.url.clone(),
            title: self.record.title.clone(),
            sort_date: Some(self.close_date),
            is_search_url: None,
            match_indices: None,
        }
    }
}
