//! Host browser interface.
//!
//! Everything the core needs from the browser goes through [`Browser`]. All
//! values crossing this boundary are plain owned data, never handles into
//! the host.

pub mod memory;
#[cfg(test)]
pub(crate) mod unavailable;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

pub use memory::{MemoryBrowser, MemoryFixture};

/// Platform-assigned tab identifier.
pub type TabId = i64;

/// URL opened by the `openExtensions` directive.
pub const EXTENSIONS_PAGE_URL: &str = "chrome://extensions";

/// A tab as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserTab {
    /// Missing for tabs the host does not expose (devtools, some prerenders).
    pub id: Option<TabId>,
    /// Zero-based position within its window.
    pub index: usize,
    pub url: Option<String>,
    pub title: Option<String>,
    pub fav_icon_url: Option<String>,
    pub pinned: bool,
    pub active: bool,
}

/// Loading status carried by a tab-update notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

/// The part of a tab that changed in an update notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabChangeInfo {
    pub status: Option<TabStatus>,
    pub url: Option<String>,
}

impl TabChangeInfo {
    /// Change info for a tab that just finished loading.
    pub fn complete() -> Self {
        Self {
            status: Some(TabStatus::Complete),
            url: None,
        }
    }
}

/// Tab lifecycle notifications, delivered in platform order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TabEvent {
    Updated {
        tab_id: TabId,
        change_info: TabChangeInfo,
        tab: BrowserTab,
    },
    Removed {
        tab_id: TabId,
    },
}

/// Where to put a tab when moving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabPosition {
    /// Absolute index within the window.
    Index(usize),
    /// After the last tab (the host's `-1`).
    End,
}

/// Properties for creating a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProperties {
    pub url: String,
    pub index: Option<usize>,
    pub active: bool,
}

/// A node of the host's bookmark tree. Folders have no `url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookmarkTreeNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub url: Option<String>,
    /// Milliseconds since the epoch.
    pub date_added: Option<i64>,
    /// Milliseconds since the epoch; not every host reports it.
    pub date_last_used: Option<i64>,
    pub children: Option<Vec<BookmarkTreeNode>>,
}

impl BookmarkTreeNode {
    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }
}

/// Browsing-history search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Free text; every whitespace-separated term must match.
    pub text: String,
    /// Only visits at or after this time (ms since epoch).
    pub start_time: i64,
    pub max_results: usize,
}

/// One browsing-history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryItem {
    pub url: Option<String>,
    pub title: Option<String>,
    pub last_visit_time: Option<i64>,
    pub visit_count: Option<u32>,
}

/// Async view of the host browser's tab, bookmark and history APIs.
///
/// Every call is scoped to the window the user is currently in.
#[async_trait]
pub trait Browser: Send + Sync {
    /// All tabs of the current window, in visual order.
    async fn current_window_tabs(&self) -> Result<Vec<BrowserTab>, PlatformError>;

    async fn create_tab(&self, props: CreateProperties) -> Result<BrowserTab, PlatformError>;

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), PlatformError>;

    async fn duplicate_tab(&self, tab_id: TabId) -> Result<BrowserTab, PlatformError>;

    async fn move_tab(&self, tab_id: TabId, to: TabPosition) -> Result<BrowserTab, PlatformError>;

    /// Make the tab the selected one in its window.
    async fn activate_tab(&self, tab_id: TabId) -> Result<(), PlatformError>;

    /// The full bookmark tree, starting at the invisible root.
    async fn bookmark_tree(&self) -> Result<Vec<BookmarkTreeNode>, PlatformError>;

    async fn search_history(&self, query: HistoryQuery) -> Result<Vec<HistoryItem>, PlatformError>;
}
