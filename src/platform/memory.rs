//! In-process browser.
//!
//! Holds a single window of tabs, a bookmark tree and a history list behind a
//! lock, and reports tab changes on an optional event channel the same way a
//! real host would. Used by the offline host binary and by tests.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::{
    BookmarkTreeNode, Browser, BrowserTab, CreateProperties, HistoryItem, HistoryQuery, TabChangeInfo,
    TabEvent, TabId, TabPosition,
};
use crate::error::PlatformError;

/// Seed data for a [`MemoryBrowser`], usually read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryFixture {
    /// Tabs of the current window; indices are renumbered on load.
    pub tabs: Vec<BrowserTab>,
    /// Bookmark tree starting at the invisible root.
    pub bookmarks: Vec<BookmarkTreeNode>,
    pub history: Vec<HistoryItem>,
}

impl MemoryFixture {
    /// Load a fixture from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse fixture file: {}", path.display()))
    }
}

#[derive(Debug, Default)]
struct State {
    tabs: Vec<BrowserTab>,
    bookmarks: Vec<BookmarkTreeNode>,
    history: Vec<HistoryItem>,
    next_tab_id: TabId,
}

impl State {
    fn renumber(&mut self) {
        for (index, tab) in self.tabs.iter_mut().enumerate() {
            tab.index = index;
        }
    }

    fn position(&self, tab_id: TabId) -> Result<usize, PlatformError> {
        self.tabs
            .iter()
            .position(|t| t.id == Some(tab_id))
            .ok_or(PlatformError::NoSuchTab(tab_id))
    }

    fn insert(&mut self, mut tab: BrowserTab, index: Option<usize>) -> BrowserTab {
        let id = self.next_tab_id;
        self.next_tab_id += 1;
        tab.id = Some(id);

        let at = index.unwrap_or(self.tabs.len()).min(self.tabs.len());
        self.tabs.insert(at, tab);
        self.renumber();
        self.tabs[at].clone()
    }
}

/// A single-window browser living entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBrowser {
    state: Mutex<State>,
    events: Option<UnboundedSender<TabEvent>>,
}

impl MemoryBrowser {
    /// Create an empty browser.
    pub fn new() -> Self {
        Self::from_fixture(MemoryFixture::default())
    }

    /// Create a browser seeded with the given tabs, bookmarks and history.
    ///
    /// Tabs without an id get fresh ones.
    pub fn from_fixture(fixture: MemoryFixture) -> Self {
        let mut state = State {
            next_tab_id: fixture.tabs.iter().filter_map(|t| t.id).max().unwrap_or(0) + 1,
            bookmarks: fixture.bookmarks,
            history: fixture.history,
            tabs: Vec::with_capacity(fixture.tabs.len()),
        };
        for mut tab in fixture.tabs {
            if tab.id.is_none() {
                tab.id = Some(state.next_tab_id);
                state.next_tab_id += 1;
            }
            state.tabs.push(tab);
        }
        state.renumber();

        Self {
            state: Mutex::new(state),
            events: None,
        }
    }

    /// Report tab updates and removals on `events`.
    pub fn with_events(mut self, events: UnboundedSender<TabEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Open a tab the way a user would, as if it finished loading.
    pub fn open(&self, url: &str, title: &str) -> BrowserTab {
        let tab = {
            let mut state = self.state.lock();
            state.insert(
                BrowserTab {
                    url: Some(url.to_string()),
                    title: Some(title.to_string()),
                    ..Default::default()
                },
                None,
            )
        };
        self.emit_loaded(&tab);
        tab
    }

    /// Snapshot of the current window.
    pub fn tabs(&self) -> Vec<BrowserTab> {
        self.state.lock().tabs.clone()
    }

    /// Add an entry to the browsing history.
    pub fn add_history(&self, item: HistoryItem) {
        self.state.lock().history.push(item);
    }

    fn emit(&self, event: TabEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                debug!("tab event dropped, background service is gone");
            }
        }
    }

    fn emit_loaded(&self, tab: &BrowserTab) {
        if let Some(tab_id) = tab.id {
            self.emit(TabEvent::Updated {
                tab_id,
                change_info: TabChangeInfo::complete(),
                tab: tab.clone(),
            });
        }
    }
}

fn history_matches(item: &HistoryItem, query: &HistoryQuery) -> bool {
    if item.last_visit_time.unwrap_or(0) < query.start_time {
        return false;
    }
    let haystack = format!(
        "{} {}",
        item.url.as_deref().unwrap_or_default(),
        item.title.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    query
        .text
        .split_whitespace()
        .all(|term| haystack.contains(&term.to_lowercase()))
}

#[async_trait]
impl Browser for MemoryBrowser {
    async fn current_window_tabs(&self) -> Result<Vec<BrowserTab>, PlatformError> {
        Ok(self.tabs())
    }

    async fn create_tab(&self, props: CreateProperties) -> Result<BrowserTab, PlatformError> {
        let tab = {
            let mut state = self.state.lock();
            if props.active {
                for tab in &mut state.tabs {
                    tab.active = false;
                }
            }
            state.insert(
                BrowserTab {
                    url: Some(props.url),
                    active: props.active,
                    ..Default::default()
                },
                props.index,
            )
        };
        self.emit_loaded(&tab);
        Ok(tab)
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        {
            let mut state = self.state.lock();
            let at = state.position(tab_id)?;
            state.tabs.remove(at);
            state.renumber();
        }
        self.emit(TabEvent::Removed { tab_id });
        Ok(())
    }

    async fn duplicate_tab(&self, tab_id: TabId) -> Result<BrowserTab, PlatformError> {
        let tab = {
            let mut state = self.state.lock();
            let at = state.position(tab_id)?;
            let copy = BrowserTab {
                active: false,
                ..state.tabs[at].clone()
            };
            state.insert(copy, Some(at + 1))
        };
        self.emit_loaded(&tab);
        Ok(tab)
    }

    async fn move_tab(&self, tab_id: TabId, to: TabPosition) -> Result<BrowserTab, PlatformError> {
        let mut state = self.state.lock();
        let from = state.position(tab_id)?;
        let tab = state.tabs.remove(from);
        let at = match to {
            TabPosition::Index(index) => index.min(state.tabs.len()),
            TabPosition::End => state.tabs.len(),
        };
        state.tabs.insert(at, tab);
        state.renumber();
        Ok(state.tabs[at].clone())
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.position(tab_id)?;
        for tab in &mut state.tabs {
            tab.active = tab.id == Some(tab_id);
        }
        Ok(())
    }

    async fn bookmark_tree(&self) -> Result<Vec<BookmarkTreeNode>, PlatformError> {
        Ok(self.state.lock().bookmarks.clone())
    }

    async fn search_history(&self, query: HistoryQuery) -> Result<Vec<HistoryItem>, PlatformError> {
        let state = self.state.lock();
        Ok(state
            .history
            .iter()
            .filter(|item| history_matches(item, &query))
            .take(query.max_results)
            .cloned()
            .collect())
    }
}
