//! Merges every command source into one response.
//!
//! Nothing is cached between calls: tabs, bookmarks and history can change
//! at any time, so each request goes back to the browser.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{bookmarks, quick_links, Command, CommandType, FaviconResolver, PullRequest, PullRequestMatcher, QuickLinksTree};
use crate::platform::{Browser, BrowserTab};
use crate::tabs::{SharedTracker, TabRecord};

/// Every source's commands, each list in its own source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCommandsResponse {
    pub bookmark_commands: Vec<Command>,
    pub current_tab_commands: Vec<Command>,
    pub closed_tab_commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_commands: Option<Vec<Command>>,
}

/// Builds command lists from the browser and the closed-tab history.
pub struct CommandAggregator {
    browser: Arc<dyn Browser>,
    tracker: SharedTracker,
    favicons: FaviconResolver,
    pull_requests: PullRequestMatcher,
}

impl CommandAggregator {
    pub fn new(browser: Arc<dyn Browser>, tracker: SharedTracker) -> Self {
        Self {
            browser,
            tracker,
            favicons: FaviconResolver::default(),
            pull_requests: PullRequestMatcher::default(),
        }
    }

    pub fn with_favicons(mut self, favicons: FaviconResolver) -> Self {
        self.favicons = favicons;
        self
    }

    pub fn with_pull_requests(mut self, matcher: PullRequestMatcher) -> Self {
        self.pull_requests = matcher;
        self
    }

    async fn window_tabs(&self) -> Vec<BrowserTab> {
        self.browser.current_window_tabs().await.unwrap_or_else(|e| {
            warn!("failed to query current window tabs: {e}");
            Vec::new()
        })
    }

    /// Tabs of the current window as records, in visual order.
    pub async fn current_tabs(&self) -> Vec<TabRecord> {
        self.window_tabs()
            .await
            .iter()
            .filter_map(TabRecord::from_browser_tab)
            .collect()
    }

    /// `CURRENT_TAB` commands with `sortDate` set to the visual position.
    pub async fn current_tab_commands(&self) -> Vec<Command> {
        self.window_tabs()
            .await
            .into_iter()
            .enumerate()
            .map(|(position, tab)| Command {
                kind: CommandType::CurrentTab,
                id: tab.id.unwrap_or(position as i64).to_string(),
                icon: tab
                    .fav_icon_url
                    .filter(|icon| !icon.is_empty())
                    .unwrap_or_else(|| self.favicons.default_icon().to_string()),
                url: tab.url.unwrap_or_default(),
                title: tab.title.unwrap_or_default(),
                sort_date: Some(position as i64),
                is_search_url: None,
                match_indices: None,
            })
            .collect()
    }

    /// `BOOKMARK` commands from the bookmarks bar; empty if it can't be found.
    pub async fn bookmark_commands(&self) -> Vec<Command> {
        match self.browser.bookmark_tree().await {
            Ok(tree) => bookmarks::tree_to_commands(&tree, &self.favicons),
            Err(e) => {
                warn!("failed to read bookmark tree: {e}");
                Vec::new()
            }
        }
    }

    /// Pull requests visited in the lookback window by `identity`.
    pub async fn pull_requests(&self, identity: &str) -> Vec<PullRequest> {
        let query = self.pull_requests.history_query(identity, Utc::now());
        match self.browser.search_history(query).await {
            Ok(items) => self.pull_requests.extract(&items),
            Err(e) => {
                warn!("history search failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn pr_commands(&self, identity: &str) -> Vec<Command> {
        self.pull_requests(identity)
            .await
            .iter()
            .map(|pr| pr.to_command(&self.favicons))
            .collect()
    }

    /// Snapshot of the closed-tab history, newest first.
    pub fn closed_tab_commands(&self) -> Vec<Command> {
        self.tracker.lock().list_closed_tab_commands()
    }

    /// Bookmarks bar as a first-letter keyed tree.
    pub async fn quick_links(&self) -> QuickLinksTree {
        let tree = match self.browser.bookmark_tree().await {
            Ok(tree) => tree,
            Err(e) => {
                warn!("failed to read bookmark tree: {e}");
                return QuickLinksTree::new();
            }
        };
        bookmarks::find_bookmarks_bar(&tree)
            .and_then(|bar| bar.children.as_deref())
            .map(|children| quick_links::build(children, &self.favicons))
            .unwrap_or_default()
    }

    /// Every source at once. Tabs, bookmarks and pull requests are fetched
    /// concurrently; pull requests only when an identity is given. Lists are
    /// not re-sorted across sources.
    pub async fn load_all(&self, identity: Option<&str>) -> LoadCommandsResponse {
        let prs = async {
            match identity {
                Some(identity) => Some(self.pr_commands(identity).await),
                None => None,
            }
        };
        let (current_tab_commands, bookmark_commands, pr_commands) =
            tokio::join!(self.current_tab_commands(), self.bookmark_commands(), prs);

        LoadCommandsResponse {
            bookmark_commands,
            current_tab_commands,
            closed_tab_commands: self.closed_tab_commands(),
            pr_commands,
        }
    }
}
