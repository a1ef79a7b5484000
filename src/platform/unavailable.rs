//! A browser that never delivers, for exercising the fail-soft paths.

use std::future;

use async_trait::async_trait;

use super::{BookmarkTreeNode, Browser, BrowserTab, CreateProperties, HistoryItem, HistoryQuery, TabId, TabPosition};
use crate::error::PlatformError;

/// Fails every call, or with `stalled` never answers at all.
#[derive(Debug, Default)]
pub(crate) struct UnavailableBrowser {
    stalled: bool,
}

impl UnavailableBrowser {
    pub fn stalled() -> Self {
        Self { stalled: true }
    }

    async fn fail<T>(&self, error: PlatformError) -> Result<T, PlatformError> {
        if self.stalled {
            future::pending::<()>().await;
        }
        Err(error)
    }
}

fn host_down() -> PlatformError {
    PlatformError::Host("browser unavailable".into())
}

#[async_trait]
impl Browser for UnavailableBrowser {
    async fn current_window_tabs(&self) -> Result<Vec<BrowserTab>, PlatformError> {
        self.fail(host_down()).await
    }

    async fn create_tab(&self, _props: CreateProperties) -> Result<BrowserTab, PlatformError> {
        self.fail(host_down()).await
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        self.fail(PlatformError::NoSuchTab(tab_id)).await
    }

    async fn duplicate_tab(&self, tab_id: TabId) -> Result<BrowserTab, PlatformError> {
        self.fail(PlatformError::NoSuchTab(tab_id)).await
    }

    async fn move_tab(&self, tab_id: TabId, _to: TabPosition) -> Result<BrowserTab, PlatformError> {
        self.fail(PlatformError::NoSuchTab(tab_id)).await
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        self.fail(PlatformError::NoSuchTab(tab_id)).await
    }

    async fn bookmark_tree(&self) -> Result<Vec<BookmarkTreeNode>, PlatformError> {
        self.fail(PlatformError::Bookmarks("bookmark API unavailable".into())).await
    }

    async fn search_history(&self, _query: HistoryQuery) -> Result<Vec<HistoryItem>, PlatformError> {
        self.fail(host_down()).await
    }
}
