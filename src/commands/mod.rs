//! Unified, rankable commands built from tabs, bookmarks, closed tabs and
//! pull requests.

pub mod aggregator;
pub mod bookmarks;
pub mod favicon;
pub mod prs;
pub mod quick_links;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use aggregator::CommandAggregator;
pub use favicon::{FaviconResolver, DEFAULT_FAVICON_URL};
pub use prs::{PullRequest, PullRequestMatcher};
pub use quick_links::{QuickLinksNode, QuickLinksTree};

/// Source of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    Bookmark,
    CurrentTab,
    ClosedTab,
    #[serde(rename = "PR")]
    Pr,
    Exact,
}

impl CommandType {
    pub const ALL: [CommandType; 5] = [
        CommandType::Bookmark,
        CommandType::CurrentTab,
        CommandType::ClosedTab,
        CommandType::Pr,
        CommandType::Exact,
    ];

    /// Wire name, also used as the id prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bookmark => "BOOKMARK",
            Self::CurrentTab => "CURRENT_TAB",
            Self::ClosedTab => "CLOSED_TAB",
            Self::Pr => "PR",
            Self::Exact => "EXACT",
        }
    }

    /// Short label shown next to each entry in the palette.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bookmark => "bookmark",
            Self::CurrentTab => "current",
            Self::ClosedTab => "closed",
            Self::Pr => "pr",
            Self::Exact => "command",
        }
    }

    /// Label right-padded with `/` so every label lines up, plus one separator.
    pub fn padded_label(&self) -> String {
        let longest = Self::ALL
            .iter()
            .map(|t| t.label().len())
            .max()
            .unwrap_or_default();
        let label = self.label();
        format!("{label}{}", "/".repeat(longest - label.len() + 1))
    }
}

/// One actionable entry in the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: CommandType,
    /// Unique per type and source.
    pub id: String,
    pub icon: String,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_search_url: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_indices: Option<BTreeSet<usize>>,
}
