//! Recently visited pull requests, mined from browsing history.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Command, CommandType, FaviconResolver};
use crate::platform::{HistoryItem, HistoryQuery};

/// Most pull requests returned.
pub const MAX_PULL_REQUESTS: usize = 50;

/// Most history entries scanned per lookup.
pub const MAX_HISTORY_RESULTS: usize = 1000;

/// How far back history is searched.
pub const LOOKBACK_WEEKS: i64 = 4;

/// Default code host.
pub const DEFAULT_PULL_REQUEST_HOST: &str = "github.com";

/// A pull request recovered from one history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub id: u64,
    /// Canonical pull-request URL, without sub-pages or query.
    pub url: String,
    pub org: String,
    pub repo: String,
    pub title: String,
    pub last_visit_time: i64,
    pub visit_count: u32,
    /// `"<repo>: <title>"`
    pub search_entry: String,
}

impl PullRequest {
    /// `org/repo/id`, the identity used for de-duplication.
    pub fn composite_id(&self) -> String {
        format!("{}/{}/{}", self.org, self.repo, self.id)
    }

    pub fn to_command(&self, favicons: &FaviconResolver) -> Command {
        Command {
            kind: CommandType::Pr,
            id: format!("pr-{}", self.composite_id()),
            icon: favicons.resolve(Some(&self.url)),
            url: self.url.clone(),
            title: self.search_entry.clone(),
            sort_date: Some(self.last_visit_time),
            is_search_url: None,
            match_indices: None,
        }
    }
}

/// Recognizes pull-request pages on one code host.
#[derive(Debug, Clone)]
pub struct PullRequestMatcher {
    host: String,
    url_re: Regex,
    title_re: Regex,
}

impl Default for PullRequestMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_PULL_REQUEST_HOST)
    }
}

impl PullRequestMatcher {
    pub fn new(host: &str) -> Self {
        let url_pattern = format!(
            r"^(?P<url>https://{}/(?P<org>[\w.-]+)/(?P<repo>[\w.-]+)/pull/(?P<id>\d+))",
            regex::escape(host)
        );
        Self {
            host: host.to_string(),
            url_re: Regex::new(&url_pattern).expect("escaped host always forms a valid pattern"),
            title_re: Regex::new(r"^(?P<title>.+?) ·").expect("static pattern"),
        }
    }

    /// History search for pull requests authored by `identity`, looking back
    /// four weeks from `now`.
    pub fn history_query(&self, identity: &str, now: DateTime<Utc>) -> HistoryQuery {
        HistoryQuery {
            text: format!("{} pull request by {identity}", self.host),
            start_time: (now - Duration::weeks(LOOKBACK_WEEKS)).timestamp_millis(),
            max_results: MAX_HISTORY_RESULTS,
        }
    }

    /// Parse one history entry; `None` if either the URL or the title does
    /// not look like a pull request.
    pub fn parse(&self, item: &HistoryItem) -> Option<PullRequest> {
        let caps = self.url_re.captures(item.url.as_deref()?)?;
        let title = self
            .title_re
            .captures(item.title.as_deref()?)?
            .name("title")?
            .as_str()
            .to_string();
        let repo = caps["repo"].to_string();

        Some(PullRequest {
            id: caps["id"].parse().ok()?,
            url: caps["url"].to_string(),
            org: caps["org"].to_string(),
            search_entry: format!("{repo}: {title}"),
            repo,
            title,
            last_visit_time: item.last_visit_time.unwrap_or_default(),
            visit_count: item.visit_count.unwrap_or_default(),
        })
    }

    /// Pull requests in `items`: unparseable entries dropped, first visit of
    /// each `org/repo/id` kept, oldest visit first, at most fifty.
    pub fn extract(&self, items: &[HistoryItem]) -> Vec<PullRequest> {
        let mut seen = HashSet::new();
        let mut prs: Vec<PullRequest> = items
            .iter()
            .filter_map(|item| self.parse(item))
            .filter(|pr| seen.insert(pr.composite_id()))
            .collect();

        prs.sort_by_key(|pr| pr.last_visit_time);
        prs.truncate(MAX_PULL_REQUESTS);
        prs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(url: &str, title: &str, at: i64) -> HistoryItem {
        HistoryItem {
            url: Some(url.into()),
            title: Some(title.into()),
            last_visit_time: Some(at),
            visit_count: Some(1),
        }
    }

    #[test]
    fn parses_url_parts_and_title_prefix() {
        let matcher = PullRequestMatcher::default();
        let pr = matcher
            .parse(&visit(
                "https://github.com/acme/rocket-sled/pull/42/files?w=1",
                "Add brakes by alice · Pull Request #42 · acme/rocket-sled",
                500,
            ))
            .unwrap();

        assert_eq!(pr.id, 42);
        assert_eq!(pr.org, "acme");
        assert_eq!(pr.repo, "rocket-sled");
        assert_eq!(pr.url, "https://github.com/acme/rocket-sled/pull/42");
        assert_eq!(pr.title, "Add brakes by alice");
        assert_eq!(pr.search_entry, "rocket-sled: Add brakes by alice");
    }

    #[test]
    fn entries_failing_either_pattern_are_dropped() {
        let matcher = PullRequestMatcher::default();
        let items = vec![
            visit("https://github.com/acme/sled/issues/3", "Bug · Issue #3", 1),
            visit("https://github.com/acme/sled/pull/4", "No separator here", 2),
            visit("https://gitlab.com/acme/sled/pull/5", "Elsewhere · x", 3),
            visit("https://github.com/acme/sled/pull/6", "Good one · Pull Request", 4),
        ];

        let prs = matcher.extract(&items);
        assert_eq!(prs.len(), 1);
        assert_eq!(prs[0].id, 6);
    }

    #[test]
    fn duplicate_visits_keep_first_seen_entry() {
        let matcher = PullRequestMatcher::default();
        let items = vec![
            visit("https://github.com/org/repo/pull/42", "First title · PR", 300),
            visit("https://github.com/org/repo/pull/42/commits", "Second title · PR", 100),
            visit("https://github.com/other/repo/pull/42", "Same number · PR", 200),
        ];

        let prs = matcher.extract(&items);
        let for_42: Vec<_> = prs.iter().filter(|p| p.org == "org").collect();
        assert_eq!(for_42.len(), 1);
        assert_eq!(for_42[0].title, "First title");
        assert_eq!(for_42[0].last_visit_time, 300);
        assert_eq!(prs.len(), 2);
    }

    #[test]
    fn output_is_sorted_ascending_and_capped() {
        let matcher = PullRequestMatcher::default();
        let items: Vec<_> = (0..80)
            .rev()
            .map(|n| visit(&format!("https://github.com/o/r/pull/{n}"), "T · PR", n))
            .collect();

        let prs = matcher.extract(&items);
        assert_eq!(prs.len(), MAX_PULL_REQUESTS);
        assert!(prs.windows(2).all(|w| w[0].last_visit_time <= w[1].last_visit_time));
        assert_eq!(prs[0].last_visit_time, 0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let matcher = PullRequestMatcher::default();
        let items = vec![
            visit("https://github.com/o/r/pull/1", "A · PR", 2),
            visit("https://github.com/o/r/pull/1", "A · PR", 1),
            visit("https://github.com/o/r/pull/2", "B · PR", 3),
        ];

        assert_eq!(matcher.extract(&items), matcher.extract(&items));
    }

    #[test]
    fn history_query_covers_four_weeks() {
        let matcher = PullRequestMatcher::default();
        let now = DateTime::from_timestamp_millis(10_000_000_000).unwrap();
        let query = matcher.history_query("alice", now);

        assert_eq!(query.text, "github.com pull request by alice");
        assert_eq!(query.start_time, 10_000_000_000 - 4 * 7 * 24 * 60 * 60 * 1000);
        assert_eq!(query.max_results, MAX_HISTORY_RESULTS);
    }

    #[test]
    fn command_id_is_unique_per_repository() {
        let matcher = PullRequestMatcher::default();
        let pr = matcher
            .parse(&visit("https://github.com/o/r/pull/9", "Nine · PR", 1))
            .unwrap();
        let command = pr.to_command(&FaviconResolver::default());

        assert_eq!(command.kind, CommandType::Pr);
        assert_eq!(command.id, "pr-o/r/9");
        assert_eq!(command.title, "r: Nine");
    }
}
