//! Quick-link tree: the bookmarks bar keyed by first letter, so a folder
//! path can be walked one keystroke at a time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FaviconResolver;
use crate::platform::BookmarkTreeNode;

/// Children keyed by the lowercase first character of their title.
pub type QuickLinksTree = BTreeMap<String, QuickLinksNode>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickLinksNode {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<QuickLinksTree>,
}

fn key_for(title: &str) -> Option<String> {
    title.chars().next().map(|c| c.to_lowercase().collect())
}

fn reduce(node: &BookmarkTreeNode, favicons: &FaviconResolver) -> Option<QuickLinksNode> {
    let key = key_for(&node.title)?;
    match &node.children {
        Some(children) => Some(QuickLinksNode {
            key,
            title: node.title.clone(),
            url: None,
            fav_icon_url: None,
            children: Some(build(children, favicons)),
        }),
        None => Some(QuickLinksNode {
            key,
            title: node.title.clone(),
            fav_icon_url: Some(favicons.resolve(node.url.as_deref())),
            url: node.url.clone(),
            children: None,
        }),
    }
}

/// Reduce sibling nodes into a keyed tree. Untitled nodes are skipped; a later
/// sibling with the same key replaces an earlier one.
pub fn build(nodes: &[BookmarkTreeNode], favicons: &FaviconResolver) -> QuickLinksTree {
    nodes
        .iter()
        .filter_map(|node| reduce(node, favicons))
        .map(|node| (node.key.clone(), node))
        .collect()
}
