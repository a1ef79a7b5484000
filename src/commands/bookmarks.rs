//! Bookmark-bar flattening into breadcrumb-titled commands.

use super::{Command, CommandType, FaviconResolver};
use crate::platform::BookmarkTreeNode;

/// Id the bookmarks bar has on Chromium-family hosts.
pub const BOOKMARKS_BAR_ID: &str = "1";

/// Titles the bookmarks bar goes by across hosts and locales.
pub const BOOKMARKS_BAR_LABELS: &[&str] = &[
    "Bookmarks Bar",
    "Bookmarks bar",
    "Favorites bar",
    "Favourites bar",
    "Lesezeichenleiste",
    "Barre de favoris",
    "Barra de marcadores",
    "Barra dei preferiti",
];

/// Separator between ancestor titles.
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// A bookmark node with its children stripped and its breadcrumb computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBookmark {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    /// Ancestor titles below the bookmarks bar, joined with `" > "`, ending
    /// with this node's own title.
    pub full_title: String,
    pub url: Option<String>,
    pub date_added: Option<i64>,
    pub date_last_used: Option<i64>,
}

/// Locate the bookmarks-bar folder under the invisible root.
///
/// Prefers the well-known id, then any root child whose title is one of the
/// known labels. Returns `None` rather than failing when neither is present.
pub fn find_bookmarks_bar(tree: &[BookmarkTreeNode]) -> Option<&BookmarkTreeNode> {
    let top_level: Vec<&BookmarkTreeNode> = tree
        .iter()
        .flat_map(|root| root.children.iter().flatten())
        .collect();

    top_level
        .iter()
        .find(|node| node.id == BOOKMARKS_BAR_ID && node.is_folder())
        .or_else(|| {
            top_level
                .iter()
                .find(|node| node.is_folder() && BOOKMARKS_BAR_LABELS.contains(&node.title.as_str()))
        })
        .copied()
}

/// Depth-first, pre-order flattening of `nodes` and all their descendants.
pub fn flatten(nodes: &[BookmarkTreeNode]) -> Vec<FlatBookmark> {
    fn walk(nodes: &[BookmarkTreeNode], trail: Option<&str>, out: &mut Vec<FlatBookmark>) {
        for node in nodes {
            let full_title = match trail {
                Some(parent) => format!("{parent}{BREADCRUMB_SEPARATOR}{}", node.title),
                None => node.title.clone(),
            };
            out.push(FlatBookmark {
                id: node.id.clone(),
                parent_id: node.parent_id.clone(),
                title: node.title.clone(),
                full_title: full_title.clone(),
                url: node.url.clone(),
                date_added: node.date_added,
                date_last_used: node.date_last_used,
            });
            if let Some(children) = &node.children {
                walk(children, Some(&full_title), out);
            }
        }
    }

    let mut out = Vec::new();
    walk(nodes, None, &mut out);
    out
}

fn numeric_id(bookmark: &FlatBookmark) -> u64 {
    bookmark.id.parse().unwrap_or(u64::MAX)
}

/// Turn the bookmarks-bar contents into `BOOKMARK` commands.
///
/// Output is ordered by numeric id; folders are dropped; `sortDate` is the
/// last-used time when the host reports one, otherwise the date added.
pub fn bookmark_commands(bar_children: &[BookmarkTreeNode], favicons: &FaviconResolver) -> Vec<Command> {
    let mut flattened = flatten(bar_children);
    flattened.sort_by_key(numeric_id);

    flattened
        .into_iter()
        .filter(|b| b.url.is_some())
        .map(|b| Command {
            kind: CommandType::Bookmark,
            id: format!("{}-{}", CommandType::Bookmark.as_str(), b.id),
            icon: favicons.resolve(b.url.as_deref()),
            url: b.url.unwrap_or_default(),
            title: b.full_title,
            sort_date: b.date_last_used.or(b.date_added),
            is_search_url: None,
            match_indices: None,
        })
        .collect()
}

/// Bookmark commands for a whole tree; empty when no bookmarks bar exists.
pub fn tree_to_commands(tree: &[BookmarkTreeNode], favicons: &FaviconResolver) -> Vec<Command> {
    find_bookmarks_bar(tree)
        .and_then(|bar| bar.children.as_deref())
        .map(|children| bookmark_commands(children, favicons))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, parent: &str, title: &str, children: Vec<BookmarkTreeNode>) -> BookmarkTreeNode {
        BookmarkTreeNode {
            id: id.into(),
            parent_id: Some(parent.into()),
            title: title.into(),
            children: Some(children),
            ..Default::default()
        }
    }

    fn leaf(id: &str, parent: &str, title: &str, url: &str) -> BookmarkTreeNode {
        BookmarkTreeNode {
            id: id.into(),
            parent_id: Some(parent.into()),
            title: title.into(),
            url: Some(url.into()),
            date_added: Some(100),
            ..Default::default()
        }
    }

    fn root(children: Vec<BookmarkTreeNode>) -> Vec<BookmarkTreeNode> {
        vec![BookmarkTreeNode {
            id: "0".into(),
            children: Some(children),
            ..Default::default()
        }]
    }

    fn sample_tree() -> Vec<BookmarkTreeNode> {
        root(vec![
            folder(
                "1",
                "0",
                "Bookmarks Bar",
                vec![
                    leaf("5", "1", "News", "https://news.test"),
                    folder(
                        "6",
                        "1",
                        "Work",
                        vec![
                            leaf("7", "6", "CI", "https://ci.test"),
                            folder("8", "6", "Deploy", vec![leaf("9", "8", "Prod", "https://prod.test")]),
                        ],
                    ),
                ],
            ),
            folder("2", "0", "Other Bookmarks", vec![leaf("3", "2", "Hidden", "https://hidden.test")]),
        ])
    }

    #[test]
    fn leaf_titles_are_ancestor_breadcrumbs() {
        let commands = tree_to_commands(&sample_tree(), &FaviconResolver::default());
        let titles: Vec<_> = commands.iter().map(|c| c.title.as_str()).collect();

        assert_eq!(titles, vec!["News", "Work > CI", "Work > Deploy > Prod"]);
    }

    #[test]
    fn folders_and_other_roots_are_excluded() {
        let commands = tree_to_commands(&sample_tree(), &FaviconResolver::default());
        assert!(commands.iter().all(|c| c.id != "BOOKMARK-6"));
        assert!(commands.iter().all(|c| c.url != "https://hidden.test"));
    }

    #[test]
    fn breadcrumbs_hold_when_children_have_lower_ids_than_parents() {
        let tree = root(vec![folder(
            "1",
            "0",
            "Bookmarks Bar",
            vec![folder("40", "1", "Later", vec![leaf("12", "40", "Moved", "https://moved.test")])],
        )]);

        let commands = tree_to_commands(&tree, &FaviconResolver::default());
        assert_eq!(commands[0].title, "Later > Moved");
    }

    #[test]
    fn sort_date_prefers_last_used() {
        let mut used = leaf("5", "1", "Used", "https://used.test");
        used.date_last_used = Some(900);
        let tree = root(vec![folder(
            "1",
            "0",
            "Bookmarks Bar",
            vec![used, leaf("6", "1", "Fresh", "https://fresh.test")],
        )]);

        let commands = tree_to_commands(&tree, &FaviconResolver::default());
        assert_eq!(commands[0].sort_date, Some(900));
        assert_eq!(commands[1].sort_date, Some(100));
    }

    #[test]
    fn bar_is_found_by_localized_label_when_id_differs() {
        let tree = root(vec![folder(
            "toolbar_____",
            "0",
            "Lesezeichenleiste",
            vec![leaf("20", "toolbar_____", "Zeitung", "https://zeitung.test")],
        )]);

        let commands = tree_to_commands(&tree, &FaviconResolver::default());
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].id, "BOOKMARK-20");
    }

    #[test]
    fn missing_bar_yields_no_commands() {
        let tree = root(vec![folder("2", "0", "Other Bookmarks", vec![])]);
        assert!(tree_to_commands(&tree, &FaviconResolver::default()).is_empty());
        assert!(tree_to_commands(&[], &FaviconResolver::default()).is_empty());
    }
}
