//! Key binding tables for the chord machine.
//!
//! Two tables: double-press bindings (reached through `g`) and single-key
//! bindings. Lookup is case-sensitive; the tables are disjoint by
//! convention except where a `g` chord deliberately shadows a plain key.

use super::navigation::{NEXT_PAGE, PREV_PAGE};
use super::{ChordAction, PageAction};
use crate::protocol::{Directive, MoveTarget, OverlayAction, Request};

/// Key that starts a double-press chord.
pub const CHORD_PREFIX: char = 'g';

/// A key bound to an action.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBinding {
    pub key: char,
    /// Shown in help listings
    pub description: String,
    pub action: ChordAction,
    /// URL substrings the binding is limited to; `None` means everywhere.
    pub urls: Option<Vec<String>>,
}

impl KeyBinding {
    pub fn new(key: char, description: impl Into<String>, action: impl Into<ChordAction>) -> Self {
        Self {
            key,
            description: description.into(),
            action: action.into(),
            urls: None,
        }
    }

    /// Limit the binding to pages whose URL contains one of `urls`.
    pub fn only_on<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = Some(urls.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the binding may run on `page_url`. An empty list counts as no
    /// list.
    pub fn allowed_on(&self, page_url: &str) -> bool {
        match self.urls.as_deref() {
            None | Some([]) => true,
            Some(urls) => urls.iter().any(|u| page_url.contains(u.as_str())),
        }
    }
}

/// Both binding tables.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    pub double: Vec<KeyBinding>,
    pub single: Vec<KeyBinding>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new(true)
    }
}

impl KeyMap {
    /// The default tables. `smooth` picks the scroll behaviour.
    pub fn new(smooth: bool) -> Self {
        Self {
            double: Self::default_double(smooth),
            single: Self::default_single(smooth),
        }
    }

    fn default_double(smooth: bool) -> Vec<KeyBinding> {
        vec![
            KeyBinding::new('g', "Scroll to top of page", PageAction::ScrollTop { smooth }),
            KeyBinding::new('e', "Open extensions page", Directive::OpenExtensions),
            KeyBinding::new('n', "Next page (increment last number in URL)", PageAction::PageOffset(NEXT_PAGE)),
            KeyBinding::new('h', "Next page (alias)", PageAction::PageOffset(NEXT_PAGE)),
            KeyBinding::new('d', "Previous page (decrement last number in URL)", PageAction::PageOffset(PREV_PAGE)),
            KeyBinding::new('b', "Previous page (alias)", PageAction::PageOffset(PREV_PAGE)),
            KeyBinding::new('v', "Open video source URL", PageAction::OpenVideoSource),
            KeyBinding::new('m', "Search for highlighted text", PageAction::SearchSelection),
            KeyBinding::new('D', "Duplicate current tab", Directive::DuplicateTab),
            KeyBinding::new('r', "Open command center", OverlayAction::OpenCommandCenter),
            KeyBinding::new('t', "Open tab center", OverlayAction::OpenTabCenter),
            KeyBinding::new('q', "Open quick links", OverlayAction::OpenQuickLinks),
            KeyBinding::new(
                '0',
                "Move tab to the far left",
                Request::MoveTabOffset(MoveTarget::Sentinel(MoveTarget::START.into())),
            ),
            KeyBinding::new(
                '$',
                "Move tab to the far right",
                Request::MoveTabOffset(MoveTarget::Sentinel(MoveTarget::END.into())),
            ),
        ]
    }

    fn default_single(smooth: bool) -> Vec<KeyBinding> {
        vec![
            KeyBinding::new('G', "Scroll to bottom of page", PageAction::ScrollBottom { smooth }),
            KeyBinding::new('r', "Reload page", PageAction::Reload),
            KeyBinding::new('x', "Close current tab", Directive::CloseCurrentTab),
            KeyBinding::new('<', "Move tab left", Request::MoveTabOffset(MoveTarget::Offset(-1))),
            KeyBinding::new('>', "Move tab right", Request::MoveTabOffset(MoveTarget::Offset(1))),
        ]
    }

    pub fn find_double(&self, key: char) -> Option<&KeyBinding> {
        self.double.iter().find(|b| b.key == key)
    }

    pub fn find_single(&self, key: char) -> Option<&KeyBinding> {
        self.single.iter().find(|b| b.key == key)
    }

    /// `(keys, description)` pairs for a help listing, chords first.
    pub fn describe(&self) -> Vec<(String, &str)> {
        let chords = self
            .double
            .iter()
            .map(|b| (format!("{CHORD_PREFIX}{}", b.key), b.description.as_str()));
        let singles = self
            .single
            .iter()
            .map(|b| (b.key.to_string(), b.description.as_str()));
        chords.chain(singles).collect()
    }
}
