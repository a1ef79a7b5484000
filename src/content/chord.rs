//! The `g`-chord key machine.

use std::time::Instant;

use tracing::debug;

use super::bindings::{KeyBinding, KeyMap, CHORD_PREFIX};
use super::focus::{ActiveElement, FocusGuard};
use super::{ChordAction, ChordConfig};

/// Where the machine is between key presses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChordState {
    #[default]
    Idle,
    /// `g` was pressed at this instant.
    GPending(Instant),
}

/// A raw key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: char,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: char) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: char) -> Self {
        Self { key, shift: true }
    }

    /// Key used for lookup: upper-cased under shift, and `4` read as `$` so
    /// `g4` works without reaching for shift.
    fn lookup_key(&self) -> char {
        let key = if self.shift {
            self.key.to_uppercase().next().unwrap_or(self.key)
        } else {
            self.key
        };
        if key == '4' {
            '$'
        } else {
            key
        }
    }
}

/// Per-page chord recognizer.
#[derive(Debug, Clone)]
pub struct ChordKeyMachine {
    config: ChordConfig,
    keymap: KeyMap,
    state: ChordState,
    focus: FocusGuard,
    disabled: bool,
}

impl ChordKeyMachine {
    /// Machine with the default key map for a page at `page_url`.
    pub fn new(config: ChordConfig, page_url: &str) -> Self {
        let keymap = KeyMap::new(config.scroll_smooth);
        Self::with_keymap(config, keymap, page_url)
    }

    pub fn with_keymap(config: ChordConfig, keymap: KeyMap, page_url: &str) -> Self {
        let disabled = config.deny_list.iter().any(|d| page_url.contains(d.as_str()));
        if disabled {
            debug!(page_url, "chorded keys disabled on this page");
        }
        Self {
            config,
            keymap,
            state: ChordState::Idle,
            focus: FocusGuard::default(),
            disabled,
        }
    }

    /// Whether the page matched the deny-list.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn state(&self) -> ChordState {
        self.state
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn focus_in(&mut self) {
        self.focus.focus_in();
    }

    pub fn focus_out(&mut self) {
        self.focus.focus_out();
    }

    fn within_window(&self, now: Instant) -> Option<bool> {
        match self.state {
            ChordState::Idle => None,
            ChordState::GPending(pressed) => {
                Some(now.saturating_duration_since(pressed) <= self.config.double_press_window)
            }
        }
    }

    fn run(binding: &KeyBinding, page_url: &str) -> Option<ChordAction> {
        if binding.allowed_on(page_url) {
            Some(binding.action.clone())
        } else {
            debug!(key = %binding.key, page_url, "binding not allowed on this page");
            None
        }
    }

    /// Feed one key press. Returns the action to perform, if any.
    pub fn handle_key(
        &mut self,
        press: KeyPress,
        active: Option<&ActiveElement>,
        page_url: &str,
        now: Instant,
    ) -> Option<ChordAction> {
        if self.disabled || self.focus.blocks(active) {
            return None;
        }
        let key = press.lookup_key();

        match self.within_window(now) {
            Some(true) => {
                if let Some(binding) = self.keymap.find_double(key) {
                    self.state = ChordState::Idle;
                    return Self::run(binding, page_url);
                }
            }
            Some(false) => self.state = ChordState::Idle,
            None => {}
        }

        if key == CHORD_PREFIX {
            self.state = ChordState::GPending(now);
            return None;
        }
        self.keymap
            .find_single(key)
            .and_then(|binding| Self::run(binding, page_url))
    }
}
