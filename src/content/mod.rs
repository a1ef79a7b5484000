//! Page-side logic: chorded keys and the overlay.
//!
//! [`PageContext`] wires one page together. Key presses go through the
//! [`ChordKeyMachine`]; background requests are posted to the service, page
//! signals drive the [`OverlayLifecycle`], and anything that touches the page
//! itself (scrolling, reloading, navigating) is handed back to the caller.

pub mod bindings;
pub mod chord;
pub mod focus;
pub mod navigation;
pub mod overlay;

use std::time::{Duration, Instant};

use serde_json::Value;

pub use bindings::{KeyBinding, KeyMap};
pub use chord::{ChordKeyMachine, ChordState, KeyPress};
pub use focus::ActiveElement;
pub use overlay::{OverlayHost, OverlayKind, OverlayLifecycle, CONTAINER_ID};

use crate::background::PageClient;
use crate::config::Options;
use crate::protocol::{Directive, OverlayAction, Request};

/// Chord machine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordConfig {
    /// Longest gap between `g` and the second key of a chord.
    pub double_press_window: Duration,
    /// URL substrings on which the machine is switched off.
    pub deny_list: Vec<String>,
    pub scroll_smooth: bool,
}

impl Default for ChordConfig {
    fn default() -> Self {
        Options::default().chord_config()
    }
}

/// Something only the page itself can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    ScrollTop { smooth: bool },
    ScrollBottom { smooth: bool },
    Reload,
    /// Shift the last number in the URL by this much.
    PageOffset(i64),
    Navigate(String),
    OpenVideoSource,
    SearchSelection,
}

/// What a binding does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordAction {
    /// Send a request to the background service.
    Background(Request),
    /// Post a same-page signal.
    Signal(OverlayAction),
    Page(PageAction),
}

impl From<Request> for ChordAction {
    fn from(request: Request) -> Self {
        Self::Background(request)
    }
}

impl From<Directive> for ChordAction {
    fn from(directive: Directive) -> Self {
        Self::Background(directive.into())
    }
}

impl From<OverlayAction> for ChordAction {
    fn from(action: OverlayAction) -> Self {
        Self::Signal(action)
    }
}

impl From<PageAction> for ChordAction {
    fn from(action: PageAction) -> Self {
        Self::Page(action)
    }
}

/// Everything running inside one page.
pub struct PageContext<H> {
    url: String,
    keys: ChordKeyMachine,
    overlay: OverlayLifecycle<H>,
    client: PageClient,
}

impl<H: OverlayHost> PageContext<H> {
    pub fn new(url: impl Into<String>, options: &Options, host: H, client: PageClient) -> Self {
        let url = url.into();
        Self {
            keys: ChordKeyMachine::new(options.chord_config(), &url),
            overlay: OverlayLifecycle::new(host),
            client,
            url,
        }
    }

    pub fn overlay(&self) -> &OverlayLifecycle<H> {
        &self.overlay
    }

    /// Feed a key press. Returns the page action the caller should perform.
    pub fn on_key(&mut self, press: KeyPress, active: Option<&ActiveElement>, now: Instant) -> Option<PageAction> {
        match self.keys.handle_key(press, active, &self.url, now)? {
            ChordAction::Background(request) => {
                self.client.post(request);
                None
            }
            ChordAction::Signal(action) => {
                self.overlay.handle_action(action);
                None
            }
            ChordAction::Page(PageAction::PageOffset(offset)) => {
                navigation::offset_last_number(&self.url, offset).map(PageAction::Navigate)
            }
            ChordAction::Page(action) => Some(action),
        }
    }

    /// Forward a page `message` event to the overlay.
    pub fn on_message(&mut self, message: &Value) -> bool {
        self.overlay.on_message(message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::overlay::tests::RecordingHost;
    use super::*;
    use crate::background::BackgroundService;
    use crate::config::OptionsStore;
    use crate::platform::MemoryBrowser;
    use crate::protocol::{MessageSender, Response};

    const URL: &str = "https://forum.test/thread/41/page/7";

    fn page(client: PageClient) -> PageContext<RecordingHost> {
        PageContext::new(URL, &Options::default(), RecordingHost::default(), client)
    }

    fn detached_client() -> PageClient {
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let (_service, handle) = BackgroundService::new(
            Arc::new(MemoryBrowser::new()),
            OptionsStore::in_memory(Options::default()),
            events_rx,
        );
        handle.page(MessageSender::tab(1, 0))
    }

    #[test]
    fn chord_opens_overlay_locally() {
        let mut page = page(detached_client());
        let t0 = Instant::now();

        assert_eq!(page.on_key(KeyPress::new('g'), None, t0), None);
        assert_eq!(page.on_key(KeyPress::new('r'), None, t0 + Duration::from_millis(20)), None);
        assert_eq!(page.overlay().current(), Some(OverlayKind::CommandCenter));
    }

    #[test]
    fn page_offset_becomes_navigation() {
        let mut page = page(detached_client());
        let t0 = Instant::now();

        page.on_key(KeyPress::new('g'), None, t0);
        assert_eq!(
            page.on_key(KeyPress::new('n'), None, t0 + Duration::from_millis(20)),
            Some(PageAction::Navigate("https://forum.test/thread/41/page/8".into()))
        );
    }

    #[test]
    fn page_only_actions_are_returned() {
        let mut page = page(detached_client());
        assert_eq!(
            page.on_key(KeyPress::new('r'), None, Instant::now()),
            Some(PageAction::Reload)
        );
    }

    #[tokio::test]
    async fn background_bindings_reach_the_service() {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let browser = Arc::new(MemoryBrowser::new().with_events(events_tx));
        let first = browser.open("https://a.test/", "a");
        let second = browser.open(URL, "thread");
        let (service, handle) = BackgroundService::new(
            browser.clone(),
            OptionsStore::in_memory(Options::default()),
            events_rx,
        );
        tokio::spawn(service.run());

        let client = handle.page(MessageSender::tab(second.id.unwrap(), 1));
        let mut page = page(client.clone());
        assert_eq!(page.on_key(KeyPress::new('x'), None, Instant::now()), None);

        let remaining = match client.send(Directive::LoadCurrentTabs).await {
            Some(Response::CurrentTabs { current_tabs }) => current_tabs,
            other => panic!("unexpected response: {other:?}"),
        };
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first.id.unwrap());
    }
}
