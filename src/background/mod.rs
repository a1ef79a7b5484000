//! The background service: sole owner of tab state, fed by two channels.
//!
//! Tab notifications and page requests arrive on separate queues. Pending
//! notifications are always applied before the next request is routed, and
//! each one is applied to completion before the next, so the tracker never
//! sees overlapping mutations.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::config::OptionsStore;
use crate::platform::{Browser, TabEvent};
use crate::protocol::{Envelope, MessageSender, Request, Response};
use crate::router::{MessageRouter, Responder};
use crate::tabs::{SharedTracker, TabTracker};

type PageRequest = (Envelope, Responder);

/// Runs for the lifetime of the background process.
pub struct BackgroundService {
    tracker: SharedTracker,
    router: MessageRouter,
    events: UnboundedReceiver<TabEvent>,
    requests: UnboundedReceiver<PageRequest>,
}

/// Cloneable entry point for page contexts.
#[derive(Debug, Clone)]
pub struct BackgroundHandle {
    requests: UnboundedSender<PageRequest>,
}

impl BackgroundService {
    /// Build the service around `browser`. `events` must carry the browser's
    /// tab notifications in platform order.
    pub fn new(
        browser: Arc<dyn Browser>,
        options: OptionsStore,
        events: UnboundedReceiver<TabEvent>,
    ) -> (Self, BackgroundHandle) {
        let tracker = TabTracker::new().shared();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();

        let service = Self {
            router: MessageRouter::new(browser, tracker.clone(), options),
            tracker,
            events,
            requests: requests_rx,
        };
        (service, BackgroundHandle { requests: requests_tx })
    }

    /// Read-only view of the tracked tabs.
    pub fn tracker(&self) -> SharedTracker {
        self.tracker.clone()
    }

    /// Serve until every [`BackgroundHandle`] is dropped.
    pub async fn run(mut self) {
        info!("background service started");
        loop {
            tokio::select! {
                biased;

                Some(event) = self.events.recv() => {
                    self.tracker.lock().apply(&event);
                }
                request = self.requests.recv() => {
                    let Some((envelope, responder)) = request else {
                        break;
                    };
                    let dispatch = self.router.dispatch(envelope, responder);
                    debug!(?dispatch, "routed request");
                }
            }
        }
        info!("background service stopped");
    }
}

impl BackgroundHandle {
    /// Submit a request; the receiver resolves once it is answered, or errors
    /// if it never will be.
    pub fn submit(&self, envelope: Envelope) -> oneshot::Receiver<Response> {
        let (responder, rx) = Responder::channel();
        if self.requests.send((envelope, responder)).is_err() {
            debug!("background service is gone, request dropped");
        }
        rx
    }

    /// A client speaking for one page.
    pub fn page(&self, sender: MessageSender) -> PageClient {
        PageClient {
            sender,
            handle: self.clone(),
        }
    }
}

/// Sends requests on behalf of a single page context.
#[derive(Debug, Clone)]
pub struct PageClient {
    sender: MessageSender,
    handle: BackgroundHandle,
}

impl PageClient {
    /// Send and wait. `None` means no response: the request carries no
    /// payload, was rejected, or the service went away.
    pub async fn send(&self, request: impl Into<Request>) -> Option<Response> {
        self.handle
            .submit(Envelope::new(self.sender, request))
            .await
            .ok()
    }

    /// Fire and forget.
    pub fn post(&self, request: impl Into<Request>) {
        drop(self.handle.submit(Envelope::new(self.sender, request)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::platform::MemoryBrowser;
    use crate::protocol::{Directive, MoveTarget};

    struct Harness {
        browser: Arc<MemoryBrowser>,
        handle: BackgroundHandle,
        tracker: SharedTracker,
    }

    fn start() -> Harness {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let browser = Arc::new(MemoryBrowser::new().with_events(events_tx));
        let (service, handle) = BackgroundService::new(
            browser.clone(),
            OptionsStore::in_memory(Options::default()),
            events_rx,
        );
        let tracker = service.tracker();
        tokio::spawn(service.run());
        Harness {
            browser,
            handle,
            tracker,
        }
    }

    fn page_for(h: &Harness, tab_id: i64) -> PageClient {
        let tab = h
            .browser
            .tabs()
            .into_iter()
            .find(|t| t.id == Some(tab_id))
            .unwrap();
        h.handle.page(MessageSender::tab(tab_id, tab.index))
    }

    async fn closed_ids(page: &PageClient) -> Vec<String> {
        match page.send(Directive::LoadClosedTabCommands).await {
            Some(Response::ClosedTabCommands { closed_tab_commands }) => {
                closed_tab_commands.into_iter().map(|c| c.id).collect()
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn closing_a_tab_from_the_page_records_it_as_closed() {
        let h = start();
        let keep = h.browser.open("https://keep.test/", "Keep");
        let doomed = h.browser.open("https://doomed.test/", "Doomed");

        let doomed_page = page_for(&h, doomed.id.unwrap());
        assert_eq!(doomed_page.send(Directive::CloseCurrentTab).await, None);

        let keep_page = page_for(&h, keep.id.unwrap());
        assert_eq!(
            closed_ids(&keep_page).await,
            vec![format!("CLOSED_TAB-{}", doomed.id.unwrap())]
        );
        assert_eq!(h.tracker.lock().open_tabs().len(), 1);
    }

    #[tokio::test]
    async fn closed_tabs_are_listed_newest_first() {
        let h = start();
        let home = h.browser.open("https://home.test/", "Home");
        let ids: Vec<_> = (0..3)
            .map(|n| h.browser.open(&format!("https://{n}.test/"), "t").id.unwrap())
            .collect();

        let home_page = page_for(&h, home.id.unwrap());
        for id in &ids {
            home_page.send(Request::RemoveTabId(*id)).await;
        }

        let expected: Vec<_> = ids.iter().rev().map(|id| format!("CLOSED_TAB-{id}")).collect();
        assert_eq!(closed_ids(&home_page).await, expected);
    }

    #[tokio::test]
    async fn tabs_that_never_finished_loading_securely_leave_no_trace() {
        let h = start();
        let home = h.browser.open("https://home.test/", "Home");
        let plain = h.browser.open("http://plain.test/", "Plain");

        let home_page = page_for(&h, home.id.unwrap());
        home_page.send(Request::RemoveTabId(plain.id.unwrap())).await;

        assert!(closed_ids(&home_page).await.is_empty());
    }

    #[tokio::test]
    async fn reopened_tab_comes_back_at_its_old_index() {
        let h = start();
        let home = h.browser.open("https://home.test/", "Home");
        let gone = h.browser.open("https://gone.test/", "Gone");
        h.browser.open("https://last.test/", "Last");

        let home_page = page_for(&h, home.id.unwrap());
        home_page.send(Request::RemoveTabId(gone.id.unwrap())).await;
        assert_eq!(closed_ids(&home_page).await.len(), 1);

        let snapshot = h.tracker.lock().closed_tabs().get(0).unwrap().record().clone();
        let reopened = match home_page.send(Request::ReopenTab(snapshot)).await {
            Some(Response::ReopenedTab { reopened_tab }) => reopened_tab,
            other => panic!("unexpected response: {other:?}"),
        };

        assert_eq!(reopened.url, "https://gone.test/");
        assert_eq!(reopened.index, 1);
    }

    #[tokio::test]
    async fn move_offset_uses_the_sender_position() {
        let h = start();
        for n in 0..7 {
            h.browser.open(&format!("https://{n}.test/"), "t");
        }
        let sixth = h.browser.tabs()[5].id.unwrap();

        let page = page_for(&h, sixth);
        page.send(Request::MoveTabOffset(MoveTarget::Offset(-2))).await;

        assert_eq!(h.browser.tabs()[3].id, Some(sixth));
    }

    #[tokio::test]
    async fn pages_without_a_tab_get_nothing_back() {
        let h = start();
        let page = h.handle.page(MessageSender::default());
        assert_eq!(page.send(Directive::LoadAllCommands).await, None);
    }

    #[tokio::test]
    async fn service_stops_when_handles_are_dropped() {
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let (service, handle) = BackgroundService::new(
            Arc::new(MemoryBrowser::new()),
            OptionsStore::in_memory(Options::default()),
            events_rx,
        );
        let task = tokio::spawn(service.run());
        drop(handle);
        task.await.unwrap();
    }
}
