//! Background-side dispatch of page requests.
//!
//! Every request goes through [`MessageRouter::dispatch`]. Side-effect
//! requests run to completion in the background and answer nothing; data
//! requests either answer on the spot or hand their [`Responder`] to a
//! spawned task that answers once the data is ready.

mod responder;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub use responder::Responder;

use crate::commands::CommandAggregator;
use crate::config::{Options, OptionsStore};
use crate::error::{PlatformError, ProtocolError};
use crate::platform::{Browser, CreateProperties, TabId, EXTENSIONS_PAGE_URL};
use crate::protocol::{Directive, Envelope, Request, Response, SenderTab};
use crate::tabs::{SharedTracker, TabRecord};

/// How a request was handled.
#[derive(Debug)]
pub enum Dispatch {
    /// A side effect is running; the responder is dropped when it finishes.
    Effect(JoinHandle<()>),
    /// Answered before `dispatch` returned.
    Responded,
    /// The answer is being computed and will arrive on the responder.
    Pending(JoinHandle<()>),
    /// Logged and dropped without a response.
    Rejected(ProtocolError),
}

impl Dispatch {
    /// Whether the requester must keep waiting after `dispatch` returns.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Wait for any background work started by the dispatch.
    pub async fn settled(self) {
        if let Self::Effect(handle) | Self::Pending(handle) = self {
            if let Err(e) = handle.await {
                warn!("request handler task failed: {e}");
            }
        }
    }
}

/// Single dispatch point for page requests.
#[derive(Clone)]
pub struct MessageRouter {
    browser: Arc<dyn Browser>,
    tracker: SharedTracker,
    options: OptionsStore,
}

impl MessageRouter {
    pub fn new(browser: Arc<dyn Browser>, tracker: SharedTracker, options: OptionsStore) -> Self {
        Self {
            browser,
            tracker,
            options,
        }
    }

    /// Current options, read off the runtime thread. Read failures fall back
    /// to defaults.
    async fn load_options(&self) -> Options {
        let store = self.options.clone();
        match tokio::task::spawn_blocking(move || store.get()).await {
            Ok(Ok(options)) => options,
            Ok(Err(e)) => {
                warn!("failed to load options, using defaults: {e:#}");
                Options::default()
            }
            Err(e) => {
                warn!("options reader failed, using defaults: {e}");
                Options::default()
            }
        }
    }

    fn aggregator(&self, options: &Options) -> CommandAggregator {
        CommandAggregator::new(self.browser.clone(), self.tracker.clone())
            .with_favicons(options.favicon_resolver())
            .with_pull_requests(options.pull_request_matcher())
    }

    /// Route one request. Never fails: problems are logged and the requester
    /// sees "no response".
    pub fn dispatch(&self, envelope: Envelope, responder: Responder) -> Dispatch {
        let Some(sender) = envelope.sender.tab else {
            error!(request = ?envelope.request, "dropping request without an originating tab");
            return Dispatch::Rejected(ProtocolError::MissingSenderTab);
        };

        match envelope.request {
            Request::Directive(directive) => self.directive(directive, sender, responder),
            Request::SwitchToTabId(tab_id) => {
                let browser = self.browser.clone();
                effect(responder, "switch tab", async move { browser.activate_tab(tab_id).await })
            }
            Request::RemoveTabId(tab_id) => {
                let browser = self.browser.clone();
                effect(responder, "remove tab", async move { browser.remove_tab(tab_id).await })
            }
            Request::MoveTabOffset(target) => match target.resolve(sender.index) {
                Ok(position) => {
                    let browser = self.browser.clone();
                    effect(responder, "move tab", async move {
                        browser.move_tab(sender.id, position).await.map(drop)
                    })
                }
                Err(e) => {
                    error!(tab_id = sender.id, "dropping move request: {e}");
                    Dispatch::Rejected(e)
                }
            },
            Request::ReopenTab(snapshot) => {
                let browser = self.browser.clone();
                pending(responder, async move {
                    reopen(browser.as_ref(), snapshot)
                        .await
                        .map(|reopened_tab| Response::ReopenedTab { reopened_tab })
                })
            }
            Request::LoadPrsForGithubUsername(identity) => {
                let router = self.clone();
                pending(responder, async move {
                    let aggregator = router.aggregator(&router.load_options().await);
                    let prs = aggregator.pull_requests(&identity).await;
                    Some(Response::PullRequests { prs })
                })
            }
        }
    }

    fn directive(&self, directive: Directive, sender: SenderTab, responder: Responder) -> Dispatch {
        let browser = self.browser.clone();
        match directive {
            Directive::OpenExtensions => effect(responder, "open extensions page", async move {
                let props = CreateProperties {
                    url: EXTENSIONS_PAGE_URL.to_string(),
                    index: None,
                    active: true,
                };
                browser.create_tab(props).await.map(drop)
            }),
            Directive::CloseCurrentTab => effect(responder, "close tab", async move {
                browser.remove_tab(sender.id).await
            }),
            Directive::DuplicateTab => effect(responder, "duplicate tab", async move {
                browser.duplicate_tab(sender.id).await.map(drop)
            }),
            Directive::LoadClosedTabCommands => {
                let closed_tab_commands = self.tracker.lock().list_closed_tab_commands();
                responder.respond(Response::ClosedTabCommands { closed_tab_commands });
                Dispatch::Responded
            }
            Directive::LoadAllCommands => {
                let router = self.clone();
                pending(responder, async move {
                    let options = router.load_options().await;
                    let aggregator = router.aggregator(&options);
                    Some(Response::Commands(aggregator.load_all(options.identity()).await))
                })
            }
            Directive::LoadCurrentTabs => {
                let router = self.clone();
                pending(responder, async move {
                    let aggregator = router.aggregator(&router.load_options().await);
                    let current_tabs = aggregator.current_tabs().await;
                    Some(Response::CurrentTabs { current_tabs })
                })
            }
            Directive::LoadQuickLinks => {
                let router = self.clone();
                pending(responder, async move {
                    let aggregator = router.aggregator(&router.load_options().await);
                    let quick_links = aggregator.quick_links().await;
                    Some(Response::QuickLinks { quick_links })
                })
            }
        }
    }
}

/// Run a best-effort platform call; failures are logged, never retried.
fn effect<F>(responder: Responder, what: &'static str, call: F) -> Dispatch
where
    F: Future<Output = Result<(), PlatformError>> + Send + 'static,
{
    Dispatch::Effect(tokio::spawn(async move {
        if let Err(e) = call.await {
            warn!("{what} failed: {e}");
        }
        drop(responder);
    }))
}

/// Answer from a spawned task. `None` drops the responder unanswered. The
/// work is abandoned as soon as the requester stops waiting.
fn pending<F>(mut responder: Responder, work: F) -> Dispatch
where
    F: Future<Output = Option<Response>> + Send + 'static,
{
    Dispatch::Pending(tokio::spawn(async move {
        let outcome = tokio::select! {
            response = work => Some(response),
            () = responder.closed() => None,
        };
        match outcome {
            Some(Some(response)) => responder.respond(response),
            Some(None) => debug!("request finished without a response"),
            None => debug!("requester went away, request abandoned"),
        }
    }))
}

async fn window_tab_ids(browser: &dyn Browser) -> HashSet<TabId> {
    match browser.current_window_tabs().await {
        Ok(tabs) => tabs.iter().filter_map(|t| t.id).collect(),
        Err(e) => {
            warn!("failed to list tabs: {e}");
            HashSet::new()
        }
    }
}

/// Recreate a closed tab in the background at its old position.
///
/// The new tab is identified by diffing the window before and after creation;
/// the creation result is only a fallback since its metadata may lag.
async fn reopen(browser: &dyn Browser, snapshot: TabRecord) -> Option<TabRecord> {
    let before = window_tab_ids(browser).await;

    let props = CreateProperties {
        url: snapshot.url.clone(),
        index: Some(snapshot.index),
        active: false,
    };
    let created = match browser.create_tab(props).await {
        Ok(tab) => tab,
        Err(e) => {
            warn!(url = %snapshot.url, "failed to reopen tab: {e}");
            return None;
        }
    };

    let after = browser.current_window_tabs().await.unwrap_or_default();
    after
        .iter()
        .find(|tab| tab.id.is_some_and(|id| !before.contains(&id)))
        .and_then(TabRecord::from_browser_tab)
        .or_else(|| TabRecord::from_browser_tab(&created))
}
