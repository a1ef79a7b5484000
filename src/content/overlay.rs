//! Mounting and tearing down the single in-page overlay.

use serde_json::Value;
use tracing::debug;

use crate::protocol::{OverlayAction, PageSignal};

/// Id of the one container element overlays render into.
pub const CONTAINER_ID: &str = "commandcenter-container";

/// Which overlay is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    CommandCenter,
    TabCenter,
    QuickLinks,
}

/// The page document, as far as the overlay is concerned. Rendering into the
/// container is the host's business.
pub trait OverlayHost {
    fn has_container(&self, id: &str) -> bool;

    fn create_container(&mut self, id: &str);

    /// Unmount whatever is rendered in the container and remove it.
    fn remove_container(&mut self, id: &str);

    fn mount(&mut self, id: &str, kind: OverlayKind);
}

/// Keeps at most one overlay mounted.
#[derive(Debug)]
pub struct OverlayLifecycle<H> {
    host: H,
    current: Option<OverlayKind>,
}

impl<H: OverlayHost> OverlayLifecycle<H> {
    pub fn new(host: H) -> Self {
        Self { host, current: None }
    }

    pub fn current(&self) -> Option<OverlayKind> {
        self.current
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Replace whatever is mounted with `kind`. A leftover container from an
    /// earlier mount is removed first.
    pub fn open(&mut self, kind: OverlayKind) {
        if self.host.has_container(CONTAINER_ID) {
            self.host.remove_container(CONTAINER_ID);
        }
        self.host.create_container(CONTAINER_ID);
        self.host.mount(CONTAINER_ID, kind);
        self.current = Some(kind);
    }

    /// Tear down the overlay. Returns whether anything was mounted.
    pub fn close(&mut self) -> bool {
        let had_container = self.host.has_container(CONTAINER_ID);
        if had_container {
            self.host.remove_container(CONTAINER_ID);
        }
        self.current.take().is_some() || had_container
    }

    /// Click on the container background, outside the overlay itself.
    pub fn on_background_click(&mut self) {
        self.close();
    }

    pub fn on_escape(&mut self) {
        self.close();
    }

    pub fn handle_action(&mut self, action: OverlayAction) {
        match action {
            OverlayAction::OpenCommandCenter => self.open(OverlayKind::CommandCenter),
            OverlayAction::OpenTabCenter => self.open(OverlayKind::TabCenter),
            OverlayAction::OpenQuickLinks => self.open(OverlayKind::QuickLinks),
            OverlayAction::Close => {
                self.close();
            }
        }
    }

    /// Handle a page message. Returns `false` for messages that are not ours.
    pub fn on_message(&mut self, message: &Value) -> bool {
        match PageSignal::from_value(message) {
            Some(action) => {
                self.handle_action(action);
                true
            }
            None => {
                debug!("ignoring foreign page message");
                false
            }
        }
    }
}
