//! Message contract between page contexts and the background service.
//!
//! Everything here is a plain value: requests and responses are copied
//! across the boundary and never refer back into the sending context.

pub mod framing;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commands::aggregator::LoadCommandsResponse;
use crate::commands::{Command, PullRequest, QuickLinksTree};
use crate::error::ProtocolError;
use crate::platform::{TabEvent, TabId, TabPosition};
use crate::tabs::TabRecord;

/// `source` carried by every page signal this crate emits or accepts.
pub const PAGE_SIGNAL_SOURCE: &str = "commandcenter";

/// Named requests without a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Directive {
    /// Open the browser's extensions page.
    OpenExtensions,
    /// Close the sender's tab.
    CloseCurrentTab,
    /// Duplicate the sender's tab.
    DuplicateTab,
    LoadAllCommands,
    LoadCurrentTabs,
    LoadClosedTabCommands,
    LoadQuickLinks,
}

/// Destination for `moveTabOffset`: a signed offset from the sender's own
/// index, or `"0"` / `"$"` for the start / end of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveTarget {
    Offset(i64),
    Sentinel(String),
}

impl MoveTarget {
    pub const START: &'static str = "0";
    pub const END: &'static str = "$";

    /// Absolute position for a tab currently at `sender_index`. Offsets that
    /// would land before the first tab are clamped to it.
    pub fn resolve(&self, sender_index: usize) -> Result<TabPosition, ProtocolError> {
        match self {
            Self::Offset(offset) => {
                let target = (sender_index as i64).saturating_add(*offset).max(0);
                Ok(TabPosition::Index(target as usize))
            }
            Self::Sentinel(s) if s == Self::START => Ok(TabPosition::Index(0)),
            Self::Sentinel(s) if s == Self::END => Ok(TabPosition::End),
            Self::Sentinel(other) => Err(ProtocolError::InvalidMoveTarget(other.clone())),
        }
    }
}

/// A request bound for the background service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    Directive(Directive),
    SwitchToTabId(TabId),
    RemoveTabId(TabId),
    /// Recreate a closed tab from its snapshot.
    ReopenTab(TabRecord),
    MoveTabOffset(MoveTarget),
    #[serde(rename = "loadPRsForGithubUsername")]
    LoadPrsForGithubUsername(String),
}

impl From<Directive> for Request {
    fn from(directive: Directive) -> Self {
        Self::Directive(directive)
    }
}

/// The tab a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderTab {
    pub id: TabId,
    pub index: usize,
}

/// Who sent a request. Requests from outside any tab (the toolbar popup, other
/// extensions) have no `tab` and are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSender {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<SenderTab>,
}

impl MessageSender {
    pub fn tab(id: TabId, index: usize) -> Self {
        Self {
            tab: Some(SenderTab { id, index }),
        }
    }
}

/// A request together with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub sender: MessageSender,
    pub request: Request,
}

impl Envelope {
    pub fn new(sender: MessageSender, request: impl Into<Request>) -> Self {
        Self {
            sender,
            request: request.into(),
        }
    }
}

/// Payload answering a data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum Response {
    Commands(LoadCommandsResponse),
    CurrentTabs { current_tabs: Vec<TabRecord> },
    ClosedTabCommands { closed_tab_commands: Vec<Command> },
    ReopenedTab { reopened_tab: TabRecord },
    PullRequests { prs: Vec<PullRequest> },
    QuickLinks { quick_links: QuickLinksTree },
}

/// What a page signal asks the overlay to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayAction {
    OpenCommandCenter,
    OpenTabCenter,
    OpenQuickLinks,
    Close,
}

/// Same-page cross-context signal: `{source: "commandcenter", action}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSignal {
    pub source: String,
    pub action: OverlayAction,
}

impl PageSignal {
    pub fn new(action: OverlayAction) -> Self {
        Self {
            source: PAGE_SIGNAL_SOURCE.to_string(),
            action,
        }
    }

    /// Interpret an arbitrary page message. Anything not from our own source,
    /// or with an action we don't know, is `None`.
    pub fn from_value(message: &Value) -> Option<OverlayAction> {
        if message.get("source")?.as_str()? != PAGE_SIGNAL_SOURCE {
            return None;
        }
        serde_json::from_value(message.get("action")?.clone()).ok()
    }
}

/// Inbound frame on the host pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostFrame {
    /// A platform tab notification, applied in arrival order.
    Event(TabEvent),
    /// A page request; the reply echoes `reply_id`.
    Request { reply_id: u64, envelope: Envelope },
}

/// An inbound frame that framed correctly but did not parse.
#[derive(Debug)]
pub struct UnreadableFrame {
    /// Present when the frame still looked like a request, so the sender can
    /// be told there is no response.
    pub reply_id: Option<u64>,
    pub error: serde_json::Error,
}

impl HostFrame {
    /// Parse an already-decoded frame body, salvaging the reply id of a
    /// request whose envelope is unusable.
    pub fn from_value(value: Value) -> Result<Self, UnreadableFrame> {
        let reply_id = value.pointer("/request/replyId").and_then(Value::as_u64);
        serde_json::from_value(value).map_err(|error| UnreadableFrame { reply_id, error })
    }
}

/// Outbound frame on the host pipe. `response` is `None` when the request has
/// no payload or was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReply {
    pub reply_id: u64,
    pub response: Option<Response>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn requests_use_wire_names() {
        let parse = |v: Value| serde_json::from_value::<Request>(v).unwrap();

        assert_eq!(
            parse(json!({"directive": "loadAllCommands"})),
            Request::Directive(Directive::LoadAllCommands)
        );
        assert_eq!(parse(json!({"switchToTabId": 7})), Request::SwitchToTabId(7));
        assert_eq!(
            parse(json!({"moveTabOffset": -2})),
            Request::MoveTabOffset(MoveTarget::Offset(-2))
        );
        assert_eq!(
            parse(json!({"moveTabOffset": "$"})),
            Request::MoveTabOffset(MoveTarget::Sentinel("$".into()))
        );
        assert_eq!(
            parse(json!({"loadPRsForGithubUsername": "alice"})),
            Request::LoadPrsForGithubUsername("alice".into())
        );
    }

    #[test]
    fn unknown_directive_does_not_parse() {
        assert!(serde_json::from_value::<Request>(json!({"directive": "selfDestruct"})).is_err());
    }

    #[test]
    fn move_offset_is_relative_to_sender() {
        assert_eq!(MoveTarget::Offset(-2).resolve(5).unwrap(), TabPosition::Index(3));
        assert_eq!(MoveTarget::Offset(1).resolve(5).unwrap(), TabPosition::Index(6));
        assert_eq!(MoveTarget::Offset(-9).resolve(5).unwrap(), TabPosition::Index(0));
    }

    #[test]
    fn sentinels_ignore_sender_index() {
        for index in [0, 3, 40] {
            let start = MoveTarget::Sentinel("0".into());
            assert_eq!(start.resolve(index).unwrap(), TabPosition::Index(0));
            let end = MoveTarget::Sentinel("$".into());
            assert_eq!(end.resolve(index).unwrap(), TabPosition::End);
        }
    }

    #[test]
    fn other_strings_are_rejected() {
        let err = MoveTarget::Sentinel("far right".into()).resolve(2).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMoveTarget(s) if s == "far right"));
    }

    #[test]
    fn responses_serialize_flat() {
        let response = Response::ClosedTabCommands {
            closed_tab_commands: vec![],
        };
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"closedTabCommands": []}));

        let response = Response::Commands(LoadCommandsResponse::default());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("bookmarkCommands").is_some());
        assert!(json.get("prCommands").is_none());
    }

    #[test]
    fn page_signals_from_other_sources_are_ignored() {
        assert_eq!(
            PageSignal::from_value(&json!({"source": "commandcenter", "action": "openTabCenter"})),
            Some(OverlayAction::OpenTabCenter)
        );
        assert_eq!(
            PageSignal::from_value(&json!({"source": "react-devtools", "action": "close"})),
            None
        );
        assert_eq!(
            PageSignal::from_value(&json!({"source": "commandcenter", "action": "dance"})),
            None
        );
        assert_eq!(PageSignal::from_value(&json!("hello")), None);
    }

    #[test]
    fn page_signal_round_trips_through_json() {
        let json = serde_json::to_value(PageSignal::new(OverlayAction::Close)).unwrap();
        assert_eq!(json, json!({"source": "commandcenter", "action": "close"}));
        assert_eq!(PageSignal::from_value(&json), Some(OverlayAction::Close));
    }

    #[test]
    fn host_frames_parse() {
        let frame: HostFrame = serde_json::from_value(json!({
            "request": {
                "replyId": 9,
                "envelope": {
                    "sender": {"tab": {"id": 1, "index": 0}},
                    "request": {"directive": "duplicateTab"}
                }
            }
        }))
        .unwrap();

        assert_eq!(
            frame,
            HostFrame::Request {
                reply_id: 9,
                envelope: Envelope::new(MessageSender::tab(1, 0), Directive::DuplicateTab),
            }
        );

        let frame: HostFrame = serde_json::from_value(json!({
            "event": {"type": "removed", "tabId": 4}
        }))
        .unwrap();
        assert_eq!(frame, HostFrame::Event(TabEvent::Removed { tab_id: 4 }));
    }

    #[test]
    fn unknown_directive_keeps_its_reply_id() {
        let err = HostFrame::from_value(json!({
            "request": {
                "replyId": 2,
                "envelope": {
                    "sender": {"tab": {"id": 1, "index": 0}},
                    "request": {"directive": "selfDestruct"}
                }
            }
        }))
        .unwrap_err();
        assert_eq!(err.reply_id, Some(2));

        let err = HostFrame::from_value(json!({"bogus": true})).unwrap_err();
        assert_eq!(err.reply_id, None);
    }
}
