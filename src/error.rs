//! Error types shared across the background and page contexts.
//!
//! None of these ever reach the user: the router logs them and drops the
//! request, and the aggregator turns them into empty results.

use thiserror::Error;

use crate::platform::TabId;

/// Failures reported by the host browser.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The tab was closed (or never existed) by the time we touched it.
    #[error("no tab with id {0}")]
    NoSuchTab(TabId),

    /// The bookmark tree could not be read or had an unexpected shape.
    #[error("bookmark tree unavailable: {0}")]
    Bookmarks(String),

    /// Any other host call failure.
    #[error("browser call failed: {0}")]
    Host(String),
}

/// Failures in the message contract between contexts.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A request arrived without an originating tab.
    #[error("request has no originating tab")]
    MissingSenderTab,

    /// `moveTabOffset` carried a string that is not one of the two sentinels.
    #[error("invalid move target {0:?}, expected an integer, \"0\" or \"$\"")]
    InvalidMoveTarget(String),

    /// A frame announced a length above the framing limit.
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}
