//! commandcenter library crate.
//!
//! Coordination core for a keyboard-driven browser command palette:
//! - Open-tab tracking and a bounded closed-tab history
//! - Command aggregation over tabs, bookmarks and pull requests
//! - The request/response contract and its background router
//! - Per-page chord keys and overlay lifecycle

pub mod background;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod platform;
pub mod protocol;
pub mod router;
pub mod tabs;
