//! User options.
//!
//! A flat key-value bag persisted as JSON. Every key is optional: missing keys
//! fall back to defaults and unknown keys are ignored. There is no caching;
//! every read goes to the backing store and the last write wins.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::commands::favicon::{DEFAULT_FAVICON_SERVICE, DEFAULT_FAVICON_URL};
use crate::commands::prs::DEFAULT_PULL_REQUEST_HOST;
use crate::commands::{FaviconResolver, PullRequestMatcher};
use crate::content::ChordConfig;

/// All persisted options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Identity used to look up recently visited pull requests. Empty disables
    /// the lookup.
    pub github_username: String,

    /// Chord double-press window in milliseconds.
    pub g_double_time: u64,

    /// Comma-separated URL substrings on which chorded keys are disabled.
    #[serde(rename = "vimKeysBlacklistCSV")]
    pub vim_keys_blacklist_csv: String,

    pub scroll_smooth: bool,

    pub new_tab_background_color: String,

    /// Step used by the thumbnail resize controls.
    pub reddit_thumbnail_size_increment: u32,

    /// Favicon service URL; `{domain}` is replaced with the target host.
    pub favicon_service_template: String,

    /// Domains whose favicon is fetched from their own origin.
    pub favicon_origin_domains: Vec<String>,

    pub default_favicon_url: String,

    /// Code host searched for pull requests.
    pub pull_request_host: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            github_username: String::new(),
            g_double_time: 350,
            vim_keys_blacklist_csv: "google.com, gmail.com".to_string(),
            scroll_smooth: true,
            new_tab_background_color: "#202124".to_string(),
            reddit_thumbnail_size_increment: 5,
            favicon_service_template: DEFAULT_FAVICON_SERVICE.to_string(),
            favicon_origin_domains: vec!["lcloud.com".to_string()],
            default_favicon_url: DEFAULT_FAVICON_URL.to_string(),
            pull_request_host: DEFAULT_PULL_REQUEST_HOST.to_string(),
        }
    }
}

impl Options {
    /// Pull-request identity, if one is configured.
    pub fn identity(&self) -> Option<&str> {
        let identity = self.github_username.trim();
        (!identity.is_empty()).then_some(identity)
    }

    pub fn double_press_window(&self) -> Duration {
        Duration::from_millis(self.g_double_time)
    }

    /// Deny-list entries, trimmed, empties dropped.
    pub fn deny_list(&self) -> Vec<String> {
        self.vim_keys_blacklist_csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn chord_config(&self) -> ChordConfig {
        ChordConfig {
            double_press_window: self.double_press_window(),
            deny_list: self.deny_list(),
            scroll_smooth: self.scroll_smooth,
        }
    }

    pub fn favicon_resolver(&self) -> FaviconResolver {
        FaviconResolver::new(
            self.favicon_service_template.clone(),
            self.favicon_origin_domains.clone(),
            self.default_favicon_url.clone(),
        )
    }

    pub fn pull_request_matcher(&self) -> PullRequestMatcher {
        PullRequestMatcher::new(&self.pull_request_host)
    }
}

#[derive(Debug, Clone)]
enum Backing {
    File(PathBuf),
    Memory(Arc<Mutex<Options>>),
}

/// Handle to the persisted options. Cheap to clone; clones share the store.
#[derive(Debug, Clone)]
pub struct OptionsStore {
    backing: Backing,
}

impl OptionsStore {
    /// Store in the user's config directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(Self::default_path()?))
    }

    /// Store backed by the given JSON file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::File(path.into()),
        }
    }

    /// Store that lives only in memory.
    pub fn in_memory(options: Options) -> Self {
        Self {
            backing: Backing::Memory(Arc::new(Mutex::new(options))),
        }
    }

    /// Read the current options, or defaults if nothing was saved yet.
    pub fn get(&self) -> Result<Options> {
        let path = match &self.backing {
            Backing::Memory(options) => return Ok(options.lock().clone()),
            Backing::File(path) => path,
        };

        if !path.exists() {
            return Ok(Options::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse options file: {}", path.display()))
    }

    /// Replace the stored options.
    pub fn set(&self, options: &Options) -> Result<()> {
        let path = match &self.backing {
            Backing::Memory(stored) => {
                *stored.lock() = options.clone();
                return Ok(());
            }
            Backing::File(path) => path,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(options).context("Failed to serialize options")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write options file: {}", path.display()))?;

        Ok(())
    }

    /// Write the defaults back.
    pub fn reset(&self) -> Result<()> {
        self.set(&Options::default())
    }

    fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;

        Ok(config_dir.join("commandcenter").join("options.json"))
    }
}
