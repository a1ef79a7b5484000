//! Favicon URLs for commands whose source has no icon of its own.

use url::Url;

/// Icon used whenever nothing better can be derived.
pub const DEFAULT_FAVICON_URL: &str = "https://iterm2.com/favicon.ico";

/// Default favicon service; `{domain}` is replaced with the target host.
pub const DEFAULT_FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons?domain={domain}&sz=128";

/// Resolves a favicon URL for an arbitrary link. Never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaviconResolver {
    service_template: String,
    origin_domains: Vec<String>,
    default_icon: String,
}

impl Default for FaviconResolver {
    fn default() -> Self {
        Self::new(
            DEFAULT_FAVICON_SERVICE,
            vec!["lcloud.com".to_string()],
            DEFAULT_FAVICON_URL,
        )
    }
}

impl FaviconResolver {
    /// `origin_domains` are hosts (or parent domains) the favicon service
    /// cannot reach; their icon is taken from `<origin>/favicon.ico` instead.
    pub fn new(
        service_template: impl Into<String>,
        origin_domains: Vec<String>,
        default_icon: impl Into<String>,
    ) -> Self {
        Self {
            service_template: service_template.into(),
            origin_domains,
            default_icon: default_icon.into(),
        }
    }

    pub fn default_icon(&self) -> &str {
        &self.default_icon
    }

    fn is_origin_domain(&self, host: &str) -> bool {
        self.origin_domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{d}")))
    }

    /// Favicon for `link`; malformed or non-web links get the default icon.
    pub fn resolve(&self, link: Option<&str>) -> String {
        let Some(url) = link.and_then(|l| Url::parse(l).ok()) else {
            return self.default_icon.clone();
        };
        if !matches!(url.scheme(), "https" | "http") {
            return self.default_icon.clone();
        }
        let Some(host) = url.host_str() else {
            return self.default_icon.clone();
        };

        if self.is_origin_domain(host) {
            return format!("{}/favicon.ico", url.origin().ascii_serialization());
        }
        self.service_template.replace("{domain}", host)
    }
}
