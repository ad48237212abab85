//! Per-site configuration
//!
//! Domains, spoofed browser headers and cache lifetime for one scraped site.
//! Deserializable so a host can override any field from JSON.

use serde::{Deserialize, Serialize};

use crate::client::ClientConfig;

pub(crate) const DESKTOP_CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub(crate) const SHORT_DESKTOP_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Configuration for a single scraped site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Primary domain first, then fallbacks (e.g., "https://hanime1.me")
    pub domains: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept")]
    pub accept: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// Lifetime of cached search/episode/server results (default: 300)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_user_agent() -> String {
    DESKTOP_CHROME_UA.to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.5".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    5 * 60
}

impl SiteConfig {
    /// Defaults for hanime1.me and its mirrors
    pub fn hanime() -> Self {
        Self {
            domains: vec![
                "https://hanime1.me".to_string(),
                "https://hanime.tv".to_string(),
                "https://hanime1.tv".to_string(),
            ],
            user_agent: default_user_agent(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: default_accept_language(),
            cache_ttl_secs: default_cache_ttl_secs(),
            client: ClientConfig::default(),
        }
    }

    /// Defaults for yhdm.one
    pub fn yhdm() -> Self {
        Self {
            domains: vec!["https://yhdm.one".to_string()],
            user_agent: SHORT_DESKTOP_UA.to_string(),
            accept: default_accept(),
            accept_language: "zh-CN,zh;q=0.8,en-US;q=0.5,en;q=0.3".to_string(),
            cache_ttl_secs: default_cache_ttl_secs(),
            client: ClientConfig::default(),
        }
    }

    /// Replaces the domain list, keeping every other setting
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }
}
