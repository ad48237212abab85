//! Site providers behind a common host-facing interface

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::types::{EpisodeDetails, EpisodeServer, ProviderInfo, SearchOptions, SearchResult, Settings};

mod hanime;
mod yhdm;

pub use hanime::HanimeProvider;
pub use yhdm::YhdmProvider;

/// Operations a host application calls on a scraping provider
#[async_trait]
pub trait AnimeProvider: Send + Sync {
    /// Short identifier of the provider (e.g., "hanime")
    fn name(&self) -> &'static str;

    /// Static capabilities: selectable servers and dub support
    fn settings(&self) -> Settings;

    /// Searches the site for anime matching the options
    ///
    /// # Errors
    /// - `InvalidId` if the query is empty or whitespace only
    /// - `AllDomainsFailed` if no domain answered
    async fn search(&self, options: &SearchOptions) -> Result<Vec<SearchResult>>;

    /// Lists the episodes of a search result id
    ///
    /// # Errors
    /// - `InvalidId` if the id is empty
    /// - `AllDomainsFailed` if no domain answered
    async fn find_episodes(&self, id: &str) -> Result<Vec<EpisodeDetails>>;

    /// Resolves playable sources for an episode
    ///
    /// A page with no recognizable source yields an `EpisodeServer` with no
    /// video sources rather than an error.
    ///
    /// # Errors
    /// - `InvalidId` if the episode id is empty
    /// - `HttpError` / `NotFound` if the episode page cannot be loaded
    async fn find_episode_server(&self, episode: &EpisodeDetails, server: &str) -> Result<EpisodeServer>;

    /// Diagnostic snapshot (version, working domain, cache size)
    fn info(&self) -> ProviderInfo;

    /// Drops every cached response
    fn clear_cache(&self);
}

/// Providers available in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Hanime,
    Yhdm,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Hanime, ProviderKind::Yhdm];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hanime => "hanime",
            Self::Yhdm => "yhdm",
        }
    }

    /// Builds the provider with its default site configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be initialized
    pub fn build(self) -> Result<Arc<dyn AnimeProvider>> {
        Ok(match self {
            Self::Hanime => Arc::new(HanimeProvider::new()?),
            Self::Yhdm => Arc::new(YhdmProvider::new()?),
        })
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hanime" => Ok(Self::Hanime),
            "yhdm" => Ok(Self::Yhdm),
            other => Err(ProviderError::InvalidId(format!("Unknown provider: {}", other))),
        }
    }
}

/// Rejects empty or whitespace-only identifiers
pub(crate) fn require_non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::InvalidId(format!("{} cannot be empty", what)));
    }
    Ok(trimmed)
}
