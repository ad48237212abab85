//! yhdm.one provider
//!
//! Search returns the single show that best matches the host's titles, or
//! the matching latest updates when the search page lists nothing.
//! Episode pages are scanned for a player source, following embedded
//! players when the page only carries an iframe.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cache::ProviderCaches;
use crate::client::FallbackClient;
use crate::config::SiteConfig;
use crate::error::Result;
use crate::parser::best_match;
use crate::parser::video::{YHDM_SCRIPT_PATTERNS, quality_from_url};
use crate::parser::yhdm::{filter_by_query, parse_episodes, parse_search_results};
use crate::provider::{AnimeProvider, require_non_empty};
use crate::resolver::SourceResolver;
use crate::types::{
    EpisodeDetails, EpisodeServer, ProviderInfo, SearchOptions, SearchResult, Settings, VideoSource,
    VideoSourceType,
};
use crate::url::{YHDM_LATEST_PATH, yhdm_search_path, yhdm_vod_path};

const DEFAULT_SERVER: &str = "默认播放器";

/// Provider for yhdm.one
pub struct YhdmProvider {
    client: FallbackClient,
    caches: ProviderCaches,
}

impl YhdmProvider {
    /// Create a provider with the default yhdm domain and headers
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(SiteConfig::yhdm())
    }

    /// Create a provider with a custom site configuration
    ///
    /// # Errors
    /// Returns error if the configuration has no usable domain or the HTTP
    /// client cannot be built
    pub fn with_config(site: SiteConfig) -> Result<Self> {
        Ok(Self {
            client: FallbackClient::new(&site)?,
            caches: ProviderCaches::new(Duration::from_secs(site.cache_ttl_secs)),
        })
    }

    async fn fetch_search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let page = self.client.fetch(&yhdm_search_path(query)).await?;
        let candidates = parse_search_results(&page.body, &page.base_url)?;

        if candidates.is_empty() {
            debug!(query, "search page empty, scanning latest updates");
            let latest = self.latest_matching(query).await?;
            info!(query, count = latest.len(), "yhdm search answered from latest updates");
            return Ok(latest);
        }

        let media = options.media.clone().unwrap_or_default();
        let primary = media
            .romaji_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(query);
        let secondary = media.english_title.as_deref().map(str::trim).filter(|t| !t.is_empty());

        let best = best_match(&candidates, |r| r.title.as_str(), primary, secondary).cloned();
        info!(
            query,
            candidates = candidates.len(),
            matched = best.as_ref().map(|r| r.title.as_str()),
            "yhdm search finished"
        );
        Ok(best.into_iter().collect())
    }

    /// Entries from the latest-updates page whose title matches the query
    ///
    /// A failing latest page counts as no match.
    async fn latest_matching(&self, query: &str) -> Result<Vec<SearchResult>> {
        match self.client.fetch(YHDM_LATEST_PATH).await {
            Ok(page) => Ok(filter_by_query(parse_search_results(&page.body, &page.base_url)?, query)),
            Err(e) => {
                warn!(error = %e, "latest updates unavailable");
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_episodes(&self, id: &str) -> Result<Vec<EpisodeDetails>> {
        let page = self.client.fetch(&yhdm_vod_path(id)).await?;
        let episodes = parse_episodes(&page.body, &page.base_url)?;
        info!(id, count = episodes.len(), "yhdm episodes listed");
        Ok(episodes)
    }

    async fn resolve_server(&self, episode: &EpisodeDetails, server: &str) -> Result<EpisodeServer> {
        let base = self.client.base_url();
        let page_url = if episode.url.trim().is_empty() {
            format!("{}/vod-play/{}.html", base, episode.id.trim_end_matches(".html"))
        } else {
            episode.url.clone()
        };

        let html = self.client.fetch_page(&page_url, Some(&base)).await?;
        let Some(resolved) = SourceResolver::new(&self.client, YHDM_SCRIPT_PATTERNS)
            .resolve(&html, &page_url)
            .await
        else {
            info!(episode = %episode.id, server, "no playable source found");
            return Ok(EpisodeServer::empty(server));
        };

        let quality = quality_from_url(&resolved.url).unwrap_or("auto").to_string();
        let headers = BTreeMap::from([
            ("User-Agent".to_string(), self.client.user_agent().to_string()),
            ("Referer".to_string(), page_url.clone()),
            ("Accept".to_string(), "*/*".to_string()),
        ]);

        info!(episode = %episode.id, server, method = ?resolved.method, "resolved video source");
        Ok(EpisodeServer {
            server: server.to_string(),
            headers,
            video_sources: vec![VideoSource {
                source_type: resolved
                    .declared_type
                    .or_else(|| VideoSourceType::from_url(&resolved.url))
                    .unwrap_or(VideoSourceType::Mp4),
                url: resolved.url,
                quality,
                subtitles: Vec::new(),
            }],
        })
    }
}

/// Cache key covering every input that changes the picked show
fn search_cache_key(query: &str, options: &SearchOptions) -> String {
    match &options.media {
        Some(media) if media.romaji_title.is_some() || media.english_title.is_some() => format!(
            "search_{}_{}_{}",
            query,
            media.romaji_title.as_deref().unwrap_or_default(),
            media.english_title.as_deref().unwrap_or_default()
        ),
        _ => format!("search_{}", query),
    }
}

#[async_trait]
impl AnimeProvider for YhdmProvider {
    fn name(&self) -> &'static str {
        "yhdm"
    }

    fn settings(&self) -> Settings {
        Settings {
            episode_servers: vec![DEFAULT_SERVER.to_string(), "备用播放器".to_string()],
            supports_dub: false,
        }
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let query = require_non_empty(&options.query, "Search query")?;
        self.caches
            .search
            .get_or_try_fetch(search_cache_key(query, options), || self.fetch_search(query, options))
            .await
    }

    async fn find_episodes(&self, id: &str) -> Result<Vec<EpisodeDetails>> {
        let id = require_non_empty(id, "Show id")?;
        self.caches
            .episodes
            .get_or_try_fetch(format!("episodes_{}", id), || self.fetch_episodes(id))
            .await
    }

    async fn find_episode_server(&self, episode: &EpisodeDetails, server: &str) -> Result<EpisodeServer> {
        let id = require_non_empty(&episode.id, "Episode id")?;
        let server = match server.trim() {
            "" => DEFAULT_SERVER,
            name => name,
        };
        self.caches
            .servers
            .get_or_try_fetch(format!("server_{}_{}", id, server), || {
                self.resolve_server(episode, server)
            })
            .await
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "YHDM Provider".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            base_url: self.client.base_url(),
            cache_size: self.caches.len(),
            supported_formats: vec![VideoSourceType::Mp4, VideoSourceType::M3u8, VideoSourceType::Flv],
        }
    }

    fn clear_cache(&self) {
        self.caches.clear();
        info!("yhdm cache cleared");
    }
}
