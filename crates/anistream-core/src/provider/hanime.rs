//! hanime1.me provider
//!
//! Searches and lists episodes through the site's HTML pages, falling back
//! across mirror domains. Video sources are resolved from the episode page,
//! then guessed JSON endpoints, then embedded players.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::cache::ProviderCaches;
use crate::client::FallbackClient;
use crate::config::SiteConfig;
use crate::error::Result;
use crate::parser::hanime::{parse_related_episodes, parse_search_results, single_episode};
use crate::parser::video::{HANIME_SCRIPT_PATTERNS, parse_subtitle_tracks, quality_from_url};
use crate::provider::{AnimeProvider, require_non_empty};
use crate::resolver::SourceResolver;
use crate::types::{
    EpisodeDetails, EpisodeServer, ProviderInfo, SearchOptions, SearchResult, Settings, VideoSource,
    VideoSourceType, VideoSubtitle,
};
use crate::url::{extract_video_slug, hanime_api_paths, hanime_search_path, hanime_video_path, resolve_against_page};

const DEFAULT_SERVER: &str = "default";

/// Provider for hanime1.me and its mirrors
pub struct HanimeProvider {
    client: FallbackClient,
    caches: ProviderCaches,
}

impl HanimeProvider {
    /// Create a provider with the default hanime domains and headers
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(SiteConfig::hanime())
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

    async fn fetch_search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let page = self.client.fetch(&hanime_search_path(query)).await?;
        let results = parse_search_results(&page.body, &page.base_url)?;
        info!(query, count = results.len(), "hanime search finished");
        Ok(results)
    }

    async fn fetch_episodes(&self, slug: &str) -> Result<Vec<EpisodeDetails>> {
        let page = self.client.fetch(&hanime_video_path(slug)).await?;
        let mut episodes = parse_related_episodes(&page.body, &page.base_url)?;
        if episodes.is_empty() {
            episodes.push(single_episode(slug, &page.base_url));
        }
        info!(slug, count = episodes.len(), "hanime episodes listed");
        Ok(episodes)
    }

    async fn resolve_server(&self, slug: &str, episode_url: &str, server: &str) -> Result<EpisodeServer> {
        let base = self.client.base_url();
        let page_url = if episode_url.trim().is_empty() {
            format!("{}{}", base, hanime_video_path(slug))
        } else {
            episode_url.to_string()
        };

        let html = self.client.fetch_page(&page_url, Some(&base)).await?;
        let api_urls = hanime_api_paths(slug)
            .iter()
            .map(|path| format!("{}{}", base, path))
            .collect();

        let Some(resolved) = SourceResolver::new(&self.client, HANIME_SCRIPT_PATTERNS)
            .with_api_urls(api_urls)
            .resolve(&html, &page_url)
            .await
        else {
            info!(slug, server, "no playable source found");
            return Ok(EpisodeServer::empty(server));
        };

        let quality = quality_from_url(&resolved.url)
            .map(str::to_string)
            .or(resolved.quality)
            .unwrap_or_else(|| "auto".to_string());
        let subtitles = parse_subtitle_tracks(&html)
            .into_iter()
            .map(|track| VideoSubtitle {
                url: resolve_against_page(&track.url, &page_url),
                ..track
            })
            .collect();

        info!(slug, server, method = ?resolved.method, "resolved video source");
        Ok(EpisodeServer {
            server: server.to_string(),
            headers: self.client.browser_headers(&base),
            video_sources: vec![VideoSource {
                source_type: resolved
                    .declared_type
                    .or_else(|| VideoSourceType::from_url(&resolved.url))
                    .unwrap_or(VideoSourceType::Auto),
                url: resolved.url,
                quality,
                subtitles,
            }],
        })
    }
}

#[async_trait]
impl AnimeProvider for HanimeProvider {
    fn name(&self) -> &'static str {
        "hanime"
    }

    fn settings(&self) -> Settings {
        Settings {
            episode_servers: vec![DEFAULT_SERVER.to_string(), "backup".to_string()],
            supports_dub: false,
        }
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let query = require_non_empty(&options.query, "Search query")?;
        self.caches
            .search
            .get_or_try_fetch(format!("search_{}", query), || self.fetch_search(query))
            .await
    }

    async fn find_episodes(&self, id: &str) -> Result<Vec<EpisodeDetails>> {
        let id = require_non_empty(id, "Video id")?;
        // Accept a full video URL as well as a bare slug
        let slug = extract_video_slug(id).unwrap_or_else(|| id.to_string());
        self.caches
            .episodes
            .get_or_try_fetch(format!("episodes_{}", slug), || self.fetch_episodes(&slug))
            .await
    }

    async fn find_episode_server(&self, episode: &EpisodeDetails, server: &str) -> Result<EpisodeServer> {
        let slug = require_non_empty(&episode.id, "Episode id")?;
        let server = match server.trim() {
            "" => DEFAULT_SERVER,
            name => name,
        };
        self.caches
            .servers
            .get_or_try_fetch(format!("server_{}_{}", slug, server), || {
                self.resolve_server(slug, &episode.url, server)
            })
            .await
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Hanime1.me Provider".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            base_url: self.client.base_url(),
            cache_size: self.caches.len(),
            supported_formats: vec![
                VideoSourceType::M3u8,
                VideoSourceType::Mp4,
                VideoSourceType::Mkv,
                VideoSourceType::Webm,
            ],
        }
    }

    fn clear_cache(&self) {
        self.caches.clear();
        info!("hanime cache cleared");
    }
}
