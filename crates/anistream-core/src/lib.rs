//! Anistream Providers Core Library
//!
//! Provides async scraping providers for hanime1.me and yhdm.one that
//! supply search, episode listing and playable video sources to a host
//! media application.
//!
//! # Overview
//!
//! Each provider is built from the same pieces:
//! - A rate-limited HTTP client that falls back across mirror domains
//! - Selector and regex parsers for the site's listings
//! - Layered video-source heuristics (media tags, scripts, JSON-LD, guessed
//!   APIs, embedded players)
//! - A short-lived response cache
//!
//! # Example
//!
//! ```no_run
//! use anistream_core::{AnimeProvider, HanimeProvider, Result, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let provider = HanimeProvider::new()?;
//!
//!     // Search for videos
//!     let results = provider.search(&SearchOptions::query("night shift")).await?;
//!
//!     if let Some(video) = results.first() {
//!         let episodes = provider.find_episodes(&video.id).await?;
//!
//!         // Resolve a playable stream for the first episode
//!         if let Some(episode) = episodes.first() {
//!             let server = provider.find_episode_server(episode, "default").await?;
//!             for source in &server.video_sources {
//!                 println!("{} [{}] {}", source.quality, source.source_type, source.url);
//!             }
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Stream URLs
//!
//! Resolved stream URLs often carry signed, expiring parameters and must be
//! requested with the headers returned in [`EpisodeServer::headers`]. They
//! are cached for the configured TTL only (five minutes by default).

mod cache;
mod client;
mod config;
mod error;
pub mod parser;
pub mod provider;
mod resolver;
mod types;
pub mod url;

// Re-export caching
pub use cache::{ProviderCaches, ResponseCache};

// Re-export client types
pub use client::{ClientConfig, FallbackClient, FetchedPage, RateLimiter};

// Re-export configuration
pub use config::SiteConfig;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export the provider API
pub use provider::{AnimeProvider, HanimeProvider, ProviderKind, YhdmProvider};

// Re-export source resolution
pub use resolver::{MAX_IFRAME_DEPTH, ResolvedSource, SourceResolver};

// Re-export data types
pub use types::{
    EpisodeDetails, EpisodeServer, MediaInfo, ProviderInfo, SearchOptions, SearchResult, Settings, SubOrDub,
    VideoSource, VideoSourceType, VideoSubtitle,
};
