//! Host-facing data types
//!
//! Mirrors the shapes the host application expects from a provider.
//! Field names serialize as camelCase to match the host contract.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Static provider capabilities reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Server names the host may request in `find_episode_server`
    pub episode_servers: Vec<String>,
    pub supports_dub: bool,
}

/// Media titles the host knows for the anime being searched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaInfo {
    pub romaji_title: Option<String>,
    pub english_title: Option<String>,
}

/// Search request from the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Free-text query typed by the user
    pub query: String,
    pub media: Option<MediaInfo>,
    pub dub: bool,
}

impl SearchOptions {
    /// Builds options from a bare query with no media titles
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubOrDub {
    Sub,
    Dub,
    Both,
}

/// One anime matched by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Provider-specific identifier passed back to `find_episodes`
    pub id: String,
    pub title: String,
    pub url: String,
    pub sub_or_dub: SubOrDub,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// One playable episode of an anime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeDetails {
    pub id: String,
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Absolute URL of the episode page
    pub url: String,
}

/// Container format of a video source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSourceType {
    M3u8,
    Mp4,
    Mkv,
    Webm,
    Flv,
    Auto,
}

impl VideoSourceType {
    /// Guesses the container from URL text, or `None` when nothing matches
    pub fn from_url(url: &str) -> Option<Self> {
        let lower = url.to_lowercase();
        if lower.contains("m3u8") {
            Some(Self::M3u8)
        } else if lower.contains(".mp4") {
            Some(Self::Mp4)
        } else if lower.contains(".mkv") {
            Some(Self::Mkv)
        } else if lower.contains(".webm") {
            Some(Self::Webm)
        } else if lower.contains(".flv") {
            Some(Self::Flv)
        } else {
            None
        }
    }
}

impl VideoSourceType {
    /// Container declared by a `type` attribute (e.g., "application/x-mpegURL")
    pub fn from_mime(mime: &str) -> Option<Self> {
        let lower = mime.trim().to_lowercase();
        if lower.contains("mpegurl") {
            Some(Self::M3u8)
        } else if lower.contains("mp4") {
            Some(Self::Mp4)
        } else if lower.contains("matroska") {
            Some(Self::Mkv)
        } else if lower.contains("webm") {
            Some(Self::Webm)
        } else if lower.contains("flv") {
            Some(Self::Flv)
        } else {
            None
        }
    }
}

impl fmt::Display for VideoSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::M3u8 => "m3u8",
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
            Self::Flv => "flv",
            Self::Auto => "auto",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSubtitle {
    pub url: String,
    /// Language code (e.g., "en")
    pub language: String,
    pub label: String,
}

/// A playable stream URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSource {
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: VideoSourceType,
    /// Quality label (e.g., "1080p" or "auto")
    pub quality: String,
    #[serde(default)]
    pub subtitles: Vec<VideoSubtitle>,
}

/// Resolved sources plus the headers the player must send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeServer {
    pub server: String,
    pub headers: BTreeMap<String, String>,
    pub video_sources: Vec<VideoSource>,
}

impl EpisodeServer {
    /// Server entry with no playable sources
    pub fn empty(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            headers: BTreeMap::new(),
            video_sources: Vec::new(),
        }
    }
}

/// Diagnostic snapshot of a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub name: String,
    pub version: String,
    /// Domain that answered the most recent request
    pub base_url: String,
    pub cache_size: u64,
    pub supported_formats: Vec<VideoSourceType>,
}
