//! Listing parsers for yhdm.one
//!
//! The site renders plain server-side markup, so listings are matched with
//! regexes over the raw HTML.

use regex::Regex;

use crate::error::{ProviderError, Result};
use crate::types::{EpisodeDetails, SearchResult, SubOrDub};

/// Maximum number of entries kept from the latest-updates fallback
pub const MAX_LATEST_RESULTS: usize = 5;

const SHOW_LINK_PATTERNS: &[&str] = &[
    r#"<a[^>]+href="/vod/(\d+)\.html"[^>]*>([^<]+)</a>"#,
    r#"<h3[^>]*><a[^>]+href="/vod/(\d+)\.html"[^>]*>([^<]+)</a></h3>"#,
];

const EPISODE_LINK_PATTERN: &str =
    r#"<a[^>]+href="/vod-play/(\d+)/ep(\d+)\.html"[^>]*>([^<]*第(\d+)[集话][^<]*)</a>"#;

const PLAY_LINK_PATTERN: &str = r#"<a[^>]+href="/vod-play/([^"]+)"[^>]*>([^<]*)</a>"#;

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ProviderError::ParseError(format!("Invalid pattern: {}", e)))
}

/// Parses show links from a search or listing page
///
/// Tries each show-link pattern in order; the first that matches anything
/// wins. Results are de-duplicated by show id.
pub fn parse_search_results(html: &str, base_url: &str) -> Result<Vec<SearchResult>> {
    let base = base_url.trim_end_matches('/');

    for pattern in SHOW_LINK_PATTERNS {
        let re = regex(pattern)?;
        let mut results: Vec<SearchResult> = Vec::new();

        for caps in re.captures_iter(html) {
            let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            if id.is_empty() || title.is_empty() || results.iter().any(|r| r.id == id) {
                continue;
            }

            results.push(SearchResult {
                id: id.to_string(),
                title: decode_html_entities(title),
                url: format!("{}/vod/{}.html", base, id),
                sub_or_dub: SubOrDub::Sub,
                image: None,
            });
        }

        if !results.is_empty() {
            return Ok(results);
        }
    }

    Ok(Vec::new())
}

/// Keeps listing entries whose title contains the query or vice versa
///
/// Case-insensitive; at most [`MAX_LATEST_RESULTS`] entries.
pub fn filter_by_query(results: Vec<SearchResult>, query: &str) -> Vec<SearchResult> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    results
        .into_iter()
        .filter(|r| {
            let title = r.title.to_lowercase();
            title.contains(&query) || query.contains(&title)
        })
        .take(MAX_LATEST_RESULTS)
        .collect()
}

/// Parses the episode list of a show page
///
/// Prefers links whose text reads "第N集" / "第N话"; otherwise accepts any
/// play link whose path carries `epN`. Sorted by episode number.
pub fn parse_episodes(html: &str, base_url: &str) -> Result<Vec<EpisodeDetails>> {
    let base = base_url.trim_end_matches('/');
    let mut episodes: Vec<EpisodeDetails> = Vec::new();

    let re = regex(EPISODE_LINK_PATTERN)?;
    for caps in re.captures_iter(html) {
        let show_id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let Some(number) = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let id = format!("{}/ep{}", show_id, number);
        if episodes.iter().any(|ep| ep.id == id) {
            continue;
        }

        let title = caps.get(3).map(|m| m.as_str().trim()).unwrap_or_default();
        episodes.push(EpisodeDetails {
            url: format!("{}/vod-play/{}.html", base, id),
            id,
            number,
            title: Some(episode_title(title, number)),
        });
    }

    if episodes.is_empty() {
        let play_re = regex(PLAY_LINK_PATTERN)?;
        let ep_re = regex(r"ep(\d+)")?;

        for caps in play_re.captures_iter(html) {
            let play_path = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let Some(number) = ep_re
                .captures(play_path)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
            else {
                continue;
            };
            if episodes.iter().any(|ep| ep.id == play_path) {
                continue;
            }

            let title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            episodes.push(EpisodeDetails {
                id: play_path.to_string(),
                number,
                title: Some(episode_title(title, number)),
                url: format!("{}/vod-play/{}", base, play_path),
            });
        }
    }

    episodes.sort_by_key(|ep| ep.number);
    Ok(episodes)
}

fn episode_title(text: &str, number: u32) -> String {
    if text.is_empty() {
        format!("第{}集", number)
    } else {
        decode_html_entities(text)
    }
}

fn decode_html_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
