//! Listing parsers for hanime1.me
//!
//! The site's markup changes often, so each listing is tried against an
//! ordered list of selectors and the first one that yields anything wins.

use scraper::{ElementRef, Html, Selector};

use crate::error::{ProviderError, Result};
use crate::types::{EpisodeDetails, SearchResult, SubOrDub};
use crate::url::{extract_video_slug, resolve_url};

/// Maximum number of search results returned to the host
pub const MAX_SEARCH_RESULTS: usize = 20;

const SEARCH_SELECTORS: &[&str] = &[
    ".row .col a.card-mobile",
    ".search-results .item a",
    ".video-grid .video-item a",
    "[data-video-id] a",
    r#"a[href*="/videos/hentai/"], a[href*="/watch/"]"#,
];

const SEARCH_TITLE_SELECTORS: &[&str] = &[
    ".card-mobile-title span",
    ".card-mobile-title",
    ".video-title",
    ".title",
    "h3",
    "h4",
];

const RELATED_SELECTORS: &[&str] = &[
    "#related-videos .row .col a",
    ".related-videos a",
    ".episode-list a",
    ".series-episodes a",
    r#"a[href*="/videos/hentai/"]"#,
];

const EPISODE_TITLE_SELECTORS: &[&str] = &[".card-mobile-title span", ".episode-title", ".title"];

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ProviderError::ParseError(format!("Invalid selector {}: {:?}", css, e)))
}

/// Parses the search page into results
///
/// # Arguments
/// * `html` - Raw HTML of `/search?query=...`
/// * `base_url` - Domain the page was served from, used to absolutize links
///
/// # Returns
/// At most [`MAX_SEARCH_RESULTS`] results, de-duplicated by slug.
/// Empty if no selector matched any video link.
pub fn parse_search_results(html: &str, base_url: &str) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let title_selectors = SEARCH_TITLE_SELECTORS
        .iter()
        .map(|css| selector(css))
        .collect::<Result<Vec<_>>>()?;
    let img_selector = selector("img")?;

    for css in SEARCH_SELECTORS {
        let card_selector = selector(css)?;
        let mut results: Vec<SearchResult> = Vec::new();

        for card in document.select(&card_selector) {
            let Some(href) = card.value().attr("href") else {
                continue;
            };
            let Some(slug) = extract_video_slug(href) else {
                continue;
            };
            if results.iter().any(|r| r.id == slug) {
                continue;
            }

            let title = first_text(&card, &title_selectors).unwrap_or_else(|| slug.replace('-', " "));
            let image = extract_cover(&card, &img_selector).map(|src| resolve_url(&src, base_url));

            results.push(SearchResult {
                id: slug,
                title,
                url: resolve_url(href, base_url),
                sub_or_dub: SubOrDub::Sub,
                image,
            });
        }

        if !results.is_empty() {
            results.truncate(MAX_SEARCH_RESULTS);
            return Ok(results);
        }
    }

    Ok(Vec::new())
}

/// Parses the related-videos block of a video page into episodes
///
/// Episodes are numbered from 1 in document order. Empty if the page
/// has no recognizable related list.
pub fn parse_related_episodes(html: &str, base_url: &str) -> Result<Vec<EpisodeDetails>> {
    let document = Html::parse_document(html);
    let title_selectors = EPISODE_TITLE_SELECTORS
        .iter()
        .map(|css| selector(css))
        .collect::<Result<Vec<_>>>()?;

    for css in RELATED_SELECTORS {
        let link_selector = selector(css)?;
        let mut episodes: Vec<EpisodeDetails> = Vec::new();

        for link in document.select(&link_selector) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some(slug) = extract_video_slug(href) else {
                continue;
            };
            if episodes.iter().any(|ep| ep.id == slug) {
                continue;
            }

            let number = episodes.len() as u32 + 1;
            let title = first_text(&link, &title_selectors)
                .or_else(|| own_text(&link))
                .unwrap_or_else(|| format!("Episode {}", number));

            episodes.push(EpisodeDetails {
                id: slug,
                number,
                title: Some(title),
                url: resolve_url(href, base_url),
            });
        }

        if !episodes.is_empty() {
            return Ok(episodes);
        }
    }

    Ok(Vec::new())
}

/// The single episode used when a video has no related list
pub fn single_episode(slug: &str, base_url: &str) -> EpisodeDetails {
    EpisodeDetails {
        id: slug.to_string(),
        number: 1,
        title: Some("Episode 1".to_string()),
        url: format!("{}/videos/hentai/{}", base_url.trim_end_matches('/'), slug),
    }
}

/// First non-empty text among the selectors, searched inside `element`
fn first_text(element: &ElementRef, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        let text = element
            .select(sel)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))?;
        (!text.is_empty()).then_some(text)
    })
}

fn own_text(element: &ElementRef) -> Option<String> {
    let text = collapse_whitespace(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

/// Cover image from `src`, or `data-src` when `src` is missing or a placeholder
fn extract_cover(element: &ElementRef, img_selector: &Selector) -> Option<String> {
    element.select(img_selector).find_map(|img| {
        let src = img
            .value()
            .attr("src")
            .filter(|s| !s.trim().is_empty() && !s.starts_with("data:"));
        src.or_else(|| img.value().attr("data-src"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
