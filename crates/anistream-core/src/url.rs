//! URL helper functions
//!
//! Resolving scraped links and building the site paths both providers request.

use url::Url;

/// Resolves a scraped link against a site base URL
///
/// Absolute links pass through, protocol-relative links get `https:`,
/// everything else is joined onto `base_url`. Empty input stays empty.
///
/// # Example
/// ```
/// use anistream_core::url::resolve_url;
/// assert_eq!(resolve_url("/videos/hentai/abc", "https://hanime1.me"), "https://hanime1.me/videos/hentai/abc");
/// assert_eq!(resolve_url("//cdn.example/a.jpg", "https://hanime1.me"), "https://cdn.example/a.jpg");
/// ```
pub fn resolve_url(url: &str, base_url: &str) -> String {
    let url = url.trim();
    let base = base_url.trim_end_matches('/');
    if url.is_empty() {
        String::new()
    } else if url.starts_with("http") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}

/// Resolves a link found on `page_url` the way a browser would
///
/// Relative paths resolve against the page's directory, root-relative
/// paths against its origin. Falls back to [`resolve_url`] when the page
/// URL itself cannot be parsed.
///
/// # Example
/// ```
/// use anistream_core::url::resolve_against_page;
/// let url = resolve_against_page("play/index.m3u8", "https://yhdm.one/vod-play/1/ep2.html");
/// assert_eq!(url, "https://yhdm.one/vod-play/1/play/index.m3u8");
/// ```
pub fn resolve_against_page(url: &str, page_url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    match Url::parse(page_url).and_then(|page| page.join(url)) {
        Ok(joined) => joined.to_string(),
        Err(_) => resolve_url(url, page_url),
    }
}

/// Extracts the video slug from a hanime link
///
/// Accepts `/videos/hentai/<slug>` and `/watch/<slug>` forms, relative or
/// absolute, ignoring query strings and trailing segments.
///
/// # Example
/// ```
/// use anistream_core::url::extract_video_slug;
/// assert_eq!(extract_video_slug("/videos/hentai/some-title-1?ref=x"), Some("some-title-1".to_string()));
/// assert_eq!(extract_video_slug("https://hanime1.me/watch/abc/"), Some("abc".to_string()));
/// assert_eq!(extract_video_slug("/tags/abc"), None);
/// ```
pub fn extract_video_slug(link: &str) -> Option<String> {
    let rest = ["/videos/hentai/", "/watch/"]
        .iter()
        .find_map(|marker| link.split_once(marker).map(|(_, rest)| rest))?;

    let slug = rest
        .split(['?', '#'])
        .next()
        .unwrap_or(rest)
        .split('/')
        .next()
        .unwrap_or_default();

    (!slug.is_empty()).then(|| slug.to_string())
}

/// hanime search endpoint
pub fn hanime_search_path(query: &str) -> String {
    format!("/search?query={}", urlencoding::encode(query))
}

/// hanime video page endpoint
pub fn hanime_video_path(slug: &str) -> String {
    format!("/videos/hentai/{}", urlencoding::encode(slug))
}

/// Endpoints hanime has exposed video metadata on at various times
pub fn hanime_api_paths(slug: &str) -> [String; 3] {
    let slug = urlencoding::encode(slug);
    [
        format!("/api/video/{}", slug),
        format!("/api/v1/videos/{}", slug),
        format!("/video/{}/sources", slug),
    ]
}

/// yhdm search endpoint
pub fn yhdm_search_path(query: &str) -> String {
    format!("/search?q={}", urlencoding::encode(query))
}

/// yhdm listing of recently updated shows
pub const YHDM_LATEST_PATH: &str = "/latest/";

/// yhdm show page endpoint
pub fn yhdm_vod_path(id: &str) -> String {
    format!("/vod/{}.html", urlencoding::encode(id))
}
