//! Video source extraction from player pages
//!
//! Each function implements one heuristic and returns the raw (unresolved)
//! URL it found. [`extract_inline_source`] runs the in-page heuristics in
//! order; fetching guessed APIs and embedded iframes is left to the caller.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::types::{VideoSourceType, VideoSubtitle};

/// Script patterns for hanime1.me players
pub const HANIME_SCRIPT_PATTERNS: &[&str] = &[
    r#"["']([^"']*\.m3u8[^"']*)["']"#,
    r#"videoUrl["\s]*:["\s]*["']([^"']+)["']"#,
    r#"src["\s]*:["\s]*["']([^"']+\.(?:m3u8|mp4)[^"']*)["']"#,
    r#"file["\s]*:["\s]*["']([^"']+)["']"#,
];

/// Script patterns for yhdm.one players
pub const YHDM_SCRIPT_PATTERNS: &[&str] = &[
    r#"(?i)(?:url|src|source|file)["']?\s*:\s*["']([^"']+\.(?:mp4|m3u8|flv)[^"']*)["']"#,
    r#"(?i)config\s*=\s*\{[^}]*(?:url|src|source|file)["']?\s*:\s*["']([^"']+)["']"#,
];

const MEDIA_ATTRIBUTE_PATTERN: &str = r#"(?i)(?:src|source|file)=["']([^"']+\.(?:mp4|m3u8|flv)[^"']*)["']"#;

/// Which heuristic produced a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    VideoTag,
    Script,
    JsonLd,
    Api,
    Iframe,
}

/// A source URL as found in the page, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSource {
    pub url: String,
    pub method: ExtractionMethod,
    /// Container from the media tag's `type` attribute, if it named one
    pub declared_type: Option<VideoSourceType>,
}

/// A `<video>` / `<source>` URL with its declared container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTag {
    pub src: String,
    pub declared_type: Option<VideoSourceType>,
}

/// Runs the in-page heuristics in order: media tags, scripts, JSON-LD
///
/// # Arguments
/// * `html` - Raw HTML of the player page
/// * `script_patterns` - Site-specific script regexes, tried in order
pub fn extract_inline_source(html: &str, script_patterns: &[&str]) -> Option<ExtractedSource> {
    let document = Html::parse_document(html);

    if let Some(tag) = find_media_tag_source(&document) {
        return Some(ExtractedSource {
            url: tag.src,
            method: ExtractionMethod::VideoTag,
            declared_type: tag.declared_type,
        });
    }
    if let Some(url) = find_media_attribute(html) {
        return Some(ExtractedSource {
            url,
            method: ExtractionMethod::VideoTag,
            declared_type: None,
        });
    }
    if let Some(url) = find_script_source(&document, script_patterns) {
        return Some(ExtractedSource {
            url,
            method: ExtractionMethod::Script,
            declared_type: None,
        });
    }
    find_json_ld_source(&document).map(|url| ExtractedSource {
        url,
        method: ExtractionMethod::JsonLd,
        declared_type: None,
    })
}

/// `<source>` inside `<video>`, preferring HLS, then a bare `<video src>`
pub fn find_media_tag_source(document: &Html) -> Option<MediaTag> {
    if let Ok(selector) = Selector::parse("video source[src]") {
        let sources: Vec<MediaTag> = document.select(&selector).filter_map(media_tag).collect();

        let preferred = sources
            .iter()
            .find(|tag| tag.declared_type == Some(VideoSourceType::M3u8))
            .or_else(|| sources.iter().find(|tag| tag.src.contains("m3u8")))
            .or_else(|| sources.first());
        if let Some(tag) = preferred {
            return Some(tag.clone());
        }
    }

    ["video[src]", "source[src]"].iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).find_map(media_tag)
    })
}

fn media_tag(el: ElementRef) -> Option<MediaTag> {
    let src = el.value().attr("src").map(clean_url).filter(|s| !s.is_empty())?;
    Some(MediaTag {
        src,
        declared_type: el.value().attr("type").and_then(VideoSourceType::from_mime),
    })
}

/// `src=` / `source=` / `file=` attributes pointing at a media file
pub fn find_media_attribute(html: &str) -> Option<String> {
    let re = Regex::new(MEDIA_ATTRIBUTE_PATTERN).ok()?;
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_url(m.as_str()))
}

/// Scans inline `<script>` blocks with each pattern in turn
///
/// A pattern is tried against every script before moving to the next
/// pattern, so earlier patterns take priority across the whole page.
pub fn find_script_source(document: &Html, patterns: &[&str]) -> Option<String> {
    let selector = Selector::parse("script").ok()?;
    let scripts: Vec<String> = document
        .select(&selector)
        .filter(|el| {
            el.value()
                .attr("type")
                .is_none_or(|t| !t.contains("ld+json"))
        })
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect();

    for pattern in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        for script in &scripts {
            if let Some(url) = re
                .captures(script)
                .and_then(|caps| caps.get(1))
                .map(|m| clean_url(m.as_str()))
                .filter(|url| !url.is_empty())
            {
                return Some(url);
            }
        }
    }

    None
}

/// `contentUrl` / `video.contentUrl` / `url` from JSON-LD blocks
///
/// Malformed blocks are skipped.
pub fn find_json_ld_source(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    document.select(&selector).find_map(|el| {
        let text = el.text().collect::<String>();
        let value: Value = match serde_json::from_str(text.trim()) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed JSON-LD block");
                return None;
            }
        };
        match &value {
            Value::Array(items) => items.iter().find_map(json_ld_url),
            other => json_ld_url(other),
        }
    })
}

fn json_ld_url(value: &Value) -> Option<String> {
    let candidates = [
        value.pointer("/video/contentUrl"),
        value.get("contentUrl"),
        value.get("url"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(clean_url)
        .find(|url| !url.is_empty())
}

/// Source URL and optional quality from a guessed API response
pub fn api_source(value: &Value) -> Option<(String, Option<String>)> {
    let url = ["videoUrl", "src", "url", "source"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(clean_url)
        .find(|url| !url.is_empty())?;
    let quality = value
        .get("quality")
        .and_then(Value::as_str)
        .filter(|q| !q.trim().is_empty())
        .map(str::to_string);
    Some((url, quality))
}

/// First `<iframe src>` on the page
pub fn find_iframe_src(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("iframe[src]").ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .map(clean_url)
        .find(|src| !src.is_empty() && !src.starts_with("about:") && !src.starts_with("javascript:"))
}

/// Subtitle tracks declared on the page, with unresolved URLs
pub fn parse_subtitle_tracks(html: &str) -> Vec<VideoSubtitle> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"track[kind="subtitles"], .subtitle-track"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let attrs = el.value();
            let src = attrs.attr("src").map(clean_url).filter(|s| !s.is_empty())?;
            let language = attrs
                .attr("srclang")
                .or_else(|| attrs.attr("data-lang"))
                .unwrap_or("en")
                .to_string();
            let label = attrs
                .attr("label")
                .map(str::to_string)
                .unwrap_or_else(|| language.to_uppercase());
            Some(VideoSubtitle {
                url: src,
                language,
                label,
            })
        })
        .collect()
}

/// Quality label implied by a resolution number in the URL
///
/// When several resolutions appear the highest wins (1080 over 720 over 480),
/// whatever their order in the URL. Only standalone numbers count, so
/// `17200` or `4800` imply nothing.
pub fn quality_from_url(url: &str) -> Option<&'static str> {
    let re = Regex::new(r"(?:^|[^0-9])(1080|720|480)(?:[^0-9]|$)").ok()?;
    let found: Vec<&str> = re
        .captures_iter(url)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    ["1080", "720", "480"]
        .into_iter()
        .find(|res| found.contains(res))
        .map(|res| match res {
            "1080" => "1080p",
            "720" => "720p",
            _ => "480p",
        })
}

/// Unescapes JSON slashes and common HTML entities in a scraped URL
fn clean_url(raw: &str) -> String {
    raw.trim()
        .replace("\\/", "/")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_video_tag_prefers_hls() {
        let html = r#"
        <video id="player">
          <source src="https://cdn.example/v-480.mp4" type="video/mp4">
          <source src="https://cdn.example/master.m3u8" type="application/x-mpegURL">
        </video>
        "#;

        let source = extract_inline_source(html, HANIME_SCRIPT_PATTERNS).unwrap();
        assert_eq!(source.url, "https://cdn.example/master.m3u8");
        assert_eq!(source.method, ExtractionMethod::VideoTag);
    }

    #[test]
    fn test_video_tag_mpegurl_type_case() {
        let html = r#"<video><source src="/hls/a.txt" type="application/vnd.apple.mpegurl"><source src="/b.mp4"></video>"#;
        let tag = find_media_tag_source(&doc(html)).unwrap();
        assert_eq!(tag.src, "/hls/a.txt");
        assert_eq!(tag.declared_type, Some(VideoSourceType::M3u8));
    }

    #[test]
    fn test_declared_type_carried_to_extracted_source() {
        let html = r#"<video><source src="/streams/ep1" type="application/x-mpegURL"></video>"#;

        let source = extract_inline_source(html, YHDM_SCRIPT_PATTERNS).unwrap();
        assert_eq!(source.url, "/streams/ep1");
        assert_eq!(source.declared_type, Some(VideoSourceType::M3u8));
    }

    #[test]
    fn test_bare_video_src() {
        let html = r#"<video src="https://cdn.example/clip.mp4" controls></video>"#;
        let tag = find_media_tag_source(&doc(html)).unwrap();
        assert_eq!(tag.src, "https://cdn.example/clip.mp4");
        assert_eq!(tag.declared_type, None);
    }

    #[test]
    fn test_media_attribute_scan() {
        let html = r#"<div data-player file='/media/ep1.flv?sign=1'></div>"#;
        assert_eq!(find_media_attribute(html).as_deref(), Some("/media/ep1.flv?sign=1"));
    }

    #[test]
    fn test_script_m3u8_pattern() {
        let html = r#"
        <script>var other = "https://example.com/app.js";</script>
        <script>
          const player = new Player({ sources: [{ src: "https:\/\/cdn.example\/hls\/index.m3u8?t=1" }] });
        </script>
        "#;

        let source = extract_inline_source(html, HANIME_SCRIPT_PATTERNS).unwrap();
        assert_eq!(source.url, "https://cdn.example/hls/index.m3u8?t=1");
        assert_eq!(source.method, ExtractionMethod::Script);
    }

    #[test]
    fn test_script_video_url_key() {
        let html = r#"<script>window.__DATA__ = { videoUrl: "https://cdn.example/stream/abc" };</script>"#;
        assert_eq!(
            find_script_source(&doc(html), HANIME_SCRIPT_PATTERNS).as_deref(),
            Some("https://cdn.example/stream/abc")
        );
    }

    #[test]
    fn test_script_yhdm_player_json() {
        let html = r#"<script>var player_aaaa={"flag":"play","url":"https:\/\/v.example\/20240101\/index.m3u8","from":"m3u8"}</script>"#;

        let source = extract_inline_source(html, YHDM_SCRIPT_PATTERNS).unwrap();
        assert_eq!(source.url, "https://v.example/20240101/index.m3u8");
    }

    #[test]
    fn test_script_yhdm_config_block() {
        let html = r#"<script>var config = { autoplay: true, url: "/play/?id=42" };</script>"#;
        assert_eq!(
            find_script_source(&doc(html), YHDM_SCRIPT_PATTERNS).as_deref(),
            Some("/play/?id=42")
        );
    }

    #[test]
    fn test_json_ld_video_content_url() {
        let html = r#"
        <script type="application/ld+json">{ not json }</script>
        <script type="application/ld+json">
          {"@type":"WebPage","url":"https://hanime1.me/page","video":{"contentUrl":"https://cdn.example/full.mp4"}}
        </script>
        "#;

        let source = extract_inline_source(html, &[]).unwrap();
        assert_eq!(source.url, "https://cdn.example/full.mp4");
        assert_eq!(source.method, ExtractionMethod::JsonLd);
    }

    #[test]
    fn test_json_ld_array() {
        let html = r#"<script type="application/ld+json">[{"@type":"VideoObject","contentUrl":"https://cdn.example/a.mp4"}]</script>"#;
        assert_eq!(
            find_json_ld_source(&doc(html)).as_deref(),
            Some("https://cdn.example/a.mp4")
        );
    }

    #[test]
    fn test_json_ld_not_scanned_as_script() {
        let html = r#"<script type="application/ld+json">{"thumbnailUrl":"https://cdn.example/thumb.m3u8.jpg"}</script>"#;
        assert_eq!(find_script_source(&doc(html), HANIME_SCRIPT_PATTERNS), None);
    }

    #[test]
    fn test_no_source() {
        let html = r#"<html><body><p>Nothing to play</p><script>console.log(1)</script></body></html>"#;
        assert_eq!(extract_inline_source(html, HANIME_SCRIPT_PATTERNS), None);
    }

    #[test]
    fn test_api_source() {
        let value = serde_json::json!({"src": "https://cdn.example/a.m3u8", "quality": "720p"});
        assert_eq!(
            api_source(&value),
            Some(("https://cdn.example/a.m3u8".to_string(), Some("720p".to_string())))
        );

        let value = serde_json::json!({"videoUrl": "", "source": "/s.mp4"});
        assert_eq!(api_source(&value), Some(("/s.mp4".to_string(), None)));

        assert_eq!(api_source(&serde_json::json!({"error": "nope"})), None);
    }

    #[test]
    fn test_find_iframe_src() {
        let html = r#"<iframe src="about:blank"></iframe><iframe src="/player/embed.html?id=1" allowfullscreen></iframe>"#;
        assert_eq!(find_iframe_src(html).as_deref(), Some("/player/embed.html?id=1"));
        assert_eq!(find_iframe_src("<div></div>"), None);
    }

    #[test]
    fn test_parse_subtitle_tracks() {
        let html = r#"
        <video>
          <track kind="subtitles" src="/subs/zh.vtt" srclang="zh" label="中文">
          <track kind="captions" src="/subs/cc.vtt">
        </video>
        <div class="subtitle-track" src="/subs/en.vtt" data-lang="en"></div>
        "#;

        let tracks = parse_subtitle_tracks(html);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].url, "/subs/zh.vtt");
        assert_eq!(tracks[0].language, "zh");
        assert_eq!(tracks[0].label, "中文");
        assert_eq!(tracks[1].language, "en");
        assert_eq!(tracks[1].label, "EN");
    }

    #[test]
    fn test_quality_from_url() {
        assert_eq!(quality_from_url("https://cdn/x/1080/index.m3u8"), Some("1080p"));
        assert_eq!(quality_from_url("https://cdn/x_720p.mp4"), Some("720p"));
        assert_eq!(quality_from_url("https://cdn/x-480.mp4?a=720"), Some("720p"));
        assert_eq!(quality_from_url("https://cdn/480/720/1080.mp4"), Some("1080p"));
        assert_eq!(quality_from_url("https://cdn/1080/480.mp4"), Some("1080p"));
        assert_eq!(quality_from_url("https://cdn/17201/x.mp4"), None);
    }
}
