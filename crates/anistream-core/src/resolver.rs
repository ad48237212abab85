//! Playable-source resolution for an episode page
//!
//! Runs the in-page heuristics, then guessed API endpoints, then follows
//! embedded player iframes and repeats the in-page heuristics there. The
//! first hit wins. Network failures along the way are logged and skipped.

use tracing::{debug, warn};

use crate::client::FallbackClient;
use crate::parser::video::{api_source, extract_inline_source, find_iframe_src};
use crate::parser::{ExtractedSource, ExtractionMethod};
use crate::types::VideoSourceType;
use crate::url::resolve_against_page;

/// How many nested iframes are followed below the episode page
pub const MAX_IFRAME_DEPTH: usize = 2;

/// A source URL resolved to an absolute address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub url: String,
    pub method: ExtractionMethod,
    /// Quality reported by an API endpoint, if any
    pub quality: Option<String>,
    /// Container declared by the media tag that carried the URL
    pub declared_type: Option<VideoSourceType>,
    /// Page the source was found on (the episode page or an iframe)
    pub found_on: String,
}

pub struct SourceResolver<'a> {
    client: &'a FallbackClient,
    script_patterns: &'a [&'a str],
    api_urls: Vec<String>,
}

impl<'a> SourceResolver<'a> {
    pub fn new(client: &'a FallbackClient, script_patterns: &'a [&'a str]) -> Self {
        Self {
            client,
            script_patterns,
            api_urls: Vec::new(),
        }
    }

    /// Absolute API URLs tried after the in-page heuristics fail on the episode page
    pub fn with_api_urls(mut self, api_urls: Vec<String>) -> Self {
        self.api_urls = api_urls;
        self
    }

    /// Resolves the first playable source reachable from `html`
    ///
    /// # Arguments
    /// * `html` - Body of the episode page
    /// * `page_url` - Absolute URL the body was fetched from
    ///
    /// # Returns
    /// `None` when every heuristic came up empty
    pub async fn resolve(&self, html: &str, page_url: &str) -> Option<ResolvedSource> {
        let mut html = html.to_string();
        let mut page_url = page_url.to_string();
        let mut visited = vec![page_url.clone()];

        for depth in 0..=MAX_IFRAME_DEPTH {
            if let Some(ExtractedSource {
                url,
                method,
                declared_type,
            }) = extract_inline_source(&html, self.script_patterns)
            {
                let method = if depth == 0 { method } else { ExtractionMethod::Iframe };
                debug!(?method, depth, "found inline source");
                return Some(ResolvedSource {
                    url: resolve_against_page(&url, &page_url),
                    method,
                    quality: None,
                    declared_type,
                    found_on: page_url,
                });
            }

            if depth == 0
                && let Some(resolved) = self.try_api_urls().await
            {
                return Some(resolved);
            }

            let Some(src) = find_iframe_src(&html) else {
                debug!(depth, page = %page_url, "no iframe to follow");
                return None;
            };
            let iframe_url = resolve_against_page(&src, &page_url);
            if depth == MAX_IFRAME_DEPTH || visited.contains(&iframe_url) {
                return None;
            }

            match self.client.fetch_page(&iframe_url, Some(&page_url)).await {
                Ok(body) => {
                    debug!(iframe = %iframe_url, depth = depth + 1, "following embedded player");
                    html = body;
                    visited.push(iframe_url.clone());
                    page_url = iframe_url;
                }
                Err(e) => {
                    warn!(iframe = %iframe_url, error = %e, "failed to load embedded player");
                    return None;
                }
            }
        }

        None
    }

    async fn try_api_urls(&self) -> Option<ResolvedSource> {
        let referer = self.client.base_url();

        for api_url in &self.api_urls {
            let value = match self.client.fetch_json(api_url, Some(&referer)).await {
                Ok(value) => value,
                Err(e) => {
                    debug!(api = %api_url, error = %e, "API guess failed");
                    continue;
                }
            };

            if let Some((url, quality)) = api_source(&value) {
                return Some(ResolvedSource {
                    url: resolve_against_page(&url, api_url),
                    method: ExtractionMethod::Api,
                    quality,
                    declared_type: None,
                    found_on: api_url.clone(),
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::parser::video::{HANIME_SCRIPT_PATTERNS, YHDM_SCRIPT_PATTERNS};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> FallbackClient {
        FallbackClient::new(&SiteConfig::yhdm().with_domains([server.uri()])).unwrap()
    }

    #[tokio::test]
    async fn test_inline_source_resolved_against_page() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let page = format!("{}/vod-play/1/ep1.html", server.uri());

        let resolved = SourceResolver::new(&client, YHDM_SCRIPT_PATTERNS)
            .resolve(r#"<video src="/media/1.mp4"></video>"#, &page)
            .await
            .unwrap();

        assert_eq!(resolved.url, format!("{}/media/1.mp4", server.uri()));
        assert_eq!(resolved.method, ExtractionMethod::VideoTag);
        assert_eq!(resolved.declared_type, None);
    }

    #[tokio::test]
    async fn test_api_guess_after_inline_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/video/abc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/videos/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"url":"https://cdn.example/abc.m3u8","quality":"1080p"}"#,
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let api_urls = vec![
            format!("{}/api/video/abc", server.uri()),
            format!("{}/api/v1/videos/abc", server.uri()),
        ];
        let resolved = SourceResolver::new(&client, HANIME_SCRIPT_PATTERNS)
            .with_api_urls(api_urls)
            .resolve("<html><body>nothing</body></html>", &server.uri())
            .await
            .unwrap();

        assert_eq!(resolved.url, "https://cdn.example/abc.m3u8");
        assert_eq!(resolved.method, ExtractionMethod::Api);
        assert_eq!(resolved.quality.as_deref(), Some("1080p"));
    }

    #[tokio::test]
    async fn test_follows_nested_iframes() {
        let server = MockServer::start().await;
        let page = format!("{}/vod-play/1/ep1.html", server.uri());

        Mock::given(method("GET"))
            .and(path("/embed/outer"))
            .and(header("referer", page.as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<iframe src="inner?id=7"></iframe>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/embed/inner"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<script>var cfg = { file: "hls/7.m3u8" };</script>"#,
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let resolved = SourceResolver::new(&client, YHDM_SCRIPT_PATTERNS)
            .resolve(r#"<iframe src="/embed/outer"></iframe>"#, &page)
            .await
            .unwrap();

        assert_eq!(resolved.url, format!("{}/embed/hls/7.m3u8", server.uri()));
        assert_eq!(resolved.method, ExtractionMethod::Iframe);
        assert_eq!(resolved.found_on, format!("{}/embed/inner?id=7", server.uri()));
    }

    #[tokio::test]
    async fn test_iframe_depth_limit() {
        let server = MockServer::start().await;
        for (from, to) in [("/f1", "/f2"), ("/f2", "/f3")] {
            Mock::given(method("GET"))
                .and(path(from))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(format!(r#"<iframe src="{}"></iframe>"#, to)),
                )
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/f3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<video src="/deep.mp4"></video>"#))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let resolved = SourceResolver::new(&client, YHDM_SCRIPT_PATTERNS)
            .resolve(r#"<iframe src="/f1"></iframe>"#, &server.uri())
            .await;

        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_iframe_loop_stops_at_visited_page() {
        let server = MockServer::start().await;
        let page = format!("{}/play/a", server.uri());
        Mock::given(method("GET"))
            .and(path("/play/b"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<iframe src="/play/a"></iframe>"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/play/a"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<iframe src="/play/b"></iframe>"#))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let resolved = SourceResolver::new(&client, YHDM_SCRIPT_PATTERNS)
            .resolve(r#"<iframe src="/play/b"></iframe>"#, &page)
            .await;

        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_broken_iframe_degrades_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let resolved = SourceResolver::new(&client, YHDM_SCRIPT_PATTERNS)
            .resolve(r#"<iframe src="/player"></iframe>"#, &server.uri())
            .await;

        assert_eq!(resolved, None);
    }
}
