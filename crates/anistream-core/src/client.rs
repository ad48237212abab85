//! HTTP client with multi-domain fallback
//!
//! Every request carries spoofed browser headers. Site-relative endpoints are
//! tried against the working domain first and then each remaining mirror; the
//! first domain that answers with a success status becomes the new working
//! domain. There is no retry or backoff beyond walking the domain list.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::error::{ProviderError, Result};

/// Configuration for the HTTP client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum requests per second (default: 4.0)
    pub requests_per_second: f64,
    /// Timeout for site-relative requests in seconds (default: 10)
    pub timeout_secs: u64,
    /// Timeout for episode and iframe pages in seconds (default: 15)
    pub page_timeout_secs: u64,
    /// Timeout for guessed API endpoints in seconds (default: 5)
    pub api_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 4.0,
            timeout_secs: 10,
            page_timeout_secs: 15,
            api_timeout_secs: 5,
        }
    }
}

/// Rate limiter to control request frequency
///
/// Ensures requests are spaced at least `min_interval` apart.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    ///
    /// Non-positive rates disable spacing, and so do rates too small to
    /// express as an interval. Use [`RateLimiter::try_new`] to reject those.
    pub fn new(requests_per_second: f64) -> Self {
        Self::with_interval(interval_for(requests_per_second).unwrap_or(Duration::ZERO))
    }

    /// Create a rate limiter, rejecting rates whose interval overflows `Duration`
    ///
    /// # Errors
    /// - `ParseError` if `requests_per_second` is positive but too small
    pub fn try_new(requests_per_second: f64) -> Result<Self> {
        let min_interval = interval_for(requests_per_second).ok_or_else(|| {
            ProviderError::ParseError(format!(
                "requests_per_second {} is too small for a request interval",
                requests_per_second
            ))
        })?;
        Ok(Self::with_interval(min_interval))
    }

    fn with_interval(min_interval: Duration) -> Self {
        let start = Instant::now()
            .checked_sub(min_interval)
            .unwrap_or_else(Instant::now);
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(start)),
        }
    }

    /// Sleeps until the minimum interval since the previous request has passed
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }

        *last = Instant::now();
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Spacing between requests, or `None` when it overflows `Duration`
fn interval_for(requests_per_second: f64) -> Option<Duration> {
    if requests_per_second > 0.0 {
        Duration::try_from_secs_f64(1.0 / requests_per_second).ok()
    } else {
        Some(Duration::ZERO)
    }
}

/// Body of a site-relative request together with the domain that served it
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub base_url: String,
    pub body: String,
}

/// HTTP client bound to one site and its mirror domains
pub struct FallbackClient {
    client: reqwest::Client,
    rate_limiter: RateLimiter,
    domains: Vec<String>,
    base_url: RwLock<String>,
    user_agent: String,
    accept: String,
    accept_language: String,
    timeout: Duration,
    page_timeout: Duration,
    api_timeout: Duration,
}

impl FallbackClient {
    /// Create a client for the given site
    ///
    /// # Errors
    /// - `InvalidUrl` if no domain is configured or a domain is not an absolute URL
    /// - `ParseError` if a configured header value is not valid or the request
    ///   rate is too small to space requests
    /// - `HttpError` if the underlying client cannot be built
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let domains: Vec<String> = site
            .domains
            .iter()
            .map(|d| d.trim().trim_end_matches('/').to_string())
            .filter(|d| !d.is_empty())
            .collect();

        let Some(primary) = domains.first().cloned() else {
            return Err(ProviderError::InvalidUrl(
                "At least one domain must be configured".to_string(),
            ));
        };
        for domain in &domains {
            url::Url::parse(domain)?;
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&site.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&site.accept_language)?);

        let client = reqwest::Client::builder()
            .user_agent(site.user_agent.as_str())
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(ProviderError::HttpError)?;

        let config = &site.client;
        Ok(Self {
            client,
            rate_limiter: RateLimiter::try_new(config.requests_per_second)?,
            domains,
            base_url: RwLock::new(primary),
            user_agent: site.user_agent.clone(),
            accept: site.accept.clone(),
            accept_language: site.accept_language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            api_timeout: Duration::from_secs(config.api_timeout_secs),
        })
    }

    /// Domain that answered the most recent site-relative request
    pub fn base_url(&self) -> String {
        self.base_url.read().clone()
    }

    /// Domains in the order the next request will try them
    pub fn domain_order(&self) -> Vec<String> {
        let current = self.base_url();
        let mut order = Vec::with_capacity(self.domains.len());
        order.push(current.clone());
        order.extend(self.domains.iter().filter(|d| **d != current).cloned());
        order
    }

    /// Fetch a site-relative endpoint, falling back across domains
    ///
    /// # Arguments
    /// * `endpoint` - Path and query, e.g. "/search?query=abc"
    ///
    /// # Errors
    /// - `AllDomainsFailed` when no domain answered with a success status
    pub async fn fetch(&self, endpoint: &str) -> Result<FetchedPage> {
        for domain in self.domain_order() {
            let url = format!("{}{}", domain, endpoint);
            match self.get_text(&url, Some(&domain), self.timeout).await {
                Ok(body) => {
                    self.switch_base_url(&domain);
                    return Ok(FetchedPage {
                        base_url: domain,
                        body,
                    });
                }
                Err(e) => {
                    warn!(domain = %domain, endpoint, error = %e, "domain failed, trying next");
                }
            }
        }

        Err(ProviderError::AllDomainsFailed(endpoint.to_string()))
    }

    /// Fetch an absolute page URL (episode page, embedded player)
    ///
    /// # Errors
    /// - `NotFound` on HTTP 404
    /// - `HttpError` on other network or status errors
    pub async fn fetch_page(&self, url: &str, referer: Option<&str>) -> Result<String> {
        self.get_text(url, referer, self.page_timeout).await
    }

    /// Fetch and decode a JSON document with the short API timeout
    pub async fn fetch_json(&self, url: &str, referer: Option<&str>) -> Result<serde_json::Value> {
        let body = self.get_text(url, referer, self.api_timeout).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Headers a player must send to stream from this site
    pub fn browser_headers(&self, referer: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("User-Agent".to_string(), self.user_agent.clone()),
            ("Referer".to_string(), referer.to_string()),
            ("Accept".to_string(), self.accept.clone()),
            ("Accept-Language".to_string(), self.accept_language.clone()),
        ])
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn get_text(&self, url: &str, referer: Option<&str>, timeout: Duration) -> Result<String> {
        self.rate_limiter.acquire().await;
        debug!(url, "GET");

        let mut request = self.client.get(url).timeout(timeout);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await.map_err(ProviderError::HttpError)?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(url.to_string()));
        }

        let response = response
            .error_for_status()
            .map_err(ProviderError::HttpError)?;

        response.text().await.map_err(ProviderError::HttpError)
    }

    fn switch_base_url(&self, domain: &str) {
        let mut current = self.base_url.write();
        if *current != domain {
            let previous = std::mem::replace(&mut *current, domain.to_string());
            info!(from = %previous, to = domain, "switching working domain");
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ProviderError::ParseError(format!("Invalid header value {:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn site(domains: Vec<String>) -> SiteConfig {
        SiteConfig::hanime().with_domains(domains)
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(2.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_rate_limiter_zero_rate() {
        let limiter = RateLimiter::new(0.0);
        assert_eq!(limiter.min_interval(), Duration::ZERO);
    }

    #[test]
    fn test_rate_limiter_tiny_rate() {
        assert!(matches!(RateLimiter::try_new(1e-30), Err(ProviderError::ParseError(_))));
        assert_eq!(RateLimiter::new(1e-30).min_interval(), Duration::ZERO);
        assert_eq!(RateLimiter::try_new(4.0).unwrap().min_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_client_rejects_unrepresentable_rate() {
        let site: SiteConfig = serde_json::from_str(
            r#"{"domains":["https://x.example"],"client":{"requests_per_second":1e-30}}"#,
        )
        .unwrap();
        let result = FallbackClient::new(&site);
        assert!(matches!(result, Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.requests_per_second, 4.0);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.page_timeout_secs, 15);
        assert_eq!(config.api_timeout_secs, 5);
    }

    #[test]
    fn test_client_requires_domain() {
        let result = FallbackClient::new(&site(vec![]));
        assert!(matches!(result, Err(ProviderError::InvalidUrl(_))));
    }

    #[test]
    fn test_client_rejects_relative_domain() {
        let result = FallbackClient::new(&site(vec!["hanime1.me".to_string()]));
        assert!(matches!(result, Err(ProviderError::InvalidUrl(_))));
    }

    #[test]
    fn test_domain_order_starts_with_primary() {
        let client = FallbackClient::new(&SiteConfig::hanime()).unwrap();
        assert_eq!(
            client.domain_order(),
            vec!["https://hanime1.me", "https://hanime.tv", "https://hanime1.tv"]
        );
    }

    #[test]
    fn test_domain_order_after_switch_has_no_duplicates() {
        let client = FallbackClient::new(&SiteConfig::hanime()).unwrap();
        client.switch_base_url("https://hanime.tv");
        assert_eq!(
            client.domain_order(),
            vec!["https://hanime.tv", "https://hanime1.me", "https://hanime1.tv"]
        );
    }

    #[test]
    fn test_browser_headers() {
        let client = FallbackClient::new(&SiteConfig::hanime()).unwrap();
        let headers = client.browser_headers("https://hanime1.me");
        assert_eq!(headers["Referer"], "https://hanime1.me");
        assert!(headers["User-Agent"].contains("Chrome/120"));
        assert_eq!(headers.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_falls_back_and_switches_domain() {
        let broken = MockServer::start().await;
        let working = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&broken)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "abc"))
            .and(header("referer", working.uri().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&working)
            .await;

        let client = FallbackClient::new(&site(vec![broken.uri(), working.uri()])).unwrap();
        let page = client.fetch("/search?query=abc").await.unwrap();

        assert_eq!(page.body, "<html>ok</html>");
        assert_eq!(page.base_url, working.uri());
        assert_eq!(client.base_url(), working.uri());
        assert_eq!(client.domain_order()[0], working.uri());
    }

    #[tokio::test]
    async fn test_fetch_all_domains_failed() {
        let first = MockServer::start().await;
        let second = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&first)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&second)
            .await;

        let client = FallbackClient::new(&site(vec![first.uri(), second.uri()])).unwrap();
        let result = client.fetch("/videos/hentai/x").await;

        match result {
            Err(ProviderError::AllDomainsFailed(endpoint)) => assert_eq!(endpoint, "/videos/hentai/x"),
            other => panic!("Expected AllDomainsFailed, got {:?}", other.map(|p| p.body)),
        }
        assert_eq!(client.base_url(), first.uri());
    }

    #[tokio::test]
    async fn test_fetch_page_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = FallbackClient::new(&site(vec![server.uri()])).unwrap();
        let url = format!("{}/missing", server.uri());
        let result = client.fetch_page(&url, None).await;

        assert!(matches!(result, Err(ProviderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/video/abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"videoUrl":"https://cdn/x.m3u8"}"#),
            )
            .mount(&server)
            .await;

        let client = FallbackClient::new(&site(vec![server.uri()])).unwrap();
        let url = format!("{}/api/video/abc", server.uri());
        let value = client.fetch_json(&url, None).await.unwrap();

        assert_eq!(value["videoUrl"], "https://cdn/x.m3u8");
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(10.0);

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(90));
    }
}
