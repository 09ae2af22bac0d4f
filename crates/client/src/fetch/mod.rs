//! Upstream fetch capability.
//!
//! ### Contract
//! - A [`Fetcher`] issues exactly one network attempt per call.
//! - Transport failures (connect, timeout, oversize body) are errors.
//! - HTTP error statuses are *responses*: the caller decides what to do.
//!
//! ### Transport cache bypass
//! - [`FetchOptions::bypass_cache`] sends `Cache-Control: no-store` and
//!   `Pragma: no-cache` so intermediaries must do a real round trip.

use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

use shellcache_core::{AppConfig, CacheRequest, Error, ResponseSnapshot};

/// Per-call fetch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Force a real round trip past any transport-level cache.
    pub bypass_cache: bool,
}

impl FetchOptions {
    pub fn bypass_cache() -> Self {
        Self { bypass_cache: true }
    }
}

/// Issues a request over the network.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &CacheRequest, options: FetchOptions) -> Result<ResponseSnapshot, Error>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn map_send_error(url: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(format!("{url}: {err}"))
        } else {
            Error::Network(format!("{url}: {err}"))
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &CacheRequest, options: FetchOptions) -> Result<ResponseSnapshot, Error> {
        let start = Instant::now();
        let url = request.url().as_str();
        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {e}", request.method())))?;

        let mut builder = self.http.request(method, url);
        if options.bypass_cache {
            builder = builder
                .header(header::CACHE_CONTROL, "no-store")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await.map_err(|e| Self::map_send_error(url, e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response.bytes().await.map_err(|e| Self::map_send_error(url, e))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method(),
            url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(ResponseSnapshot { status: status.as_u16(), headers, body: body.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "spot/2".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "spot/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_options() {
        assert!(!FetchOptions::default().bypass_cache);
        assert!(FetchOptions::bypass_cache().bypass_cache);
    }

    #[tokio::test]
    async fn test_http_fetcher_new() {
        let fetcher = HttpFetcher::new(FetchConfig::default());
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        let fetcher = HttpFetcher::new(FetchConfig { timeout: Duration::from_millis(500), ..Default::default() }).unwrap();
        let req = CacheRequest::get("http://127.0.0.1:9/unreachable").unwrap();
        let result = fetcher.fetch(&req, FetchOptions::default()).await;
        assert!(result.unwrap_err().is_network());
    }

    #[tokio::test]
    async fn test_bypass_sends_no_store_and_returns_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/marketdata"))
            .and(header("cache-control", "no-store"))
            .and(header("pragma", "no-cache"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let req = CacheRequest::get(&format!("{}/v1/marketdata", server.uri())).unwrap();
        let response = fetcher.fetch(&req, FetchOptions::bypass_cache()).await.unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.body, b"busy");
    }

    #[tokio::test]
    async fn test_default_fetch_sends_no_cache_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/npm/chart.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("chart"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let req = CacheRequest::get(&format!("{}/npm/chart.js", server.uri())).unwrap();
        let response = fetcher.fetch(&req, FetchOptions::default()).await.unwrap();

        assert_eq!(response.status, 200);
        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].headers.get("cache-control").is_none());
        assert!(received[0].headers.get("pragma").is_none());
    }
}
