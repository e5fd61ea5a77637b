//! HTTP client for ContentDB operations.
//!
//! This module wraps `reqwest` with the retry policy the registry expects:
//! - Linear backoff on rate limiting and gateway errors (429, 502, 503)
//! - Immediate failure on 404 and any other non-2xx status
//! - Transparent redirect following for archive downloads
//! - Custom User-Agent header
//!
//! # Examples
//!
//! ```no_run
//! use cdb_pm::http::{HttpClient, HttpClientConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::new()
//!     .with_base_url("https://content.minetest.net".to_string())
//!     .with_max_retries(3)
//!     .with_backoff_factor(Duration::from_millis(500));
//!
//! let client = HttpClient::with_config(config)?;
//! let body = client.get_bytes("/packages/rubenwardy/sfinv/download/").await?;
//! println!("Downloaded {} bytes", body.len());
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://content.minetest.net";
pub const DEFAULT_USER_AGENT: &str = concat!("cdb-pm/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_MAX_RETRIES: u32 = 8;
pub const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_secs(2);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Not found: {url}")]
    NotFound { url: String },

    #[error("HTTP {status}: {url}: {payload}")]
    Status {
        status: u16,
        url: String,
        payload: String,
    },

    #[error("Max retries exceeded for {url} after {retries} retries")]
    MaxRetries { url: String, retries: u32 },

    #[error("JSON deserialization error: {0}")]
    JsonParse(String),
}

impl HttpError {
    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::NotFound { .. } => Some(404),
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// How a single response is handled by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Retryable,
    NotFound,
    Fatal,
}

impl ResponseClass {
    pub fn of(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE => ResponseClass::Retryable,
            StatusCode::NOT_FOUND => ResponseClass::NotFound,
            s if s.is_success() => ResponseClass::Success,
            _ => ResponseClass::Fatal,
        }
    }
}

pub struct HttpClient {
    client: Client,
    base_url: String,
    user_agent: String,
    max_retries: u32,
    backoff_factor: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, HttpError> {
        // Validate early so a bad host fails at construction, not on first call
        Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent,
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
        })
    }

    /// Build the absolute URL for a registry path and query.
    ///
    /// Paths that already carry a scheme are used as-is; release download
    /// URLs may be either relative to the host or absolute.
    pub fn url_for<K, V>(&self, path: &str, query: &[(K, V)]) -> Result<Url, HttpError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path)?
        } else if path.starts_with('/') {
            Url::parse(&format!("{}{}", self.base_url, path))?
        } else {
            Url::parse(&format!("{}/{}", self.base_url, path))?
        };

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key.as_ref(), value.as_ref());
            }
        }

        Ok(url)
    }

    /// Perform a request with the bounded retry policy.
    ///
    /// On success the open response is returned; the caller consumes the body.
    pub async fn call<K, V>(
        &self,
        method: Method,
        path: &str,
        query: &[(K, V)],
    ) -> Result<Response, HttpError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = self.url_for(path, query)?;
        let mut retry_count: u32 = 0;

        loop {
            log::debug!("Request {} {}", method, url);
            let response = self.client.request(method.clone(), url.clone()).send().await?;
            let status = response.status();
            log::debug!("Response {}: {}", status.as_u16(), status);

            match ResponseClass::of(status) {
                ResponseClass::Retryable => {
                    drop(response);
                    retry_count += 1;
                    if retry_count > self.max_retries {
                        return Err(HttpError::MaxRetries {
                            url: url.to_string(),
                            retries: self.max_retries,
                        });
                    }
                    let delay = self.backoff_for(retry_count);
                    log::warn!(
                        "{} returned {}, retrying in {:?} ({}/{})",
                        url,
                        status.as_u16(),
                        delay,
                        retry_count,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                ResponseClass::NotFound => {
                    return Err(HttpError::NotFound { url: url.to_string() });
                }
                ResponseClass::Fatal => {
                    let payload = response.text().await.unwrap_or_default();
                    return Err(HttpError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                        payload,
                    });
                }
                ResponseClass::Success => {
                    if let Some(cache) = response.headers().get("x-cache") {
                        log::debug!("Cache status: {}", cache.to_str().unwrap_or("<binary>"));
                    }
                    return Ok(response);
                }
            }
        }
    }

    /// Linear backoff: factor * retry count
    pub fn backoff_for(&self, retry_count: u32) -> Duration {
        self.backoff_factor
            .checked_mul(retry_count)
            .unwrap_or(Duration::MAX)
    }

    /// GET with retries
    pub async fn get<K, V>(&self, path: &str, query: &[(K, V)]) -> Result<Response, HttpError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.call(Method::GET, path, query).await
    }

    /// GET JSON and deserialize
    pub async fn get_json<T, K, V>(&self, path: &str, query: &[(K, V)]) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let response = self.get(path, query).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| HttpError::JsonParse(e.to_string()))
    }

    /// Download to memory, following redirects
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, HttpError> {
        let start = Instant::now();
        let response = self.get::<&str, &str>(path, &[]).await?;
        log::debug!("Fetching bytes from {}", response.url());
        let bytes = response.bytes().await?;
        log::debug!("Wrote {} bytes ({:?})", bytes.len(), start.elapsed());
        Ok(bytes.to_vec())
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the configured user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get the maximum number of retries
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the backoff factor
    pub fn backoff_factor(&self) -> Duration {
        self.backoff_factor
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_factor(mut self, backoff_factor: Duration) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer, max_retries: u32) -> HttpClient {
        let config = HttpClientConfig::new()
            .with_base_url(server.uri())
            .with_max_retries(max_retries)
            .with_backoff_factor(Duration::from_millis(1));
        HttpClient::with_config(config).unwrap()
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    #[test]
    fn test_config_builder() {
        let config = HttpClientConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(2)
            .with_backoff_factor(Duration::from_millis(10))
            .with_user_agent("Test/1.0".to_string());

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.backoff_factor, Duration::from_millis(10));
        assert_eq!(config.user_agent, "Test/1.0");
    }

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_retries, 8);
        assert_eq!(config.backoff_factor, Duration::from_secs(2));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = HttpClientConfig::new().with_base_url("not a url".to_string());
        assert!(matches!(
            HttpClient::with_config(config),
            Err(HttpError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_response_class() {
        assert_eq!(ResponseClass::of(StatusCode::OK), ResponseClass::Success);
        assert_eq!(ResponseClass::of(StatusCode::NO_CONTENT), ResponseClass::Success);
        assert_eq!(ResponseClass::of(StatusCode::TOO_MANY_REQUESTS), ResponseClass::Retryable);
        assert_eq!(ResponseClass::of(StatusCode::BAD_GATEWAY), ResponseClass::Retryable);
        assert_eq!(ResponseClass::of(StatusCode::SERVICE_UNAVAILABLE), ResponseClass::Retryable);
        assert_eq!(ResponseClass::of(StatusCode::NOT_FOUND), ResponseClass::NotFound);
        assert_eq!(ResponseClass::of(StatusCode::INTERNAL_SERVER_ERROR), ResponseClass::Fatal);
        assert_eq!(ResponseClass::of(StatusCode::GATEWAY_TIMEOUT), ResponseClass::Fatal);
        assert_eq!(ResponseClass::of(StatusCode::FORBIDDEN), ResponseClass::Fatal);
    }

    #[test]
    fn test_linear_backoff_calculation() {
        let client = HttpClient::with_config(
            HttpClientConfig::new().with_backoff_factor(Duration::from_secs(2)),
        )
        .unwrap();

        assert_eq!(client.backoff_for(1), Duration::from_secs(2));
        assert_eq!(client.backoff_for(2), Duration::from_secs(4));
        assert_eq!(client.backoff_for(3), Duration::from_secs(6));
    }

    #[test]
    fn test_backoff_saturates_on_overflow() {
        let client = HttpClient::with_config(
            HttpClientConfig::new().with_backoff_factor(Duration::from_secs(u64::MAX / 2)),
        )
        .unwrap();

        assert_eq!(client.backoff_for(0), Duration::ZERO);
        assert_eq!(client.backoff_for(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_url_for_relative_and_absolute() {
        let client = HttpClient::with_config(
            HttpClientConfig::new().with_base_url("https://content.example.org/".to_string()),
        )
        .unwrap();

        let url = client.url_for::<&str, &str>("/api/packages/", &[]).unwrap();
        assert_eq!(url.as_str(), "https://content.example.org/api/packages/");

        let url = client
            .url_for("/api/packages/", &[("q", "mesecons lamp"), ("tag", "a"), ("tag", "b")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://content.example.org/api/packages/?q=mesecons+lamp&tag=a&tag=b"
        );

        let url = client
            .url_for::<&str, &str>("https://cdn.example.org/uploads/x.zip", &[])
            .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.org/uploads/x.zip");
    }

    #[test]
    fn test_http_error_display() {
        let err = HttpError::NotFound {
            url: "https://example.com/missing".to_string(),
        };
        assert_eq!(err.to_string(), "Not found: https://example.com/missing");
        assert_eq!(err.status(), Some(404));

        let err = HttpError::Status {
            status: 500,
            url: "https://example.com/boom".to_string(),
            payload: "oops".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: https://example.com/boom: oops");
        assert_eq!(err.status(), Some(500));

        let err = HttpError::MaxRetries {
            url: "https://example.com/busy".to_string(),
            retries: 8,
        };
        assert_eq!(
            err.to_string(),
            "Max retries exceeded for https://example.com/busy after 8 retries"
        );
    }

    #[tokio::test]
    async fn test_too_many_requests_retries_until_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mock/429"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = test_client(&server, 2);
        let result = client.get::<&str, &str>("/mock/429", &[]).await;

        assert!(matches!(result, Err(HttpError::MaxRetries { retries: 2, .. })));
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_gateway_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mock/502"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mock/503"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server, 1);
        assert!(matches!(
            client.get::<&str, &str>("/mock/502", &[]).await,
            Err(HttpError::MaxRetries { .. })
        ));
        assert!(matches!(
            client.get::<&str, &str>("/mock/503", &[]).await,
            Err(HttpError::MaxRetries { .. })
        ));
        assert_eq!(request_count(&server).await, 4);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mock/500"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
            .mount(&server)
            .await;

        let client = test_client(&server, 2);
        let result = client.get::<&str, &str>("/mock/500", &[]).await;

        match result {
            Err(HttpError::Status { status, payload, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(payload, "internal failure");
            }
            other => panic!("Expected Status error, got {:?}", other.map(|r| r.status())),
        }
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mock/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server, 2);
        let result = client.get::<&str, &str>("/mock/404", &[]).await;

        assert!(matches!(result, Err(HttpError::NotFound { .. })));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mock/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mock/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = test_client(&server, 8);
        let response = client.get::<&str, &str>("/mock/flaky", &[]).await.unwrap();

        assert_eq!(response.text().await.unwrap(), "ok");
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_query_and_user_agent_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/packages/"))
            .and(query_param("q", "mesecons"))
            .and(header("User-Agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2, 3])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, 0);
        let values: Vec<u32> = client
            .get_json("/api/packages/", &[("q", "mesecons")])
            .await
            .unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_json_reports_decode_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = test_client(&server, 0);
        let result: Result<Vec<u32>, _> = client.get_json::<_, &str, &str>("/broken", &[]).await;
        assert!(matches!(result, Err(HttpError::JsonParse(_))));
    }

    #[tokio::test]
    async fn test_get_bytes_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/packages/a/b/download/"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/uploads/b.zip", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/uploads/b.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 100]))
            .mount(&server)
            .await;

        let client = test_client(&server, 0);
        let bytes = client.get_bytes("/packages/a/b/download/").await.unwrap();
        assert_eq!(bytes, vec![7u8; 100]);
    }
}
