//! Centralized HTTP client configuration and a thin request wrapper.
//!
//! One [`HttpManager`] owns one connection pool. Clone it freely: clones
//! share the pool.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ServiceError;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Read timeout (default: 30s)
    pub read_timeout: Duration,
    /// Write timeout (default: 30s)
    pub write_timeout: Duration,
    /// Pool idle timeout (default: 5 min)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 5)
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
    /// Retry once when the connection cannot be established (default: true)
    pub retry_on_connection_failure: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(300),
            pool_max_idle_per_host: 5,
            user_agent: concat!("service-base/", env!("CARGO_PKG_VERSION")).to_string(),
            retry_on_connection_failure: true,
        }
    }
}

impl HttpConfig {
    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read and write timeouts.
    #[must_use]
    pub const fn with_io_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the pool settings.
    #[must_use]
    pub const fn with_pool_config(mut self, idle_timeout: Duration, max_idle: usize) -> Self {
        self.pool_idle_timeout = idle_timeout;
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Enable or disable the single retry on connection failure.
    #[must_use]
    pub const fn with_retry_on_connection_failure(mut self, retry: bool) -> Self {
        self.retry_on_connection_failure = retry;
        self
    }

    /// Deadline for a whole request: reading plus writing.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.read_timeout.saturating_add(self.write_timeout)
    }
}

/// Build a configured HTTP client.
///
/// reqwest has no write-phase timeout, so the write timeout is folded into
/// the total request deadline.
///
/// # Errors
///
/// Returns an error if the client cannot be built (e.g., TLS initialization fails).
///
/// # Examples
///
/// ```
/// use service_base::{HttpConfig, build_http_client};
/// use std::time::Duration;
///
/// let config = HttpConfig::default().with_connect_timeout(Duration::from_secs(3));
/// let client = build_http_client(&config).expect("Failed to build client");
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .timeout(config.request_timeout())
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .use_rustls_tls()
        .build()
}

/// Errors returned by [`HttpManager`].
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// Transport failure, timeout or invalid request.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Request body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<HttpClientError> for ServiceError {
    fn from(err: HttpClientError) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

/// Shared HTTP client returning response bodies as text.
#[derive(Debug, Clone)]
pub struct HttpManager {
    client: Client,
    retry_on_connection_failure: bool,
}

impl HttpManager {
    /// Build a manager with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpClientError> {
        Ok(Self::from_client(
            build_http_client(config)?,
            config.retry_on_connection_failure,
        ))
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn from_client(client: Client, retry_on_connection_failure: bool) -> Self {
        Self {
            client,
            retry_on_connection_failure,
        }
    }

    /// GET `url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on transport failure or a non-2xx status.
    pub async fn get(&self, url: &str) -> Result<String, HttpClientError> {
        self.get_with_headers(url, &HeaderMap::new()).await
    }

    /// GET `url` with extra headers.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on transport failure or a non-2xx status.
    pub async fn get_with_headers(&self, url: &str, headers: &HeaderMap) -> Result<String, HttpClientError> {
        self.execute(Method::GET, url, |client| {
            client.get(url).headers(headers.clone())
        })
        .await
    }

    /// POST `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on encoding or transport failure or a non-2xx status.
    pub async fn post_json<B>(&self, url: &str, body: &B) -> Result<String, HttpClientError>
    where
        B: Serialize + ?Sized,
    {
        self.post_json_with_headers(url, body, &HeaderMap::new()).await
    }

    /// POST `body` as JSON with extra headers.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on encoding or transport failure or a non-2xx status.
    pub async fn post_json_with_headers<B>(
        &self,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<String, HttpClientError>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body)?;
        self.send_json(Method::POST, url, &payload, headers).await
    }

    /// POST `form` as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on encoding or transport failure or a non-2xx status.
    pub async fn post_form<F>(&self, url: &str, form: &F) -> Result<String, HttpClientError>
    where
        F: Serialize + ?Sized,
    {
        self.post_form_with_headers(url, form, &HeaderMap::new()).await
    }

    /// POST a form with extra headers.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on encoding or transport failure or a non-2xx status.
    pub async fn post_form_with_headers<F>(
        &self,
        url: &str,
        form: &F,
        headers: &HeaderMap,
    ) -> Result<String, HttpClientError>
    where
        F: Serialize + ?Sized,
    {
        self.execute(Method::POST, url, |client| {
            client.post(url).headers(headers.clone()).form(form)
        })
        .await
    }

    /// PUT `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on encoding or transport failure or a non-2xx status.
    pub async fn put_json<B>(&self, url: &str, body: &B) -> Result<String, HttpClientError>
    where
        B: Serialize + ?Sized,
    {
        self.put_json_with_headers(url, body, &HeaderMap::new()).await
    }

    /// PUT `body` as JSON with extra headers.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on encoding or transport failure or a non-2xx status.
    pub async fn put_json_with_headers<B>(
        &self,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<String, HttpClientError>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body)?;
        self.send_json(Method::PUT, url, &payload, headers).await
    }

    /// DELETE `url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on transport failure or a non-2xx status.
    pub async fn delete(&self, url: &str) -> Result<String, HttpClientError> {
        self.delete_with_headers(url, &HeaderMap::new()).await
    }

    /// DELETE `url` with extra headers.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] on transport failure or a non-2xx status.
    pub async fn delete_with_headers(&self, url: &str, headers: &HeaderMap) -> Result<String, HttpClientError> {
        self.execute(Method::DELETE, url, |client| {
            client.delete(url).headers(headers.clone())
        })
        .await
    }

    /// Fire-and-forget GET. `on_complete` runs on the runtime once the call ends.
    ///
    /// The call cannot be cancelled. Must be called from within a tokio runtime.
    pub fn get_async<C>(&self, url: impl Into<String>, on_complete: C)
    where
        C: FnOnce(Result<String, HttpClientError>) + Send + 'static,
    {
        self.get_async_with_headers(url, HeaderMap::new(), on_complete);
    }

    /// Fire-and-forget GET with extra headers. See [`HttpManager::get_async`].
    pub fn get_async_with_headers<C>(&self, url: impl Into<String>, headers: HeaderMap, on_complete: C)
    where
        C: FnOnce(Result<String, HttpClientError>) + Send + 'static,
    {
        let manager = self.clone();
        let url = url.into();
        tokio::spawn(async move {
            on_complete(manager.get_with_headers(&url, &headers).await);
        });
    }

    /// Fire-and-forget JSON POST. See [`HttpManager::get_async`].
    ///
    /// The body is encoded before the task starts; an encoding failure is
    /// reported through `on_complete`.
    pub fn post_json_async<B, C>(&self, url: impl Into<String>, body: &B, on_complete: C)
    where
        B: Serialize + ?Sized,
        C: FnOnce(Result<String, HttpClientError>) + Send + 'static,
    {
        self.post_json_async_with_headers(url, body, HeaderMap::new(), on_complete);
    }

    /// Fire-and-forget JSON POST with extra headers. See [`HttpManager::get_async`].
    pub fn post_json_async_with_headers<B, C>(
        &self,
        url: impl Into<String>,
        body: &B,
        headers: HeaderMap,
        on_complete: C,
    ) where
        B: Serialize + ?Sized,
        C: FnOnce(Result<String, HttpClientError>) + Send + 'static,
    {
        let manager = self.clone();
        let url = url.into();
        let payload = serde_json::to_vec(body);
        tokio::spawn(async move {
            let result = match payload {
                Ok(payload) => manager.send_json(Method::POST, &url, &payload, &headers).await,
                Err(err) => Err(err.into()),
            };
            on_complete(result);
        });
    }

    async fn send_json(
        &self,
        method: Method,
        url: &str,
        payload: &[u8],
        headers: &HeaderMap,
    ) -> Result<String, HttpClientError> {
        self.execute(method.clone(), url, |client| {
            json_body(client.request(method.clone(), url), headers, payload)
        })
        .await
    }

    async fn execute<F>(&self, method: Method, url: &str, build: F) -> Result<String, HttpClientError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let started = Instant::now();
        let sent = retry_once_on_connect(
            self.retry_on_connection_failure,
            reqwest::Error::is_connect,
            || build(&self.client).send(),
        )
        .await;

        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                debug!(%method, url, elapsed_ms = elapsed_ms(started), error = %err, "HTTP call failed");
                return Err(err.into());
            }
        };

        let status = response.status();
        debug!(%method, url, status = status.as_u16(), elapsed_ms = elapsed_ms(started), "HTTP call");
        if !status.is_success() {
            return Err(HttpClientError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Run `attempt`, and run it exactly once more if it failed to connect.
async fn retry_once_on_connect<T, E, A, Fut>(
    enabled: bool,
    is_connect: fn(&E) -> bool,
    mut attempt: A,
) -> Result<T, E>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match attempt().await {
        Err(err) if enabled && is_connect(&err) => {
            warn!("Connection failed, retrying once");
            attempt().await
        }
        result => result,
    }
}

fn json_body(builder: RequestBuilder, headers: &HeaderMap, payload: &[u8]) -> RequestBuilder {
    builder
        .headers(headers.clone())
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(payload.to_vec())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert_eq!(config.write_timeout, Duration::from_secs(30));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(300));
        assert_eq!(config.pool_max_idle_per_host, 5);
        assert!(config.retry_on_connection_failure);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::default()
            .with_io_timeouts(Duration::from_secs(5), Duration::from_secs(2))
            .with_user_agent("test-agent")
            .with_retry_on_connection_failure(false);

        assert_eq!(config.request_timeout(), Duration::from_secs(7));
        assert_eq!(config.user_agent, "test-agent");
        assert!(!config.retry_on_connection_failure);
    }

    #[test]
    fn test_build_client() {
        let config = HttpConfig::default();
        let result = build_http_client(&config);
        assert!(result.is_ok());
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Failure {
        Connect,
        Refused,
    }

    fn is_connect(failure: &Failure) -> bool {
        *failure == Failure::Connect
    }

    #[tokio::test]
    async fn test_connect_failure_retried_exactly_once() {
        let calls = Cell::new(0);
        let result: Result<(), Failure> = retry_once_on_connect(true, is_connect, || {
            calls.set(calls.get() + 1);
            async { Err(Failure::Connect) }
        })
        .await;
        assert_eq!(result, Err(Failure::Connect));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_second_attempt_can_succeed() {
        let calls = Cell::new(0);
        let result = retry_once_on_connect(true, is_connect, || {
            calls.set(calls.get() + 1);
            let attempt = calls.get();
            async move { if attempt == 1 { Err(Failure::Connect) } else { Ok(attempt) } }
        })
        .await;
        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_no_retry_when_disabled_or_not_connect() {
        let calls = Cell::new(0);
        let result: Result<(), Failure> = retry_once_on_connect(false, is_connect, || {
            calls.set(calls.get() + 1);
            async { Err(Failure::Connect) }
        })
        .await;
        assert_eq!(result, Err(Failure::Connect));
        assert_eq!(calls.get(), 1);

        let calls = Cell::new(0);
        let result: Result<(), Failure> = retry_once_on_connect(true, is_connect, || {
            calls.set(calls.get() + 1);
            async { Err(Failure::Refused) }
        })
        .await;
        assert_eq!(result, Err(Failure::Refused));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_error_is_internal() {
        let err = HttpClientError::UnexpectedStatus {
            status: 502,
            url: "http://upstream/x".to_string(),
        };
        assert!(matches!(ServiceError::from(err), ServiceError::Internal(_)));
    }
}
