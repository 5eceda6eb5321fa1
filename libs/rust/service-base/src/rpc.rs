//! Client for calling other services built on this crate.
//!
//! Every remote endpoint answers with a [`ResultEnvelope`], so the client
//! decodes the envelope and hands it back as is. Callers decide whether a
//! failed envelope is an error in their context.

use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder, RequestBuilder, redirect};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::ServiceError;
use crate::response::ResultEnvelope;

/// RPC client configuration.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Base URL of the remote service
    pub base_url: Url,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Read timeout (default: 60s)
    pub read_timeout: Duration,
    /// Follow redirects (default: false)
    pub follow_redirects: bool,
    /// Log request and response bodies (default: true)
    pub full_logging: bool,
}

impl RpcConfig {
    /// Create a config for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidPath`] if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, RpcError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            follow_redirects: false,
            full_logging: true,
        })
    }

    /// Set connect and read timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// Enable or disable body logging.
    #[must_use]
    pub const fn with_full_logging(mut self, enabled: bool) -> Self {
        self.full_logging = enabled;
        self
    }
}

/// Errors returned by [`RpcClient`].
#[derive(Error, Debug)]
pub enum RpcError {
    /// Transport failure or timeout.
    #[error("RPC request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote service answered with a non-2xx status.
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// Response status code
        status: u16,
        /// Response body
        body: String,
    },

    /// The body is not a result envelope of the expected type.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The base URL or request path is not valid.
    #[error("Invalid URL: {0}")]
    InvalidPath(#[from] url::ParseError),
}

impl From<RpcError> for ServiceError {
    fn from(err: RpcError) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

/// Client bound to one remote service.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    base_url: Url,
    full_logging: bool,
}

impl RpcClient {
    /// Build a client from its config.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let policy = if config.follow_redirects {
            redirect::Policy::default()
        } else {
            redirect::Policy::none()
        };
        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .redirect(policy)
            .use_rustls_tls()
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            full_logging: config.full_logging,
        })
    }

    /// GET `path` with `query` encoded as the query string.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] on transport failure, a non-2xx status or an undecodable body.
    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<ResultEnvelope<T>, RpcError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        self.call("GET", &url, None, self.client.get(url.clone()).query(query))
            .await
    }

    /// POST `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] on encoding or transport failure, a non-2xx status or an undecodable body.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<ResultEnvelope<T>, RpcError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let payload = serde_json::to_string(body)?;
        let request = self
            .client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.clone());
        self.call("POST", &url, Some(&payload), request).await
    }

    /// POST `form` as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] on transport failure, a non-2xx status or an undecodable body.
    pub async fn post_form<T, F>(&self, path: &str, form: &F) -> Result<ResultEnvelope<T>, RpcError>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        self.call("POST", &url, None, self.client.post(url.clone()).form(form))
            .await
    }

    fn url(&self, path: &str) -> Result<Url, RpcError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn call<T>(
        &self,
        method: &str,
        url: &Url,
        request_body: Option<&str>,
        request: RequestBuilder,
    ) -> Result<ResultEnvelope<T>, RpcError>
    where
        T: DeserializeOwned,
    {
        let started = Instant::now();
        if self.full_logging {
            debug!(method, %url, body = request_body.unwrap_or(""), "RPC request");
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if self.full_logging {
            debug!(method, %url, status = status.as_u16(), elapsed_ms, body = %body, "RPC response");
        } else {
            debug!(method, %url, status = status.as_u16(), elapsed_ms, "RPC response");
        }

        if !status.is_success() {
            return Err(RpcError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RpcConfig::new("http://service-user:8080").unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert!(!config.follow_redirects);
        assert!(config.full_logging);
        assert_eq!(config.base_url.as_str(), "http://service-user:8080/");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(RpcConfig::new("not a url"), Err(RpcError::InvalidPath(_))));
    }

    #[test]
    fn test_url_joins_under_base_path() {
        let config = RpcConfig::new("http://gateway/user-api").unwrap();
        let client = RpcClient::new(&config).unwrap();
        assert_eq!(
            client.url("/users/7").unwrap().as_str(),
            "http://gateway/user-api/users/7"
        );
    }

    #[test]
    fn test_error_is_internal() {
        let err = RpcError::UnexpectedStatus {
            status: 503,
            body: String::new(),
        };
        assert!(matches!(ServiceError::from(err), ServiceError::Internal(_)));
    }
}
