//! HTTP client with retry and backoff shared by the network adapters.
//!
//! Used by the Algorand registry reader and the HTTP asset store.

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, VerimarkError};

/// Configuration for an adapter's HTTP client.
#[derive(Clone)]
pub struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
    /// Initial retry interval.
    pub initial_interval: Duration,
    /// Maximum retry interval.
    pub max_interval: Duration,
    /// Header sent with every request, e.g. an API token.
    pub auth_header: Option<(&'static str, String)>,
}

impl std::fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("initial_interval", &self.initial_interval)
            .field("max_interval", &self.max_interval)
            .field(
                "auth_header",
                &self.auth_header.as_ref().map(|(name, _)| (name, "[REDACTED]")),
            )
            .finish()
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(2),
            auth_header: None,
        }
    }
}

/// HTTP client with retry and backoff.
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    service: &'static str,
}

impl HttpClient {
    /// Create a new HTTP client for `service` (used in error messages).
    pub fn new(service: &'static str, config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some((name, value)) = &config.auth_header {
            let name = HeaderName::from_static(*name);
            let mut value = HeaderValue::from_str(value).map_err(|_| {
                VerimarkError::Configuration(format!("{service} token contains invalid characters"))
            })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                VerimarkError::Configuration(format!("Failed to create {service} HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            service,
        })
    }

    /// GET a JSON document. A 404 is an error.
    pub async fn get_json<R: DeserializeOwned>(&self, url: &str) -> Result<R> {
        let response = self
            .send(|| self.client.get(url))
            .await?
            .ok_or_else(|| {
                VerimarkError::ExternalUnavailable(format!("{} returned 404 for {url}", self.service))
            })?;

        response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse JSON response");
            VerimarkError::ExternalUnavailable(format!(
                "Failed to parse {} response: {e}",
                self.service
            ))
        })
    }

    /// GET raw bytes; `None` when the resource does not exist.
    pub async fn get_bytes(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let Some(response) = self.send(|| self.client.get(url)).await? else {
            return Ok(None);
        };
        let bytes = response.bytes().await.map_err(|e| {
            VerimarkError::ExternalUnavailable(format!("{} body read failed: {e}", self.service))
        })?;
        Ok(Some(bytes.to_vec()))
    }

    /// PUT raw bytes.
    pub async fn put_bytes(&self, url: &str, body: &[u8], content_type: &str) -> Result<()> {
        self.send(|| {
            self.client
                .put(url)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(body.to_vec())
        })
        .await?
        .ok_or_else(|| {
            VerimarkError::ExternalUnavailable(format!("{} returned 404 for {url}", self.service))
        })?;
        Ok(())
    }

    /// Send with retry. `Ok(None)` means the server answered 404.
    async fn send<F>(&self, build: F) -> Result<Option<Response>>
    where
        F: Fn() -> RequestBuilder,
    {
        retry_notify(
            self.build_backoff(),
            || {
                let request = build();
                async move { self.send_once(request).await }
            },
            |err: VerimarkError, duration: Duration| {
                warn!(
                    service = self.service,
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    async fn send_once(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<Option<Response>, backoff::Error<VerimarkError>> {
        let start = Instant::now();
        let service = self.service;

        let response = request.send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if is_transient_error(&e) {
                warn!(error = %e, latency_ms, "Transient error, will retry");
                backoff::Error::transient(VerimarkError::ExternalUnavailable(format!(
                    "Transient {service} error (will retry): {e}"
                )))
            } else {
                warn!(error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(VerimarkError::ExternalUnavailable(format!(
                    "{service} request failed: {e}"
                )))
            }
        })?;

        let status = response.status();
        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(status = %status, latency_ms, "Received HTTP response");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let err =
                VerimarkError::ExternalUnavailable(format!("{service} returned status: {status}"));
            return if is_transient_status(status) {
                warn!(status = %status, latency_ms, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(status = %status, latency_ms, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        Ok(Some(response))
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_interval,
            max_interval: self.config.max_interval,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }
}

/// Join a base URL and a path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status_codes() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a/", "/v2/x"), "http://a/v2/x");
        assert_eq!(join_url("http://a", "v2/x"), "http://a/v2/x");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = HttpClientConfig {
            auth_header: Some(("x-algo-api-token", "secret".into())),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_client_rejects_bad_token() {
        let config = HttpClientConfig {
            auth_header: Some(("authorization", "bad\ntoken".into())),
            ..Default::default()
        };
        assert!(matches!(
            HttpClient::new("test", config),
            Err(VerimarkError::Configuration(_))
        ));
    }
}
