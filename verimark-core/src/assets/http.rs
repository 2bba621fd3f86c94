//! Asset store behind a plain HTTP object endpoint.
//!
//! Objects live at `{base_url}/{prefix}{hash}`; `GET` reads, `PUT` writes.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{AssetFetcher, AssetStore};
use crate::error::{Result, VerimarkError};
use crate::fingerprint::PerceptualHash;
use crate::http_client::{join_url, HttpClient, HttpClientConfig};

/// Object name prefix used by the reference deployment.
pub const DEFAULT_ASSET_PREFIX: &str = "artwork_";

#[derive(Clone)]
pub struct HttpAssetStoreConfig {
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>`.
    pub token: Option<String>,
    pub prefix: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl std::fmt::Debug for HttpAssetStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAssetStoreConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("prefix", &self.prefix)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl HttpAssetStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            prefix: DEFAULT_ASSET_PREFIX.to_string(),
            timeout: Duration::from_secs(15),
            max_retries: 2,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Returns `None` when `ASSET_STORE_URL` is unset (asset storage disabled).
    /// Optional: `ASSET_STORE_TOKEN`
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("ASSET_STORE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())?;
        let mut config = Self::new(base_url.trim());
        config.token = std::env::var("ASSET_STORE_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());
        Some(config)
    }
}

pub struct HttpAssetStore {
    http: HttpClient,
    config: HttpAssetStoreConfig,
}

impl HttpAssetStore {
    pub fn new(config: HttpAssetStoreConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(VerimarkError::Configuration(
                "asset store base URL is empty".into(),
            ));
        }
        let http = HttpClient::new(
            "asset store",
            HttpClientConfig {
                timeout: config.timeout,
                max_retries: config.max_retries,
                auth_header: config
                    .token
                    .as_ref()
                    .map(|t| ("authorization", format!("Bearer {t}"))),
                ..Default::default()
            },
        )?;
        Ok(Self { http, config })
    }

    /// Public URL of the object for `hash`.
    pub fn object_url(&self, hash: PerceptualHash) -> String {
        join_url(
            &self.config.base_url,
            &format!("{}{}", self.config.prefix, hash),
        )
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetStore {
    #[instrument(skip(self), fields(hash = %hash))]
    async fn fetch_original(&self, hash: PerceptualHash) -> Result<Option<Vec<u8>>> {
        let bytes = self.http.get_bytes(&self.object_url(hash)).await?;
        debug!(found = bytes.is_some(), "Fetched original asset");
        Ok(bytes)
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    #[instrument(skip(self, bytes), fields(hash = %hash, size = bytes.len()))]
    async fn store_original(&self, hash: PerceptualHash, bytes: &[u8]) -> Result<Option<String>> {
        let url = self.object_url(hash);
        let content_type = image::guess_format(bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        self.http.put_bytes(&url, bytes, content_type).await?;
        debug!(url = %url, "Stored original asset");
        Ok(Some(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url() {
        let store =
            HttpAssetStore::new(HttpAssetStoreConfig::new("https://assets.example.com/art/"))
                .unwrap();
        assert_eq!(
            store.object_url(PerceptualHash::from_u64(0xff)),
            "https://assets.example.com/art/artwork_00000000000000ff"
        );
    }

    #[test]
    fn test_rejects_empty_base_url() {
        assert!(HttpAssetStore::new(HttpAssetStoreConfig::new("")).is_err());
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let mut config = HttpAssetStoreConfig::new("https://assets.example.com");
        config.token = Some("hunter2".into());
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn test_unreachable_store_errors() {
        let mut config = HttpAssetStoreConfig::new("http://127.0.0.1:9");
        config.timeout = Duration::from_millis(200);
        config.max_retries = 1;
        let store = HttpAssetStore::new(config).unwrap();
        let err = store
            .fetch_original(PerceptualHash::from_u64(1))
            .await
            .unwrap_err();
        assert!(matches!(err, VerimarkError::ExternalUnavailable(_)));
    }
}
