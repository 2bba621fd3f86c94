//! Registry stored in the box storage of an Algorand application.
//!
//! Reads go through the node's REST API:
//!
//! - `GET /v2/applications/{app}/boxes` lists box names (base64)
//! - `GET /v2/applications/{app}/box?name=b64:{name}` returns one value (base64)

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::codec::DEFAULT_KEY_PREFIX;
use super::{RawRecord, RegistryProvider, RegistrySource};
use crate::error::{Result, VerimarkError};
use crate::http_client::{join_url, HttpClient, HttpClientConfig};

/// Public TestNet node used by the reference deployment.
pub const DEFAULT_ALGOD_URL: &str = "https://testnet-api.algonode.cloud";

/// Registry application of the reference deployment.
pub const DEFAULT_APP_ID: u64 = 755787017;

const TOKEN_HEADER: &str = "x-algo-api-token";

#[derive(Debug, Deserialize)]
struct BoxesResponse {
    #[serde(default)]
    boxes: Vec<BoxDescriptor>,
}

#[derive(Debug, Deserialize)]
struct BoxDescriptor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BoxValueResponse {
    value: String,
}

/// Configuration for [`AlgodRegistry`].
#[derive(Clone)]
pub struct AlgodConfig {
    /// Node REST endpoint.
    pub url: String,
    /// Optional `X-Algo-API-Token`.
    pub token: Option<String>,
    /// Registry application id.
    pub app_id: u64,
    /// Prefix of the box names holding hashes.
    pub key_prefix: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
}

impl std::fmt::Debug for AlgodConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgodConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("app_id", &self.app_id)
            .field("key_prefix", &self.key_prefix)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for AlgodConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ALGOD_URL.to_string(),
            token: None,
            app_id: DEFAULT_APP_ID,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

impl AlgodConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional: `ALGOD_URL`, `ALGOD_TOKEN`, `REGISTRY_APP_ID`, `REGISTRY_BOX_PREFIX`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ALGOD_URL").filter(|s| !s.trim().is_empty()) {
            config.url = url.trim().to_string();
        }
        config.token = lookup("ALGOD_TOKEN").filter(|s| !s.is_empty());

        if let Some(v) = lookup("REGISTRY_APP_ID") {
            config.app_id = v.trim().parse().map_err(|_| {
                VerimarkError::Configuration(format!("REGISTRY_APP_ID is not a valid id: {v}"))
            })?;
        }
        if let Some(prefix) = lookup("REGISTRY_BOX_PREFIX") {
            config.key_prefix = prefix;
        }

        Ok(config)
    }

    /// Network name guessed from the node URL.
    pub fn network(&self) -> &'static str {
        let url = self.url.to_ascii_lowercase();
        if url.contains("testnet") {
            "testnet"
        } else if url.contains("mainnet") {
            "mainnet"
        } else if url.contains("betanet") {
            "betanet"
        } else {
            "custom"
        }
    }
}

/// Reader for the registry application's boxes.
pub struct AlgodRegistry {
    http: HttpClient,
    config: AlgodConfig,
}

impl AlgodRegistry {
    /// Create a reader against the public TestNet deployment.
    pub fn new() -> Result<Self> {
        Self::with_config(AlgodConfig::default())
    }

    pub fn with_config(config: AlgodConfig) -> Result<Self> {
        let http = HttpClient::new(
            "algod",
            HttpClientConfig {
                timeout: config.timeout,
                max_retries: config.max_retries,
                auth_header: config.token.clone().map(|t| (TOKEN_HEADER, t)),
                ..Default::default()
            },
        )?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AlgodConfig {
        &self.config
    }

    fn app_url(&self, path: &str) -> String {
        join_url(
            &self.config.url,
            &format!("v2/applications/{}/{path}", self.config.app_id),
        )
    }

    #[instrument(skip(self), fields(app_id = self.config.app_id))]
    async fn list_box_names(&self) -> Result<Vec<Vec<u8>>> {
        let listing: BoxesResponse = self.http.get_json(&self.app_url("boxes")).await?;

        let mut names = Vec::with_capacity(listing.boxes.len());
        for descriptor in listing.boxes {
            match STANDARD.decode(&descriptor.name) {
                Ok(name) => names.push(name),
                Err(e) => warn!(name = %descriptor.name, error = %e, "Skipping undecodable box name"),
            }
        }
        debug!(count = names.len(), "Listed registry boxes");
        Ok(names)
    }

    fn box_url(&self, name: &[u8]) -> Result<String> {
        let name = format!("b64:{}", STANDARD.encode(name));
        reqwest::Url::parse_with_params(&self.app_url("box"), [("name", name)])
            .map(|url| url.to_string())
            .map_err(|e| {
                VerimarkError::Configuration(format!("invalid node URL {}: {e}", self.config.url))
            })
    }

    async fn read_box(&self, name: &[u8]) -> Result<Vec<u8>> {
        let response: BoxValueResponse = self.http.get_json(&self.box_url(name)?).await?;
        STANDARD
            .decode(&response.value)
            .map_err(|e| VerimarkError::InvalidRegistryEntry(format!("box value is not base64: {e}")))
    }
}

#[async_trait]
impl RegistryProvider for AlgodRegistry {
    #[instrument(skip(self), fields(app_id = self.config.app_id))]
    async fn fetch_raw(&self) -> Result<Vec<RawRecord>> {
        let names = self.list_box_names().await.map_err(|e| match e {
            VerimarkError::ExternalUnavailable(_) => e,
            other => VerimarkError::ExternalUnavailable(other.to_string()),
        })?;

        let mut records = Vec::with_capacity(names.len());
        for name in names {
            match self.read_box(&name).await {
                Ok(value) => records.push(RawRecord::new(name, value)),
                Err(e) => warn!(
                    name = %String::from_utf8_lossy(&name),
                    error = %e,
                    "Skipping unreadable registry box"
                ),
            }
        }

        info!(records = records.len(), "Fetched registry from algod");
        Ok(records)
    }

    fn key_prefix(&self) -> &str {
        &self.config.key_prefix
    }

    fn source(&self) -> RegistrySource {
        RegistrySource::Algorand {
            network: self.config.network().to_string(),
            app_id: self.config.app_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AlgodConfig::default();
        assert_eq!(config.url, DEFAULT_ALGOD_URL);
        assert_eq!(config.app_id, DEFAULT_APP_ID);
        assert_eq!(config.key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(config.network(), "testnet");
    }

    #[test]
    fn test_config_from_lookup() {
        let config = AlgodConfig::from_lookup(lookup(&[
            ("ALGOD_URL", "http://localhost:4001"),
            ("ALGOD_TOKEN", "aaaa"),
            ("REGISTRY_APP_ID", "42"),
            ("REGISTRY_BOX_PREFIX", "hashes_"),
        ]))
        .unwrap();
        assert_eq!(config.url, "http://localhost:4001");
        assert_eq!(config.token.as_deref(), Some("aaaa"));
        assert_eq!(config.app_id, 42);
        assert_eq!(config.key_prefix, "hashes_");
        assert_eq!(config.network(), "custom");
        assert!(!format!("{config:?}").contains("aaaa"));
    }

    #[test]
    fn test_config_rejects_bad_app_id() {
        let err = AlgodConfig::from_lookup(lookup(&[("REGISTRY_APP_ID", "abc")])).unwrap_err();
        assert!(matches!(err, VerimarkError::Configuration(_)));
    }

    #[test]
    fn test_app_urls() {
        let registry = AlgodRegistry::with_config(AlgodConfig {
            url: "http://localhost:4001/".into(),
            app_id: 7,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            registry.app_url("boxes"),
            "http://localhost:4001/v2/applications/7/boxes"
        );
        assert_eq!(
            registry.source(),
            RegistrySource::Algorand {
                network: "custom".into(),
                app_id: 7
            }
        );
    }

    #[test]
    fn test_box_url_escapes_base64_name() {
        let registry = AlgodRegistry::with_config(AlgodConfig {
            url: "http://localhost:4001".into(),
            app_id: 7,
            ..Default::default()
        })
        .unwrap();
        // 0xfb 0xff encodes as "+/8="
        assert_eq!(
            registry.box_url(&[0xfb, 0xff]).unwrap(),
            "http://localhost:4001/v2/applications/7/box?name=b64%3A%2B%2F8%3D"
        );
    }

    #[tokio::test]
    async fn test_unreachable_node_is_unavailable() {
        let registry = AlgodRegistry::with_config(AlgodConfig {
            url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(200),
            max_retries: 1,
            ..Default::default()
        })
        .unwrap();
        let err = registry.fetch_raw().await.unwrap_err();
        assert!(matches!(err, VerimarkError::ExternalUnavailable(_)));
    }

    #[tokio::test]
    #[ignore = "requires network access to the public TestNet node"]
    async fn test_live_testnet_snapshot() {
        let registry = AlgodRegistry::new().unwrap();
        let snapshot = registry.snapshot().await.unwrap();
        for entry in snapshot.iter() {
            assert_eq!(entry.owner.as_str().len(), 58);
        }
    }
}
