//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use verimark_core::{AlgodConfig, HttpAssetStoreConfig, MatchPolicy, Result};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 50)
    pub body_limit_mb: usize,
    /// Maximum file size per upload in MB (default: 25)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 60, the full variant sweep can be slow)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Matching policy (threshold, zoom factors, byte check)
    pub policy: MatchPolicy,
    /// Offline registry file; when set the Algorand node is not contacted
    pub registry_file: Option<PathBuf>,
    /// Algorand node used as the registry
    pub algod: AlgodConfig,
    /// Object store for original uploads (disabled when unset)
    pub asset_store: Option<HttpAssetStoreConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 50,
            max_file_size_mb: 25,
            timeout_secs: 60,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            policy: MatchPolicy::default(),
            registry_file: None,
            algod: AlgodConfig::default(),
            asset_store: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails on an invalid matching policy or registry setting; the server
    /// must not start with a policy it cannot honour.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse().ok())
        }

        let port = parsed(&lookup, "PORT").unwrap_or(8000);

        let host = lookup("HOST")
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or([127, 0, 0, 1]);

        let allowed_origins = lookup("ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = lookup("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let registry_file = lookup("REGISTRY_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let asset_store = lookup("ASSET_STORE_URL")
            .filter(|u| !u.trim().is_empty())
            .map(|url| {
                let mut config = HttpAssetStoreConfig::new(url.trim());
                config.token = lookup("ASSET_STORE_TOKEN").filter(|t| !t.is_empty());
                config
            });

        Ok(Self {
            port,
            host,
            allowed_origins,
            body_limit_mb: parsed(&lookup, "BODY_LIMIT_MB").unwrap_or(50),
            max_file_size_mb: parsed(&lookup, "MAX_FILE_SIZE_MB").unwrap_or(25),
            timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS").unwrap_or(60),
            rate_limit_enabled,
            rate_limit_per_sec: parsed(&lookup, "RATE_LIMIT_PER_SEC").unwrap_or(10),
            rate_limit_burst: parsed(&lookup, "RATE_LIMIT_BURST").unwrap_or(20),
            policy: MatchPolicy::from_lookup(&lookup)?,
            registry_file,
            algod: AlgodConfig::from_lookup(&lookup)?,
            asset_store,
        })
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Maximum upload size in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}
