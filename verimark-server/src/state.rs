//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use verimark_core::{
    AlgodRegistry, AssetFetcher, AssetStore, HttpAssetStore, InMemoryRegistry, RegistryProvider,
    Result, Verifier, VerimarkError,
};

use crate::config::Config;
use crate::validation::DEFAULT_MAX_FILE_SIZE;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Hashing and matching service configured with the active policy
    pub verifier: Arc<Verifier>,
    /// Registry queried on every verification
    pub registry: Arc<dyn RegistryProvider>,
    /// Object store for originals (uploads on compute-hash)
    pub asset_store: Option<Arc<dyn AssetStore>>,
    /// Read side of `asset_store` (byte comparison on verify)
    pub asset_fetcher: Option<Arc<dyn AssetFetcher>>,
    /// Maximum upload size in bytes
    pub max_file_size: usize,
}

impl AppState {
    /// State with a registry and no asset store.
    pub fn new(verifier: Verifier, registry: Arc<dyn RegistryProvider>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            registry,
            asset_store: None,
            asset_fetcher: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Attach an asset store.
    pub fn with_asset_store<S: AssetStore + 'static>(mut self, store: Arc<S>) -> Self {
        self.asset_fetcher = Some(store.clone() as Arc<dyn AssetFetcher>);
        self.asset_store = Some(store as Arc<dyn AssetStore>);
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Build the production state from configuration.
    ///
    /// Uses the offline registry file when configured, the Algorand node
    /// otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        let verifier = Verifier::new(config.policy.clone())?;

        let registry: Arc<dyn RegistryProvider> = match &config.registry_file {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    VerimarkError::Configuration(format!(
                        "cannot read registry file {}: {e}",
                        path.display()
                    ))
                })?;
                let registry = InMemoryRegistry::from_json(&bytes).map_err(|e| {
                    VerimarkError::Configuration(format!("registry file {}: {e}", path.display()))
                })?;
                tracing::info!(path = %path.display(), "Loaded offline registry");
                Arc::new(registry)
            }
            None => Arc::new(AlgodRegistry::with_config(config.algod.clone())?),
        };

        let mut state = Self::new(verifier, registry).with_max_file_size(config.max_file_size());

        if let Some(asset_config) = &config.asset_store {
            state = state.with_asset_store(Arc::new(HttpAssetStore::new(asset_config.clone())?));
        }

        Ok(state)
    }
}
