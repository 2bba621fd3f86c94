//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use verimark_core::{
    AlgodConfig, AlgodRegistry, HttpAssetStore, HttpAssetStoreConfig, InMemoryRegistry,
    MatchPolicy, RegistryProvider,
};

use crate::{AssetArgs, PolicyArgs, RegistryArgs};

/// Read an input file.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read file");
    Ok(bytes)
}

/// Load an offline registry: a JSON array of `{"hash", "owner"}` objects.
pub fn load_registry_file(path: &Path) -> Result<InMemoryRegistry> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read registry file: {}", path.display()))?;
    let registry = InMemoryRegistry::from_json(&bytes)
        .with_context(|| format!("Failed to parse registry file: {}", path.display()))?;
    debug!(path = %path.display(), "Loaded offline registry");
    Ok(registry)
}

/// Build the registry provider selected by the arguments.
pub fn build_registry(args: &RegistryArgs) -> Result<Box<dyn RegistryProvider>> {
    if let Some(path) = &args.registry_file {
        return Ok(Box::new(load_registry_file(path)?));
    }

    let config = AlgodConfig {
        url: args.algod_url.clone(),
        token: args.algod_token.clone().filter(|t| !t.is_empty()),
        app_id: args.app_id,
        key_prefix: args.box_prefix.clone(),
        ..Default::default()
    };
    Ok(Box::new(AlgodRegistry::with_config(config)?))
}

/// Build the matching policy from the arguments.
pub fn build_policy(args: &PolicyArgs) -> MatchPolicy {
    MatchPolicy {
        plagiarism_threshold: args.threshold,
        zoom_factors: args.zoom.clone(),
        mirror_zoom: args.zoom_mirror,
        byte_check: args.byte_check,
        ..Default::default()
    }
}

/// Build the asset store, if one is configured.
pub fn build_asset_store(args: &AssetArgs) -> Result<Option<HttpAssetStore>> {
    let Some(url) = args.asset_store_url.as_deref().filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    let mut config = HttpAssetStoreConfig::new(url);
    config.token = args.asset_store_token.clone().filter(|t| !t.is_empty());
    Ok(Some(HttpAssetStore::new(config)?))
}

/// First eight hex digits followed by an ellipsis.
pub fn short_hash(hex: &str) -> String {
    format!("{}...", &hex[..hex.len().min(8)])
}

/// Render a 64-bit bitmask as an 8×8 grid of `█` and `·`.
pub fn bit_grid(bits: &[u8]) -> Vec<String> {
    bits.chunks(8)
        .map(|row| {
            row.iter()
                .map(|&b| if b == 1 { "█" } else { "·" })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
