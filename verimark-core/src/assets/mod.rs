//! Storage of original artwork bytes, keyed by perceptual hash.
//!
//! Registration uploads the submitted file; verification may fetch it back
//! to tell an exact reproduction apart from a perceptually identical
//! derivative. Neither path mutates registry state.

mod memory;

#[cfg(feature = "network")]
mod http;

pub use memory::InMemoryAssetStore;

#[cfg(feature = "network")]
pub use http::{HttpAssetStore, HttpAssetStoreConfig, DEFAULT_ASSET_PREFIX};

use async_trait::async_trait;

use crate::error::Result;
use crate::fingerprint::PerceptualHash;

/// Read access to stored originals.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Bytes of the original registered under `hash`, if any.
    async fn fetch_original(&self, hash: PerceptualHash) -> Result<Option<Vec<u8>>>;
}

/// Write access to stored originals.
#[async_trait]
pub trait AssetStore: AssetFetcher {
    /// Store `bytes` under `hash`, returning a public URL when known.
    async fn store_original(&self, hash: PerceptualHash, bytes: &[u8]) -> Result<Option<String>>;
}
