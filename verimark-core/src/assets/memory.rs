//! In-process asset store for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{AssetFetcher, AssetStore};
use crate::error::Result;
use crate::fingerprint::PerceptualHash;

#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    assets: RwLock<HashMap<PerceptualHash, Vec<u8>>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AssetFetcher for InMemoryAssetStore {
    async fn fetch_original(&self, hash: PerceptualHash) -> Result<Option<Vec<u8>>> {
        let assets = self.assets.read().unwrap_or_else(|e| e.into_inner());
        Ok(assets.get(&hash).cloned())
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn store_original(&self, hash: PerceptualHash, bytes: &[u8]) -> Result<Option<String>> {
        let mut assets = self.assets.write().unwrap_or_else(|e| e.into_inner());
        assets.insert(hash, bytes.to_vec());
        Ok(None)
    }
}
