//! In-process registry for tests and offline use.

use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use super::codec::{self, DEFAULT_KEY_PREFIX};
use super::{OwnerId, RawRecord, RegistryEntry, RegistryProvider, RegistrySnapshot, RegistrySource};
use crate::error::{Result, VerimarkError};
use crate::fingerprint::PerceptualHash;

/// Registry held in memory.
///
/// Accepts raw records (decoded like any remote store) and typed entries,
/// whose owners need not be valid account addresses. Typed entries are
/// only visible through [`RegistryProvider::snapshot`].
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    raw: RwLock<Vec<RawRecord>>,
    typed: RwLock<Vec<RegistryEntry>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_raw(records: Vec<RawRecord>) -> Self {
        Self {
            raw: RwLock::new(records),
            typed: RwLock::default(),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        Self {
            raw: RwLock::default(),
            typed: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Offline registry file: a JSON array of `{"hash", "owner"}` objects.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let entries: Vec<RegistryEntry> = serde_json::from_slice(bytes).map_err(|e| {
            VerimarkError::InvalidRegistryEntry(format!(
                "expected a JSON array of {{\"hash\", \"owner\"}} objects: {e}"
            ))
        })?;
        debug!(entries = entries.len(), "Parsed offline registry");
        Ok(Self::from_entries(entries))
    }

    /// Record `hash` as owned by `owner`.
    pub fn register(&self, hash: PerceptualHash, owner: impl Into<OwnerId>) {
        let mut typed = self.typed.write().unwrap_or_else(|e| e.into_inner());
        typed.push(RegistryEntry::new(hash, owner));
    }

    /// Store a raw record under the default prefix.
    pub fn register_public_key(&self, hash: PerceptualHash, public_key: [u8; 32]) {
        let mut raw = self.raw.write().unwrap_or_else(|e| e.into_inner());
        raw.push(RawRecord::new(
            codec::encode_key(hash, DEFAULT_KEY_PREFIX),
            public_key.to_vec(),
        ));
    }
}

#[async_trait]
impl RegistryProvider for InMemoryRegistry {
    async fn fetch_raw(&self) -> Result<Vec<RawRecord>> {
        Ok(self.raw.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn source(&self) -> RegistrySource {
        RegistrySource::InMemory
    }

    async fn snapshot(&self) -> Result<RegistrySnapshot> {
        let raw = self.fetch_raw().await?;
        let mut snapshot = codec::decode_entries(&raw, self.key_prefix());
        let typed = self.typed.read().unwrap_or_else(|e| e.into_inner());
        for entry in typed.iter() {
            snapshot.insert(entry.hash, entry.owner.clone());
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = InMemoryRegistry::new();
        assert!(registry.snapshot().await.unwrap().is_empty());
        assert_eq!(registry.source(), RegistrySource::InMemory);
    }

    #[tokio::test]
    async fn test_raw_and_typed_entries_merge() {
        let registry = InMemoryRegistry::from_entries([RegistryEntry::new(
            PerceptualHash::from_u64(7),
            "alice",
        )]);
        registry.register_public_key(PerceptualHash::from_u64(8), [0u8; 32]);
        registry.register(PerceptualHash::from_u64(9), "bob");

        let snapshot = registry.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(
            snapshot.get(PerceptualHash::from_u64(8)).unwrap().as_str(),
            codec::encode_address(&[0u8; 32])
        );
        assert_eq!(
            snapshot.get(PerceptualHash::from_u64(9)).unwrap().as_str(),
            "bob"
        );
        assert_eq!(registry.fetch_raw().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_from_json() {
        let registry = InMemoryRegistry::from_json(
            br#"[{"hash": "00ff00ff00ff00ff", "owner": "alice"},
                 {"hash": "0000000000000001", "owner": "bob"}]"#,
        )
        .unwrap();
        let snapshot = registry.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot
                .get(PerceptualHash::from_u64(0x00ff_00ff_00ff_00ff))
                .map(OwnerId::as_str),
            Some("alice")
        );

        let bad_inputs: [&[u8]; 3] = [
            b"not json",
            br#"[{"hash": "xyz", "owner": "a"}]"#,
            br#"{}"#,
        ];
        for bad in bad_inputs {
            assert!(matches!(
                InMemoryRegistry::from_json(bad),
                Err(VerimarkError::InvalidRegistryEntry(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_snapshot_reflects_later_writes() {
        let registry = InMemoryRegistry::new();
        let before = registry.snapshot().await.unwrap();
        registry.register(PerceptualHash::from_u64(1), "alice");
        let after = registry.snapshot().await.unwrap();
        assert!(before.is_empty());
        assert_eq!(after.len(), 1);
    }
}
