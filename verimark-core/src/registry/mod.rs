//! Registry of previously fingerprinted works.
//!
//! The registry is owned by an external, key-unique store. This crate only
//! reads it: a [`RegistryProvider`] hands out raw `(key, value)` records and
//! [`codec`] turns them into a [`RegistrySnapshot`] of `hash → owner`.
//!
//! Snapshots are fetched fresh for every request and never cached.
//!
//! ## Providers
//!
//! - [`InMemoryRegistry`] - in-process records (tests, offline mode)
//! - `AlgodRegistry` - box storage of an Algorand application (feature `network`)

pub mod codec;
mod memory;

#[cfg(feature = "network")]
mod algod;

pub use codec::{decode_entries, encode_address, DEFAULT_KEY_PREFIX};
pub use memory::InMemoryRegistry;

#[cfg(feature = "network")]
pub use algod::{AlgodConfig, AlgodRegistry, DEFAULT_ALGOD_URL, DEFAULT_APP_ID};

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fingerprint::PerceptualHash;

/// Human-readable account identifier of the party that registered a hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One `hash → owner` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub hash: PerceptualHash,
    pub owner: OwnerId,
}

impl RegistryEntry {
    pub fn new(hash: PerceptualHash, owner: impl Into<OwnerId>) -> Self {
        Self {
            hash,
            owner: owner.into(),
        }
    }
}

/// Undecoded record as stored externally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl RawRecord {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered, key-unique view of the registry for one request.
///
/// Iteration order is insertion order. Inserting an existing hash replaces
/// its owner but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    entries: Vec<RegistryEntry>,
    #[serde(skip)]
    index: HashMap<PerceptualHash, usize>,
}

impl RegistrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: PerceptualHash, owner: OwnerId) {
        match self.index.get(&hash) {
            Some(&position) => self.entries[position].owner = owner,
            None => {
                self.index.insert(hash, self.entries.len());
                self.entries.push(RegistryEntry { hash, owner });
            }
        }
    }

    pub fn get(&self, hash: PerceptualHash) -> Option<&OwnerId> {
        self.index.get(&hash).map(|&position| &self.entries[position].owner)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegistryEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<RegistryEntry> {
        self.entries
    }
}

impl FromIterator<RegistryEntry> for RegistrySnapshot {
    fn from_iter<I: IntoIterator<Item = RegistryEntry>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for entry in iter {
            snapshot.insert(entry.hash, entry.owner);
        }
        snapshot
    }
}

impl<'a> IntoIterator for &'a RegistrySnapshot {
    type Item = &'a RegistryEntry;
    type IntoIter = std::slice::Iter<'a, RegistryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Identifies where a registry lives, for reports and status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistrySource {
    /// In-process records
    InMemory,
    /// Box storage of an Algorand application
    Algorand { network: String, app_id: u64 },
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => write!(f, "in-memory"),
            Self::Algorand { network, app_id } => write!(f, "Algorand {network} (app {app_id})"),
        }
    }
}

/// Read access to the external registry.
///
/// Implementations must be thread-safe (`Send + Sync`) and must not cache
/// records between calls.
#[async_trait]
pub trait RegistryProvider: Send + Sync {
    /// Fetch every raw record currently stored.
    async fn fetch_raw(&self) -> Result<Vec<RawRecord>>;

    /// Storage prefix prepended to hash keys.
    fn key_prefix(&self) -> &str {
        DEFAULT_KEY_PREFIX
    }

    fn source(&self) -> RegistrySource;

    /// Fetch and decode a fresh snapshot. Malformed records are dropped.
    async fn snapshot(&self) -> Result<RegistrySnapshot> {
        let raw = self.fetch_raw().await?;
        Ok(decode_entries(&raw, self.key_prefix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(v: u64) -> PerceptualHash {
        PerceptualHash::from_u64(v)
    }

    #[test]
    fn test_snapshot_keeps_insertion_order() {
        let snapshot: RegistrySnapshot = [
            RegistryEntry::new(h(3), "carol"),
            RegistryEntry::new(h(1), "alice"),
            RegistryEntry::new(h(2), "bob"),
        ]
        .into_iter()
        .collect();

        let hashes: Vec<u64> = snapshot.iter().map(|e| e.hash.as_u64()).collect();
        assert_eq!(hashes, vec![3, 1, 2]);
    }

    #[test]
    fn test_duplicate_key_replaces_owner_in_place() {
        let mut snapshot = RegistrySnapshot::new();
        snapshot.insert(h(1), OwnerId::from("alice"));
        snapshot.insert(h(2), OwnerId::from("bob"));
        snapshot.insert(h(1), OwnerId::from("mallory"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.entries()[0].owner.as_str(), "mallory");
        assert_eq!(snapshot.get(h(2)).map(OwnerId::as_str), Some("bob"));
        assert!(snapshot.get(h(9)).is_none());
    }

    #[test]
    fn test_large_snapshot_with_duplicates() {
        let snapshot: RegistrySnapshot = (0..20_000u64)
            .map(|i| RegistryEntry::new(h(i % 10_000), OwnerId::new(format!("owner-{i}"))))
            .collect();

        assert_eq!(snapshot.len(), 10_000);
        assert_eq!(snapshot.entries()[0].hash, h(0));
        assert_eq!(snapshot.entries()[9_999].hash, h(9_999));
        assert_eq!(snapshot.get(h(42)).map(OwnerId::as_str), Some("owner-10042"));
    }

    #[test]
    fn test_entry_serializes_hash_as_hex() {
        let json = serde_json::to_value(RegistryEntry::new(h(0xabc), "alice")).unwrap();
        assert_eq!(json["hash"], "0000000000000abc");
        assert_eq!(json["owner"], "alice");
    }

    #[test]
    fn test_source_display() {
        let source = RegistrySource::Algorand {
            network: "testnet".into(),
            app_id: 755787017,
        };
        assert_eq!(source.to_string(), "Algorand testnet (app 755787017)");
    }
}
