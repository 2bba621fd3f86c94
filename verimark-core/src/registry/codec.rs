//! Decoding of raw registry records.
//!
//! Keys are UTF-8 strings of the form `<prefix><16 hex digits>`; values are
//! 32-byte Ed25519 public keys, rendered as Algorand account addresses:
//! `base32(pk || sha512_256(pk)[28..32])`, uppercase, without padding.

use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha512_256};

use super::{OwnerId, RawRecord, RegistryEntry, RegistrySnapshot};
use crate::error::{Result, VerimarkError};
use crate::fingerprint::PerceptualHash;

/// Storage field name under which hashes are kept.
pub const DEFAULT_KEY_PREFIX: &str = "registered_hashes";

/// Length of a stored public key.
pub const PUBLIC_KEY_LEN: usize = 32;

const CHECKSUM_LEN: usize = 4;

/// Render a public key as an account address.
pub fn encode_address(public_key: &[u8; PUBLIC_KEY_LEN]) -> String {
    let digest = Sha512_256::digest(public_key);
    let mut buf = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
    buf.extend_from_slice(public_key);
    buf.extend_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    BASE32_NOPAD.encode(&buf)
}

/// Parse an account address back into its public key, verifying the checksum.
pub fn decode_address(address: &str) -> Result<[u8; PUBLIC_KEY_LEN]> {
    let bytes = BASE32_NOPAD
        .decode(address.trim().to_uppercase().as_bytes())
        .map_err(|e| VerimarkError::InvalidRegistryEntry(format!("invalid address: {e}")))?;
    if bytes.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
        return Err(VerimarkError::InvalidRegistryEntry(format!(
            "address decodes to {} bytes",
            bytes.len()
        )));
    }

    let (key, checksum) = bytes.split_at(PUBLIC_KEY_LEN);
    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    public_key.copy_from_slice(key);

    let digest = Sha512_256::digest(public_key);
    if checksum != &digest[digest.len() - CHECKSUM_LEN..] {
        return Err(VerimarkError::InvalidRegistryEntry(
            "address checksum mismatch".into(),
        ));
    }
    Ok(public_key)
}

/// Build the storage key for a hash.
pub fn encode_key(hash: PerceptualHash, prefix: &str) -> Vec<u8> {
    format!("{prefix}{hash}").into_bytes()
}

/// Strip the prefix (when present) and parse the remaining hash.
pub fn decode_key(key: &[u8], prefix: &str) -> Result<PerceptualHash> {
    let key = std::str::from_utf8(key)
        .map_err(|_| VerimarkError::InvalidRegistryEntry("key is not UTF-8".into()))?;
    let hex = key.strip_prefix(prefix).unwrap_or(key);
    PerceptualHash::from_hex(hex)
        .map_err(|e| VerimarkError::InvalidRegistryEntry(format!("key {key:?}: {e}")))
}

/// Decode one record.
pub fn decode_entry(record: &RawRecord, prefix: &str) -> Result<RegistryEntry> {
    let hash = decode_key(&record.key, prefix)?;
    let public_key: &[u8; PUBLIC_KEY_LEN] = record.value.as_slice().try_into().map_err(|_| {
        VerimarkError::InvalidRegistryEntry(format!(
            "value for {hash} is {} bytes, expected {PUBLIC_KEY_LEN}",
            record.value.len()
        ))
    })?;
    Ok(RegistryEntry {
        hash,
        owner: OwnerId::new(encode_address(public_key)),
    })
}

/// Decode a batch of records, dropping malformed ones.
pub fn decode_entries(records: &[RawRecord], prefix: &str) -> RegistrySnapshot {
    let mut snapshot = RegistrySnapshot::new();
    for record in records {
        match decode_entry(record, prefix) {
            Ok(entry) => snapshot.insert(entry.hash, entry.owner),
            Err(e) => tracing::warn!(error = %e, "Skipping malformed registry entry"),
        }
    }
    tracing::debug!(
        decoded = snapshot.len(),
        raw = records.len(),
        "Decoded registry records"
    );
    snapshot
}
