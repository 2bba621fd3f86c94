//! The 64-bit perceptual hash value and its Hamming metric.
//!
//! Hashes are persisted by the external registry as 16 lowercase hex digits
//! and compared years later, so the textual form is part of the contract:
//! the most significant bit is the DC coefficient of the frequency block.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, VerimarkError};

/// Hash width in bits.
pub const HASH_BITS: u32 = 64;

/// Length of the canonical hex rendering.
pub const HASH_HEX_LEN: usize = 16;

/// A 64-bit perceptual hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PerceptualHash(u64);

impl PerceptualHash {
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Number of differing bits, in `0..=64`.
    pub const fn hamming_distance(self, other: Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Canonical 16-digit lowercase hex form.
    pub fn to_hex(self) -> String {
        hex::encode(self.0.to_be_bytes())
    }

    /// Parse exactly 16 hex digits (either case).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != HASH_HEX_LEN {
            return Err(VerimarkError::InvalidHash(format!(
                "expected {HASH_HEX_LEN} hex digits, got {}",
                hex_str.len()
            )));
        }
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| VerimarkError::InvalidHash(format!("Invalid hex string: {e}")))?;
        Ok(Self(u64::from_be_bytes(bytes)))
    }

    /// Bits in row-major coefficient order, most significant first.
    pub fn bits(self) -> [u8; HASH_BITS as usize] {
        let mut bits = [0u8; HASH_BITS as usize];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = ((self.0 >> (HASH_BITS as usize - 1 - i)) & 1) as u8;
        }
        bits
    }
}

/// Compute the Hamming distance between two hashes.
pub fn hamming_distance(a: PerceptualHash, b: PerceptualHash) -> u32 {
    a.hamming_distance(b)
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for PerceptualHash {
    type Err = VerimarkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for PerceptualHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PerceptualHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
