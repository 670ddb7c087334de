//! Hashing utilities and the 32-byte hash type used across the ledger
//!
//! Hashes are stored in internal byte order. Every hash that crosses the
//! command boundary is rendered in wire format: the bytes reversed, then
//! hex-encoded. [`Hash256::from_wire`] undoes exactly that.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Size of a ledger hash in bytes
pub const HASH_SIZE: usize = 32;

/// Errors raised while parsing a hash
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HashError {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Invalid hash length: {0} bytes (expected {HASH_SIZE})")]
    InvalidLength(usize),
}

/// A 32-byte hash in internal byte order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Hash256(pub [u8; HASH_SIZE]);

impl Hash256 {
    /// The all-zero hash
    pub const ZERO: Hash256 = Hash256([0u8; HASH_SIZE]);

    /// Build a hash from exactly 32 bytes in internal order
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashError> {
        let array: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| HashError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Raw bytes in internal order
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Render in wire format (byte-reversed hex)
    pub fn to_wire(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }

    /// Parse a wire-format string back into internal order
    pub fn from_wire(s: &str) -> Result<Self, HashError> {
        let mut bytes = hex::decode(s)?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
pub fn double_sha256(data: &[u8]) -> Hash256 {
    Hash256(sha256(&sha256(data)))
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
