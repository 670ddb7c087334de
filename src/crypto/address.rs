//! Program hashes and addresses
//!
//! A program hash identifies a spending condition: one prefix byte naming
//! the kind of program, followed by RIPEMD160(SHA256(code)). Addresses are
//! the Base58 encoding of the program hash plus a 4-byte double-SHA256
//! checksum.

use ripemd::{Digest, Ripemd160};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::hash::{double_sha256, sha256};

/// Size of a program hash in bytes
pub const PROGRAM_HASH_SIZE: usize = 21;

/// Size of a decoded address (program hash + checksum)
pub const ADDRESS_SIZE: usize = PROGRAM_HASH_SIZE + 4;

/// Single-signature program
pub const PREFIX_STANDARD: u8 = 0x21;
/// Multi-signature program
pub const PREFIX_MULTISIG: u8 = 0x12;
/// Cross-chain program
pub const PREFIX_CROSS_CHAIN: u8 = 0x4b;
/// Producer deposit program
pub const PREFIX_DEPOSIT: u8 = 0x1f;

/// Compressed public key length
pub const PUBLIC_KEY_SIZE: usize = 33;

const OP_CHECKSIG: u8 = 0xac;

/// Errors that can occur while handling addresses and keys
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58 encoding")]
    InvalidBase58,
    #[error("Invalid address length: {0} bytes (expected {ADDRESS_SIZE})")]
    InvalidLength(usize),
    #[error("Address checksum mismatch")]
    ChecksumMismatch,
    #[error("Unknown program hash prefix: {0:#04x}")]
    UnknownPrefix(u8),
    #[error("Invalid public key")]
    InvalidPublicKey,
}

/// Hash of a spending condition (an account in internal form)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ProgramHash(pub [u8; PROGRAM_HASH_SIZE]);

impl ProgramHash {
    /// Derive a program hash from redeem code
    pub fn from_code(prefix: u8, code: &[u8]) -> Self {
        let mut ripemd = Ripemd160::new();
        ripemd.update(sha256(code));
        let digest = ripemd.finalize();

        let mut bytes = [0u8; PROGRAM_HASH_SIZE];
        bytes[0] = prefix;
        bytes[1..].copy_from_slice(&digest);
        Self(bytes)
    }

    /// Standard (single-signature) program hash of a compressed public key
    pub fn standard(public_key: &[u8]) -> Result<Self, AddressError> {
        Ok(Self::from_code(PREFIX_STANDARD, &standard_code(public_key)?))
    }

    /// Deposit program hash of a producer's owner public key
    pub fn deposit(public_key: &[u8]) -> Result<Self, AddressError> {
        Ok(Self::from_code(PREFIX_DEPOSIT, &standard_code(public_key)?))
    }

    pub fn prefix(&self) -> u8 {
        self.0[0]
    }

    pub fn as_bytes(&self) -> &[u8; PROGRAM_HASH_SIZE] {
        &self.0
    }

    /// Encode as a Base58Check address
    pub fn to_address(&self) -> String {
        let checksum = double_sha256(&self.0);
        let mut data = Vec::with_capacity(ADDRESS_SIZE);
        data.extend_from_slice(&self.0);
        data.extend_from_slice(&checksum.0[..4]);
        bs58::encode(data).into_string()
    }

    /// Decode and verify a Base58Check address
    pub fn from_address(address: &str) -> Result<Self, AddressError> {
        let data = bs58::decode(address)
            .into_vec()
            .map_err(|_| AddressError::InvalidBase58)?;
        if data.len() != ADDRESS_SIZE {
            return Err(AddressError::InvalidLength(data.len()));
        }

        let (body, checksum) = data.split_at(PROGRAM_HASH_SIZE);
        if double_sha256(body).0[..4] != *checksum {
            return Err(AddressError::ChecksumMismatch);
        }

        match body[0] {
            PREFIX_STANDARD | PREFIX_MULTISIG | PREFIX_CROSS_CHAIN | PREFIX_DEPOSIT => {}
            other => return Err(AddressError::UnknownPrefix(other)),
        }

        let mut bytes = [0u8; PROGRAM_HASH_SIZE];
        bytes.copy_from_slice(body);
        Ok(Self(bytes))
    }
}

impl fmt::Display for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

/// Check that bytes are a compressed secp256k1 point
pub fn validate_public_key(public_key: &[u8]) -> Result<(), AddressError> {
    if public_key.len() != PUBLIC_KEY_SIZE {
        return Err(AddressError::InvalidPublicKey);
    }
    PublicKey::from_slice(public_key)
        .map(|_| ())
        .map_err(|_| AddressError::InvalidPublicKey)
}

/// `<push 33> <key> CHECKSIG`
fn standard_code(public_key: &[u8]) -> Result<Vec<u8>, AddressError> {
    validate_public_key(public_key)?;
    let mut code = Vec::with_capacity(PUBLIC_KEY_SIZE + 2);
    code.push(PUBLIC_KEY_SIZE as u8);
    code.extend_from_slice(public_key);
    code.push(OP_CHECKSIG);
    Ok(code)
}
