//! Cryptographic utilities for the sidechain
//!
//! This module provides:
//! - SHA-256 hashing and the wire hash format
//! - Program hashes and Base58Check addresses (secp256k1 keys)
//! - Merkle root calculations

pub mod address;
pub mod hash;
pub mod merkle;

pub use address::{validate_public_key, AddressError, ProgramHash};
pub use hash::{double_sha256, sha256, sha256_hex, Hash256, HashError, HASH_SIZE};
pub use merkle::{fold_branch, merkle_root};
