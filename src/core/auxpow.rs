//! Merged-mining proof
//!
//! An [`AuxPow`] shows that a parent-chain block committed to this chain's
//! block hash: the parent coinbase, its merkle path into the parent block,
//! the path of our block hash through the aux merkle tree, and the parent
//! block header that carries the work.

use super::serialize::{CodecError, Decodable, Encodable, Reader, Writer};
use crate::crypto::{double_sha256, fold_branch, Hash256};

/// Chain id of this auxiliary chain in the parent's aux merkle tree
pub const AUX_POW_CHAIN_ID: u32 = 6;

/// Size of a serialized parent block header
pub const BTC_HEADER_SIZE: usize = 80;

// =============================================================================
// Parent-chain Structures
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BtcTxIn {
    pub previous_hash: Hash256,
    pub previous_index: u32,
    pub script: Vec<u8>,
    pub sequence: u32,
}

impl Encodable for BtcTxIn {
    fn encode(&self, writer: &mut Writer) {
        writer.write_hash(&self.previous_hash);
        writer.write_u32(self.previous_index);
        writer.write_var_bytes(&self.script);
        writer.write_u32(self.sequence);
    }
}

impl Decodable for BtcTxIn {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            previous_hash: reader.read_hash()?,
            previous_index: reader.read_u32()?,
            script: reader.read_var_bytes()?,
            sequence: reader.read_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BtcTxOut {
    pub value: i64,
    pub script: Vec<u8>,
}

impl Encodable for BtcTxOut {
    fn encode(&self, writer: &mut Writer) {
        writer.write_i64(self.value);
        writer.write_var_bytes(&self.script);
    }
}

impl Decodable for BtcTxOut {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            value: reader.read_i64()?,
            script: reader.read_var_bytes()?,
        })
    }
}

/// Parent-chain coinbase transaction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BtcTx {
    pub version: i32,
    pub inputs: Vec<BtcTxIn>,
    pub outputs: Vec<BtcTxOut>,
    pub lock_time: u32,
}

impl BtcTx {
    pub fn hash(&self) -> Hash256 {
        double_sha256(&self.to_bytes())
    }
}

impl Encodable for BtcTx {
    fn encode(&self, writer: &mut Writer) {
        writer.write_i32(self.version);
        writer.write_list(&self.inputs);
        writer.write_list(&self.outputs);
        writer.write_u32(self.lock_time);
    }
}

impl Decodable for BtcTx {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            version: reader.read_i32()?,
            inputs: reader.read_list()?,
            outputs: reader.read_list()?,
            lock_time: reader.read_u32()?,
        })
    }
}

/// 80-byte parent block header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BtcHeader {
    pub version: i32,
    pub previous: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BtcHeader {
    pub fn hash(&self) -> Hash256 {
        double_sha256(&self.to_bytes())
    }
}

impl Encodable for BtcHeader {
    fn encode(&self, writer: &mut Writer) {
        writer.write_i32(self.version);
        writer.write_hash(&self.previous);
        writer.write_hash(&self.merkle_root);
        writer.write_u32(self.timestamp);
        writer.write_u32(self.bits);
        writer.write_u32(self.nonce);
    }
}

impl Decodable for BtcHeader {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            version: reader.read_i32()?,
            previous: reader.read_hash()?,
            merkle_root: reader.read_hash()?,
            timestamp: reader.read_u32()?,
            bits: reader.read_u32()?,
            nonce: reader.read_u32()?,
        })
    }
}

// =============================================================================
// AuxPow
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuxPow {
    pub parent_coinbase: BtcTx,
    pub parent_hash: Hash256,
    pub coinbase_branch: Vec<Hash256>,
    pub coinbase_index: i32,
    pub aux_branch: Vec<Hash256>,
    pub aux_index: i32,
    pub parent_header: BtcHeader,
}

impl AuxPow {
    /// Parse hex-encoded proof bytes; the whole input must be consumed
    pub fn from_hex(data: &str) -> Result<Self, CodecError> {
        let bytes =
            hex::decode(data).map_err(|e| CodecError::Malformed(format!("invalid hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Merkle root the parent coinbase commits to for an aux block hash
    pub fn aux_merkle_root(&self, aux_block_hash: Hash256) -> Hash256 {
        fold_branch(aux_block_hash, &self.aux_branch, self.aux_index)
    }

    /// Whether the coinbase branch leads to the parent header's merkle root
    pub fn coinbase_in_parent(&self) -> bool {
        fold_branch(
            self.parent_coinbase.hash(),
            &self.coinbase_branch,
            self.coinbase_index,
        ) == self.parent_header.merkle_root
    }
}

impl Encodable for AuxPow {
    fn encode(&self, writer: &mut Writer) {
        self.parent_coinbase.encode(writer);
        writer.write_hash(&self.parent_hash);
        writer.write_list(&self.coinbase_branch);
        writer.write_i32(self.coinbase_index);
        writer.write_list(&self.aux_branch);
        writer.write_i32(self.aux_index);
        self.parent_header.encode(writer);
    }
}

impl Decodable for AuxPow {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            parent_coinbase: BtcTx::decode(reader)?,
            parent_hash: reader.read_hash()?,
            coinbase_branch: reader.read_list()?,
            coinbase_index: reader.read_i32()?,
            aux_branch: reader.read_list()?,
            aux_index: reader.read_i32()?,
            parent_header: BtcHeader::decode(reader)?,
        })
    }
}
