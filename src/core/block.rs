//! Block implementation for the sidechain
//!
//! A block contains a header, with its merged-mining proof, and a list of
//! transactions. The first transaction is the coinbase.

use thiserror::Error;

use super::amount::Fixed64;
use super::auxpow::AuxPow;
use super::serialize::{CodecError, Decodable, Encodable, Reader, Writer};
use super::transaction::Transaction;
use crate::crypto::{double_sha256, merkle_root, Hash256};

// =============================================================================
// Block Constants
// =============================================================================

/// Maximum serialized block size in bytes
pub const MAX_BLOCK_SIZE: usize = 8_000_000;

/// Current block version
pub const BLOCK_VERSION: u32 = 0;

/// Index of the coinbase output paying the miner
pub const COINBASE_REWARD_INDEX: usize = 1;

// =============================================================================
// Block Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("Block has no transactions")]
    NoTransactions,
    #[error("First transaction is not a coinbase")]
    MissingCoinbase,
    #[error("Coinbase has no reward output at index {COINBASE_REWARD_INDEX}")]
    MissingRewardOutput,
}

/// Block header; the hash excludes the merged-mining proof
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub version: u32,
    pub previous: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    pub height: u32,
    pub aux_pow: AuxPow,
}

impl Header {
    fn encode_without_proof(&self, writer: &mut Writer) {
        writer.write_u32(self.version);
        writer.write_hash(&self.previous);
        writer.write_hash(&self.merkle_root);
        writer.write_u32(self.timestamp);
        writer.write_u32(self.bits);
        writer.write_u32(self.nonce);
        writer.write_u32(self.height);
    }

    pub fn hash(&self) -> Hash256 {
        let mut writer = Writer::new();
        self.encode_without_proof(&mut writer);
        double_sha256(&writer.into_inner())
    }
}

impl Encodable for Header {
    fn encode(&self, writer: &mut Writer) {
        self.encode_without_proof(writer);
        self.aux_pow.encode(writer);
    }
}

impl Decodable for Header {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            version: reader.read_u32()?,
            previous: reader.read_hash()?,
            merkle_root: reader.read_hash()?,
            timestamp: reader.read_u32()?,
            bits: reader.read_u32()?,
            nonce: reader.read_u32()?,
            height: reader.read_u32()?,
            aux_pow: AuxPow::decode(reader)?,
        })
    }
}

/// A block in the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Assemble a block, computing the merkle root over the transactions
    pub fn new(mut header: Header, transactions: Vec<Transaction>) -> Self {
        header.merkle_root = Self::calculate_merkle_root(&transactions);
        Self {
            header,
            transactions,
        }
    }

    pub fn calculate_merkle_root(transactions: &[Transaction]) -> Hash256 {
        let hashes: Vec<Hash256> = transactions.iter().map(Transaction::hash).collect();
        merkle_root(&hashes)
    }

    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Serialized size in bytes
    pub fn size(&self) -> usize {
        self.encoded_size()
    }

    pub fn is_full(&self) -> bool {
        self.size() >= MAX_BLOCK_SIZE
    }

    pub fn coinbase(&self) -> Result<&Transaction, BlockError> {
        let first = self.transactions.first().ok_or(BlockError::NoTransactions)?;
        if first.is_coinbase() {
            Ok(first)
        } else {
            Err(BlockError::MissingCoinbase)
        }
    }

    /// Value the merged miner can claim
    pub fn coinbase_reward(&self) -> Result<Fixed64, BlockError> {
        self.coinbase()?
            .outputs
            .get(COINBASE_REWARD_INDEX)
            .map(|output| output.value)
            .ok_or(BlockError::MissingRewardOutput)
    }
}

impl Encodable for Block {
    fn encode(&self, writer: &mut Writer) {
        self.header.encode(writer);
        writer.write_list(&self.transactions);
    }
}

impl Decodable for Block {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            header: Header::decode(reader)?,
            transactions: reader.read_list()?,
        })
    }
}
