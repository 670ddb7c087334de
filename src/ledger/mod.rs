//! Interfaces to the ledger and node engine
//!
//! The command surface never touches storage, consensus or the network
//! directly. It goes through these traits:
//! - [`Ledger`]: committed chain state
//! - [`Node`]: peers, transaction pool and propagation
//! - [`BlockEngine`]: block template generation and block commit
//! - [`MiningService`]: the optional local proof-of-work service

pub mod memory;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::core::payload::ProducerPayload;
use crate::core::{Asset, Block, Fixed64, Header, Transaction};
use crate::crypto::{Hash256, ProgramHash};

pub use memory::MemoryChain;

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("inconsistent ledger state: {0}")]
    Inconsistent(String),
    #[error("ledger backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("duplicate transaction {0}")]
    Duplicate(Hash256),
    #[error("relay failed: {0}")]
    RelayFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("block generation failed: {0}")]
    Generation(String),
    #[error("block rejected: {0}")]
    Rejected(String),
    #[error("mining failed: {0}")]
    Mining(String),
}

// =============================================================================
// Query Results
// =============================================================================

/// An unspent output as indexed by owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnspentOutput {
    pub tx_id: Hash256,
    pub index: u16,
    pub value: Fixed64,
}

/// Unspent outputs of one owner, grouped by asset id
pub type UnspentsByAsset = BTreeMap<Hash256, Vec<UnspentOutput>>;

/// Registration state of a block producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProducerState {
    Unregistered,
    Registered,
    Cancelled,
}

impl fmt::Display for ProducerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProducerState::Unregistered => "Unregistered",
            ProducerState::Registered => "Registered",
            ProducerState::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// A known peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: u64,
    pub height: u64,
    pub services: u64,
    pub relay: bool,
    pub external: bool,
    pub state: String,
    pub net_address: String,
}

/// The local node as it describes itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub id: u64,
    pub version: u32,
    pub services: u64,
    pub relay: bool,
    pub txn_count: u64,
    pub rx_txn_count: u64,
}

/// One transaction as seen from an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionHistory {
    pub address: String,
    pub txid: String,
    /// "income" or "spend"
    #[serde(rename = "Type")]
    pub kind: String,
    pub value: i64,
    pub create_time: u32,
    pub height: u32,
    pub fee: i64,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub tx_type: String,
}

// =============================================================================
// Traits
// =============================================================================

/// Read access to committed chain state
pub trait Ledger: Send + Sync {
    fn best_height(&self) -> u32;

    /// Id of the chain's native asset
    fn native_asset_id(&self) -> Hash256;

    fn block_hash(&self, height: u32) -> Result<Hash256, LedgerError>;

    fn header(&self, hash: &Hash256) -> Result<Header, LedgerError>;

    fn block(&self, hash: &Hash256) -> Result<Block, LedgerError>;

    fn best_block_hash(&self) -> Result<Hash256, LedgerError> {
        self.block_hash(self.best_height())
    }

    /// Block at a height, resolved through its hash
    fn block_at(&self, height: u32) -> Result<Block, LedgerError> {
        self.block(&self.block_hash(height)?)
    }

    /// A committed transaction and the height of its block
    fn transaction(&self, hash: &Hash256) -> Result<(Transaction, u32), LedgerError>;

    fn asset(&self, id: &Hash256) -> Result<Asset, LedgerError>;

    fn unspents(&self, owner: &ProgramHash) -> Result<UnspentsByAsset, LedgerError>;

    fn unspents_of_asset(
        &self,
        owner: &ProgramHash,
        asset_id: &Hash256,
    ) -> Result<Vec<UnspentOutput>, LedgerError>;

    /// Whether a side-chain withdrawal hash was already processed
    fn is_sidechain_tx_duplicate(&self, hash: &Hash256) -> bool;

    /// Known producers, highest vote first
    fn registered_producers(&self) -> Result<Vec<ProducerPayload>, LedgerError>;

    fn producer_state(&self, owner_public_key: &[u8]) -> ProducerState;

    fn producer_votes(&self, owner_public_key: &[u8]) -> Fixed64;

    /// Current arbitrator public keys in duty order
    fn arbitrators(&self) -> Vec<Vec<u8>>;

    fn transaction_history(&self, address: &str) -> Vec<TransactionHistory>;
}

/// The local peer-to-peer node
pub trait Node: Send + Sync {
    fn summary(&self) -> NodeSummary;

    fn neighbours(&self) -> Vec<PeerInfo>;

    fn neighbour_addresses(&self) -> Vec<String> {
        self.neighbours()
            .into_iter()
            .map(|peer| peer.net_address)
            .collect()
    }

    fn connection_count(&self) -> u32 {
        self.neighbours().len() as u32
    }

    /// Snapshot of the transaction pool
    fn transaction_pool(&self) -> Vec<Transaction>;

    fn pool_transaction(&self, hash: &Hash256) -> Option<Transaction> {
        self.transaction_pool()
            .into_iter()
            .find(|tx| tx.hash() == *hash)
    }

    /// Verify and admit a transaction to the pool
    fn append_to_pool(&self, tx: Transaction) -> Result<(), NodeError>;

    fn relay(&self, tx: &Transaction) -> Result<(), NodeError>;

    fn broadcast_block(&self, block: &Block);

    /// Whether a pool transaction already withdraws this side-chain hash
    fn is_duplicate_sidechain_tx(&self, hash: &Hash256) -> bool;
}

/// Block assembly and commit
pub trait BlockEngine: Send + Sync {
    /// Assemble a template for the next height paying the reward to `pay_to`
    fn generate_block(&self, pay_to: &ProgramHash) -> Result<Block, EngineError>;

    /// Validate and append a completed block
    fn commit_block(&self, block: Block) -> Result<(), EngineError>;
}

/// Local proof-of-work service
pub trait MiningService: Send + Sync {
    fn start(&self);

    fn halt(&self);

    fn is_mining(&self) -> bool;

    /// Mine `count` blocks right now, returning their hashes in order
    fn discrete_mining(&self, count: u32) -> Result<Vec<Hash256>, EngineError>;
}
