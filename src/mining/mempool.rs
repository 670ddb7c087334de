//! Transaction pool for pending transactions
//!
//! Holds unconfirmed transactions waiting to be included in blocks.
//! Admission checks:
//! - No duplicates, no coinbase transactions
//! - Every input spends a known unspent output (chain or pool)
//! - No two pool transactions spend the same output
//! - No two pool transactions withdraw the same side-chain hash

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::core::payload::Payload;
use crate::core::{OutPoint, Transaction};
use crate::crypto::Hash256;

// =============================================================================
// Configuration
// =============================================================================

/// Default maximum pool transaction count
pub const DEFAULT_MEMPOOL_SIZE: usize = 10000;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MempoolError {
    #[error("Transaction already exists")]
    DuplicateTransaction,
    #[error("Coinbase transactions cannot enter the pool")]
    Coinbase,
    #[error("Input {0}:{1} not found")]
    MissingInput(Hash256, u16),
    #[error("Input {0}:{1} already spent by a pool transaction")]
    DoubleSpend(Hash256, u16),
    #[error("Side-chain transaction {0} already withdrawn")]
    DuplicateSidechainTx(Hash256),
    #[error("Mempool full")]
    MempoolFull,
}

// =============================================================================
// Mempool Entry
// =============================================================================

#[derive(Debug, Clone)]
pub struct MempoolEntry {
    pub tx: Transaction,
    /// When the transaction was added (Unix timestamp)
    pub added_time: i64,
}

// =============================================================================
// Mempool
// =============================================================================

/// Memory pool for pending transactions, mined in arrival order
#[derive(Debug)]
pub struct Mempool {
    entries: HashMap<Hash256, MempoolEntry>,
    by_time: Vec<Hash256>,
    spent: HashSet<OutPoint>,
    max_size: usize,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

impl Mempool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMPOOL_SIZE)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            by_time: Vec::new(),
            spent: HashSet::new(),
            max_size,
        }
    }

    /// Add a transaction; `is_unspent` answers for outputs on the chain
    pub fn add_transaction<F>(&mut self, tx: Transaction, is_unspent: F) -> Result<Hash256, MempoolError>
    where
        F: Fn(&OutPoint) -> bool,
    {
        let tx_id = tx.hash();
        if self.entries.contains_key(&tx_id) {
            return Err(MempoolError::DuplicateTransaction);
        }
        if tx.is_coinbase() {
            return Err(MempoolError::Coinbase);
        }
        if self.entries.len() >= self.max_size {
            return Err(MempoolError::MempoolFull);
        }

        for input in &tx.inputs {
            let previous = input.previous;
            if self.spent.contains(&previous) {
                return Err(MempoolError::DoubleSpend(previous.tx_id, previous.index));
            }
            let in_pool = self
                .entries
                .get(&previous.tx_id)
                .is_some_and(|e| e.tx.outputs.len() > previous.index as usize);
            if !in_pool && !is_unspent(&previous) {
                return Err(MempoolError::MissingInput(previous.tx_id, previous.index));
            }
        }

        for hash in withdrawn_hashes(&tx) {
            if self.has_sidechain_hash(hash) {
                return Err(MempoolError::DuplicateSidechainTx(*hash));
            }
        }

        self.spent.extend(tx.inputs.iter().map(|input| input.previous));
        self.by_time.push(tx_id);
        self.entries.insert(
            tx_id,
            MempoolEntry {
                tx,
                added_time: chrono::Utc::now().timestamp(),
            },
        );
        Ok(tx_id)
    }

    /// Remove a transaction from the pool
    pub fn remove_transaction(&mut self, tx_id: &Hash256) -> Option<Transaction> {
        let entry = self.entries.remove(tx_id)?;
        self.by_time.retain(|id| id != tx_id);
        for input in &entry.tx.inputs {
            self.spent.remove(&input.previous);
        }
        Some(entry.tx)
    }

    /// Remove transactions that are now in a block
    pub fn remove_transactions(&mut self, tx_ids: &[Hash256]) {
        for id in tx_ids {
            self.remove_transaction(id);
        }
    }

    /// Drop transactions whose inputs are neither on the chain nor in the pool
    pub fn remove_conflicting<F>(&mut self, is_unspent: F)
    where
        F: Fn(&OutPoint) -> bool,
    {
        let to_remove: Vec<Hash256> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.tx.inputs.iter().any(|input| {
                    !is_unspent(&input.previous) && !self.entries.contains_key(&input.previous.tx_id)
                })
            })
            .map(|(id, _)| *id)
            .collect();
        self.remove_transactions(&to_remove);
    }

    /// Transactions in arrival order, up to `limit`
    pub fn get_transactions_fifo(&self, limit: usize) -> Vec<Transaction> {
        self.by_time
            .iter()
            .take(limit)
            .filter_map(|id| self.entries.get(id).map(|e| e.tx.clone()))
            .collect()
    }

    pub fn get(&self, tx_id: &Hash256) -> Option<&Transaction> {
        self.entries.get(tx_id).map(|e| &e.tx)
    }

    pub fn contains(&self, tx_id: &Hash256) -> bool {
        self.entries.contains_key(tx_id)
    }

    pub fn has_sidechain_hash(&self, hash: &Hash256) -> bool {
        self.entries
            .values()
            .any(|e| withdrawn_hashes(&e.tx).any(|h| h == hash))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Side-chain hashes a withdrawal transaction consumes
pub fn withdrawn_hashes(tx: &Transaction) -> impl Iterator<Item = &Hash256> {
    let hashes: &[Hash256] = match &tx.payload {
        Payload::WithdrawFromSideChain(p) => &p.side_chain_tx_hashes,
        _ => &[],
    };
    hashes.iter()
}
