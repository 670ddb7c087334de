//! Merged-mining lifecycle
//!
//! Hands block templates to an external miner and accepts the proof of
//! work back. The template cache and its generation bookkeeping sit behind
//! a single mutex; commit happens under that lock and the broadcast after
//! it is released.

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::aux_cache::AuxBlockCache;
use crate::core::{AuxPow, BlockError, CodecError, Fixed64, AUX_POW_CHAIN_ID};
use crate::crypto::{Hash256, ProgramHash};
use crate::ledger::{BlockEngine, EngineError, Ledger, LedgerError, MiningService, Node};

/// Seconds after which the current template is regenerated
pub const DEFAULT_REFRESH_SECS: i64 = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuxError {
    #[error("block hash unknown")]
    UnknownBlockHash,
    #[error("reject the block which have existing height")]
    ExistingHeight,
    #[error("auxpow deserialization failed")]
    InvalidAuxPow(CodecError),
    #[error("adding block failed")]
    CommitFailed(EngineError),
    #[error("generate block failed")]
    GenerationFailed(EngineError),
    #[error("no block cached")]
    NoBlockCached,
    #[error("invalid block template: {0}")]
    InvalidTemplate(#[from] BlockError),
    #[error("get best block hash failed: {0}")]
    Ledger(#[from] LedgerError),
    #[error("pow service not started")]
    PowServiceNotStarted,
    #[error("{0}")]
    MiningFailed(EngineError),
}

/// Template summary returned to a merged miner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuxBlockSummary {
    pub chainid: u32,
    pub height: u32,
    pub coinbasevalue: Fixed64,
    pub bits: String,
    pub hash: String,
    pub previousblockhash: String,
}

/// Owner of the template cache for one node
pub struct AuxBlockManager {
    cache: Mutex<AuxBlockCache>,
    ledger: Arc<dyn Ledger>,
    node: Arc<dyn Node>,
    engine: Arc<dyn BlockEngine>,
    mining: Option<Arc<dyn MiningService>>,
    chain_id: u32,
    refresh_secs: i64,
}

impl AuxBlockManager {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        node: Arc<dyn Node>,
        engine: Arc<dyn BlockEngine>,
        mining: Option<Arc<dyn MiningService>>,
    ) -> Self {
        Self {
            cache: Mutex::new(AuxBlockCache::new()),
            ledger,
            node,
            engine,
            mining,
            chain_id: AUX_POW_CHAIN_ID,
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }

    pub fn with_chain_id(mut self, chain_id: u32) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_refresh_secs(mut self, refresh_secs: i64) -> Self {
        self.refresh_secs = refresh_secs;
        self
    }

    /// Current template for `pay_to`, regenerated when stale
    pub fn create_aux_block(&self, pay_to: &ProgramHash) -> Result<AuxBlockSummary, AuxError> {
        self.create_aux_block_at(pay_to, chrono::Utc::now().timestamp())
    }

    /// [`Self::create_aux_block`] with an explicit wall-clock time in seconds
    pub fn create_aux_block_at(
        &self,
        pay_to: &ProgramHash,
        now: i64,
    ) -> Result<AuxBlockSummary, AuxError> {
        let mut cache = self.cache.lock();
        let height = self.ledger.best_height();

        if let Some(reason) = cache.regeneration(height, now, self.refresh_secs) {
            if cache.height_changed(height) {
                cache.clear();
            }
            let block = self
                .engine
                .generate_block(pay_to)
                .map_err(AuxError::GenerationFailed)?;
            cache.record_generation(height, now);
            let hash = cache.insert(block);
            debug!(
                "Regenerated aux block {} at height {} ({:?})",
                hash, height, reason
            );
        }

        let block = cache.current().ok_or(AuxError::NoBlockCached)?;
        Ok(AuxBlockSummary {
            chainid: self.chain_id,
            height: block.height(),
            coinbasevalue: block.coinbase_reward()?,
            bits: format!("{:x}", block.header.bits),
            hash: block.hash().to_wire(),
            previousblockhash: self.ledger.best_block_hash()?.to_wire(),
        })
    }

    /// Attach a merged-mining proof to a cached template and commit it
    pub fn submit_aux_block(&self, hash: &Hash256, aux_pow_hex: &str) -> Result<(), AuxError> {
        let block = {
            let mut cache = self.cache.lock();
            let template = cache.get_mut(hash).ok_or_else(|| {
                debug!("Submitted aux block {} is not cached", hash);
                AuxError::UnknownBlockHash
            })?;

            let best_height = self.ledger.best_height();
            if best_height >= template.height() {
                debug!(
                    "Rejecting aux block {} at height {}, local height is {}",
                    hash,
                    template.height(),
                    best_height
                );
                return Err(AuxError::ExistingHeight);
            }

            let aux_pow = AuxPow::from_hex(aux_pow_hex).map_err(|e| {
                debug!("Deserialize auxpow for {} failed: {}", hash, e);
                AuxError::InvalidAuxPow(e)
            })?;
            template.header.aux_pow = aux_pow;

            let block = template.clone();
            self.engine.commit_block(block.clone()).map_err(|e| {
                warn!("Commit of aux block {} failed: {}", hash, e);
                AuxError::CommitFailed(e)
            })?;
            block
        };

        self.node.broadcast_block(&block);
        info!(
            "Accepted aux block {} at height {}",
            block.hash(),
            block.height()
        );
        Ok(())
    }

    /// Mine `count` blocks on the local service
    pub fn discrete_mining(&self, count: u32) -> Result<Vec<Hash256>, AuxError> {
        let mining = self.mining.as_ref().ok_or(AuxError::PowServiceNotStarted)?;
        info!("Discrete mining {} block(s)", count);
        mining.discrete_mining(count).map_err(AuxError::MiningFailed)
    }

    /// Start or halt the local mining service
    pub fn toggle_mining(&self, start: bool) -> Result<&'static str, AuxError> {
        let mining = self.mining.as_ref().ok_or(AuxError::PowServiceNotStarted)?;
        if start {
            mining.start();
            Ok("mining started")
        } else {
            mining.halt();
            Ok("mining stopped")
        }
    }

    pub fn is_mining(&self) -> bool {
        self.mining.as_ref().is_some_and(|m| m.is_mining())
    }

    pub fn chain_id(&self) -> u32 {
        self.chain_id
    }

    /// Number of cached templates
    pub fn cached_templates(&self) -> usize {
        self.cache.lock().len()
    }
}
