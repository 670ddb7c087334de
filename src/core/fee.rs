//! Fee Estimation
//!
//! Congestion-driven fee heuristic:
//! - Count consecutive full blocks back from the chain tip
//! - Compare that run with the requested confirmation target
//! - Scale the base fee rate by the resulting multiplier

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::block::MAX_BLOCK_SIZE;

// =============================================================================
// Constants
// =============================================================================

/// Base fee rate in sela per KB
pub const BASE_FEE_RATE: u64 = 10_000;

/// Largest confirmation target accepted
pub const MAX_CONFIRMATION_TARGET: i64 = 25;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("support only {MAX_CONFIRMATION_TARGET} confirmations at most, got {0}")]
    TargetTooLarge(i64),
}

// =============================================================================
// Fee Estimator
// =============================================================================

/// Estimates the fee rate for a confirmation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimator {
    /// Sela per KB at multiplier 1
    pub base_fee_rate: u64,
    /// Size at which a block counts as full
    pub max_block_size: usize,
}

impl Default for FeeEstimator {
    fn default() -> Self {
        Self {
            base_fee_rate: BASE_FEE_RATE,
            max_block_size: MAX_BLOCK_SIZE,
        }
    }
}

impl FeeEstimator {
    pub fn new(base_fee_rate: u64, max_block_size: usize) -> Self {
        Self {
            base_fee_rate,
            max_block_size,
        }
    }

    /// Number of consecutive full blocks ending at `tip`.
    ///
    /// `block_size` returns `None` when a block cannot be read, which ends
    /// the scan like a non-full block does.
    pub fn count_full_blocks<F>(&self, tip: u32, mut block_size: F) -> u32
    where
        F: FnMut(u32) -> Option<usize>,
    {
        let mut count = 0;
        for height in (0..=tip).rev() {
            match block_size(height) {
                Some(size) if size >= self.max_block_size => count += 1,
                _ => break,
            }
        }
        count
    }

    /// Fee multiplier for a run of full blocks and a confirmation target;
    /// always at least 1
    pub fn multiplier(full_blocks: u32, confirmations: i64) -> u64 {
        let gap = (full_blocks as i64 - confirmations).max(-1);
        (gap + 2) as u64
    }

    /// Estimated fee rate in sela per KB
    pub fn estimate<F>(&self, confirmations: i64, tip: u32, block_size: F) -> Result<u64, FeeError>
    where
        F: FnMut(u32) -> Option<usize>,
    {
        if confirmations > MAX_CONFIRMATION_TARGET {
            return Err(FeeError::TargetTooLarge(confirmations));
        }
        let full_blocks = self.count_full_blocks(tip, block_size);
        Ok(Self::multiplier(full_blocks, confirmations) * self.base_fee_rate)
    }
}

// =============================================================================
// Tests
// =============================================================================
