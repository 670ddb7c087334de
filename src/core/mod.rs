//! Core ledger entities
//!
//! This module contains the fundamental building blocks:
//! - Binary wire codec (varints, var-bytes, little-endian integers)
//! - Transactions with typed payloads and typed outputs
//! - Blocks and their merged-mining proof
//! - Fixed-point amounts
//! - Compact difficulty targets
//! - Fee estimation

pub mod amount;
pub mod auxpow;
pub mod block;
pub mod difficulty;
pub mod fee;
pub mod payload;
pub mod serialize;
pub mod transaction;

pub use amount::{Fixed64, SELA_PER_COIN};
pub use auxpow::{AuxPow, BtcHeader, BtcTx, AUX_POW_CHAIN_ID};
pub use block::{Block, BlockError, Header, COINBASE_REWARD_INDEX, MAX_BLOCK_SIZE};
pub use difficulty::{difficulty_string, POW_LIMIT_BITS};
pub use fee::{FeeError, FeeEstimator, BASE_FEE_RATE, MAX_CONFIRMATION_TARGET};
pub use payload::{Asset, OutputPayload, OutputType, Payload, VoteContent, VoteOutput};
pub use serialize::{CodecError, Decodable, Encodable, Reader, Writer};
pub use transaction::{
    Attribute, Input, OutPoint, Output, Program, Transaction, TX_VERSION_09,
};
