//! Sidechain RPC: the command surface of a merge-mined sidechain node
//!
//! This crate provides:
//! - Merged-mining block templates with a short-lived cache
//! - Binary codecs and JSON renderings of blocks and transactions
//! - Unspent output queries split into vote and normal classes
//! - Fee estimation from recent block fullness
//! - A JSON command dispatcher served over HTTP
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use sidechain_rpc::api::Params;
//! use sidechain_rpc::cli::devnet_dispatcher;
//! use sidechain_rpc::config::NodeConfig;
//!
//! let dispatcher = devnet_dispatcher(NodeConfig::default()).unwrap();
//!
//! // Mine a block on the development chain
//! let params = Params::from_value(json!({"count": 1})).unwrap();
//! assert!(dispatcher.dispatch("discretemining", &params).is_success());
//!
//! // Best height is now 1
//! let height = dispatcher.dispatch("getblockheight", &Params::default());
//! assert_eq!(height.result, json!(1));
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod ledger;
pub mod mining;
pub mod utxo;

// Re-export commonly used types
pub use api::{create_router, ApiState, CommandDispatcher, ErrCode, Response};
pub use config::NodeConfig;
pub use core::{AuxPow, Block, FeeEstimator, Fixed64, Header, Transaction};
pub use crypto::{Hash256, ProgramHash};
pub use ledger::{BlockEngine, Ledger, MemoryChain, MiningService, Node};
pub use mining::{AuxBlockManager, Mempool};
