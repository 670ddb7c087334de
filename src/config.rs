//! Node configuration
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields a usable development configuration.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::core::{FeeEstimator, AUX_POW_CHAIN_ID, BASE_FEE_RATE, MAX_BLOCK_SIZE, POW_LIMIT_BITS};
use crate::mining::DEFAULT_REFRESH_SECS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Protocol version reported by getinfo
    pub version: u32,
    pub testnet: bool,
    pub node_port: u16,
    pub rpc_port: u16,
    pub rest_port: u16,
    pub ws_port: u16,
    pub open_port: u16,
    pub open_service: bool,
    /// Chain id reported to merged miners
    pub aux_chain_id: u32,
    /// Seconds before a block template is regenerated
    pub aux_refresh_secs: i64,
    /// Sela per KB at fee multiplier 1
    pub base_fee_rate: u64,
    pub max_block_size: usize,
    pub pow_limit_bits: u32,
    /// Reward address for the development mining service
    pub miner_address: Option<String>,
    /// Startup log level, 0 (trace) to 6 (off)
    pub log_level: i64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            version: 0,
            testnet: false,
            node_port: 20608,
            rpc_port: 20606,
            rest_port: 20604,
            ws_port: 20605,
            open_port: 20866,
            open_service: false,
            aux_chain_id: AUX_POW_CHAIN_ID,
            aux_refresh_secs: DEFAULT_REFRESH_SECS,
            base_fee_rate: BASE_FEE_RATE,
            max_block_size: MAX_BLOCK_SIZE,
            pow_limit_bits: POW_LIMIT_BITS,
            miner_address: None,
            log_level: 2,
        }
    }
}

impl NodeConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn fee_estimator(&self) -> FeeEstimator {
        FeeEstimator::new(self.base_fee_rate, self.max_block_size)
    }

    /// Startup log filter: a plain level in `rust_log` wins over `log_level`
    pub fn log_filter(&self, rust_log: Option<&str>) -> LevelFilter {
        rust_log
            .and_then(|value| value.trim().parse().ok())
            .or_else(|| level_filter(self.log_level))
            .unwrap_or(LevelFilter::Info)
    }
}

/// Log filter for a numeric level, 0 being the most verbose
pub fn level_filter(level: i64) -> Option<LevelFilter> {
    let filter = match level {
        0 => LevelFilter::Trace,
        1 => LevelFilter::Debug,
        2 => LevelFilter::Info,
        3 => LevelFilter::Warn,
        4 | 5 => LevelFilter::Error,
        6 => LevelFilter::Off,
        _ => return None,
    };
    Some(filter)
}
