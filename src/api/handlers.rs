//! Command handlers
//!
//! Each handler validates its named parameters first, then queries the
//! ledger, node or aux manager and renders a wire record.

use log::{error, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::codec::{
    block_info, block_transactions, raw_hex, transaction_info, BlockContext,
};
use super::errors::{ErrCode, RpcError, RpcResult};
use super::params::Params;
use crate::config::{level_filter, NodeConfig};
use crate::core::{Decodable, FeeEstimator, Fixed64, Header, Transaction};
use crate::crypto::{validate_public_key, Hash256, ProgramHash};
use crate::ledger::{BlockEngine, Ledger, MiningService, Node, ProducerState};
use crate::mining::{AuxBlockManager, AuxError};
use crate::utxo::{self, UtxoError, UtxoFilter};

/// Shared state behind every command
#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<dyn Ledger>,
    pub node: Arc<dyn Node>,
    pub aux: Arc<AuxBlockManager>,
    pub fees: FeeEstimator,
    pub config: Arc<NodeConfig>,
}

impl ApiState {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        node: Arc<dyn Node>,
        engine: Arc<dyn BlockEngine>,
        mining: Option<Arc<dyn MiningService>>,
        config: NodeConfig,
    ) -> Self {
        let aux = AuxBlockManager::new(ledger.clone(), node.clone(), engine, mining)
            .with_chain_id(config.aux_chain_id)
            .with_refresh_secs(config.aux_refresh_secs);
        Self {
            ledger,
            node,
            aux: Arc::new(aux),
            fees: config.fee_estimator(),
            config: Arc::new(config),
        }
    }

    fn block_context(&self, height: u32) -> BlockContext {
        BlockContext {
            best_height: self.ledger.best_height(),
            next_hash: height
                .checked_add(1)
                .and_then(|next| self.ledger.block_hash(next).ok()),
            pow_limit_bits: self.config.pow_limit_bits,
        }
    }

    /// Header of the block containing a committed transaction
    fn containing_header(&self, height: u32) -> Option<Header> {
        let hash = self.ledger.block_hash(height).ok()?;
        self.ledger.header(&hash).ok()
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

impl From<AuxError> for RpcError {
    fn from(err: AuxError) -> Self {
        match err {
            AuxError::PowServiceNotStarted => RpcError::from_code(ErrCode::PowServiceNotStarted),
            AuxError::MiningFailed(e) => RpcError::new(ErrCode::Error, e.to_string()),
            other => RpcError::internal(other.to_string()),
        }
    }
}

impl From<UtxoError> for RpcError {
    fn from(err: UtxoError) -> Self {
        match err {
            UtxoError::Ledger(_) => RpcError::invalid_params("cannot get asset with program"),
            other => RpcError::internal(other.to_string()),
        }
    }
}

// ============================================================================
// Parameter Helpers
// ============================================================================

fn to_value<T: Serialize>(value: T) -> RpcResult {
    serde_json::to_value(value).map_err(|e| RpcError::internal(e.to_string()))
}

fn required<'a>(params: &'a Params, key: &str, missing: &str) -> Result<&'a str, RpcError> {
    params
        .string(key)
        .ok_or_else(|| RpcError::invalid_params(missing))
}

fn wire_hash(s: &str, invalid: &str) -> Result<Hash256, RpcError> {
    Hash256::from_wire(s).map_err(|_| RpcError::invalid_params(invalid))
}

fn program_hash(address: &str, invalid: &str) -> Result<ProgramHash, RpcError> {
    ProgramHash::from_address(address).map_err(|_| RpcError::invalid_params(invalid))
}

fn height_param(params: &Params) -> Result<u32, RpcError> {
    params
        .uint("height")
        .ok_or_else(|| RpcError::invalid_params("height parameter should be a positive integer"))
}

// ============================================================================
// Transactions
// ============================================================================

/// getrawtransaction: committed or pooled transaction, raw hex unless verbose
pub fn get_raw_transaction(state: &ApiState, params: &Params) -> RpcResult {
    let hash = wire_hash(required(params, "txid", "")?, "")?;

    let (tx, header) = match state.ledger.transaction(&hash) {
        Ok((tx, height)) => {
            let header = state
                .containing_header(height)
                .ok_or_else(|| RpcError::from_code(ErrCode::UnknownTransaction))?;
            (tx, Some(header))
        }
        Err(_) => {
            let tx = state.node.pool_transaction(&hash).ok_or_else(|| {
                RpcError::new(
                    ErrCode::UnknownTransaction,
                    "cannot find transaction in blockchain and transactionpool",
                )
            })?;
            (tx, None)
        }
    };

    if params.bool("verbose").unwrap_or(false) {
        to_value(transaction_info(
            &tx,
            header.as_ref(),
            state.ledger.best_height(),
        ))
    } else {
        Ok(Value::String(raw_hex(&tx)))
    }
}

/// gettransactionbyhash: committed transaction record
pub fn get_transaction_by_hash(state: &ApiState, params: &Params) -> RpcResult {
    let hash = wire_hash(required(params, "hash", "")?, "")?;
    let (tx, height) = state
        .ledger
        .transaction(&hash)
        .map_err(|_| RpcError::from_code(ErrCode::UnknownTransaction))?;
    let header = state
        .containing_header(height)
        .ok_or_else(|| RpcError::from_code(ErrCode::UnknownBlock))?;
    to_value(transaction_info(&tx, Some(&header), state.ledger.best_height()))
}

/// getrawmempool: every pooled transaction
pub fn get_raw_mempool(state: &ApiState, _params: &Params) -> RpcResult {
    let best_height = state.ledger.best_height();
    let txs: Vec<_> = state
        .node
        .transaction_pool()
        .iter()
        .map(|tx| transaction_info(tx, None, best_height))
        .collect();
    to_value(txs)
}

/// sendrawtransaction: decode, admit to the pool and relay
pub fn send_raw_transaction(state: &ApiState, params: &Params) -> RpcResult {
    let data = required(params, "data", "need a string parameter named data")?;
    let bytes =
        hex::decode(data).map_err(|_| RpcError::invalid_params("hex string to bytes error"))?;
    let tx = Transaction::from_bytes(&bytes)
        .map_err(|e| RpcError::new(ErrCode::InvalidTransaction, e.to_string()))?;
    let hash = tx.hash();

    if let Err(e) = state.node.append_to_pool(tx.clone()) {
        warn!("Can not add transaction {} to the pool: {}", hash, e);
        return Err(RpcError::new(ErrCode::InvalidTransaction, e.to_string()));
    }
    if let Err(e) = state.node.relay(&tx) {
        error!("Relay of transaction {} failed: {}", hash, e);
        return Err(RpcError::new(ErrCode::TransmitFailed, e.to_string()));
    }
    Ok(Value::String(hash.to_wire()))
}

/// getexistwithdrawtransactions: the given side-chain hashes already withdrawn
pub fn get_exist_withdraw_transactions(state: &ApiState, params: &Params) -> RpcResult {
    let hashes: Vec<String> = match params.value("txs") {
        Some(Value::Array(_)) => params
            .array_string("txs")
            .ok_or_else(|| RpcError::invalid_params("txs must be strings"))?,
        Some(Value::String(encoded)) => {
            let json =
                hex::decode(encoded).map_err(|_| RpcError::invalid_params("invalid txs hex"))?;
            serde_json::from_slice(&json).map_err(|_| RpcError::invalid_params("invalid txs"))?
        }
        _ => return Err(RpcError::invalid_params("txs not found")),
    };

    let mut found = Vec::new();
    for text in hashes {
        let hash = wire_hash(&text, "invalid transaction hash")?;
        if state.ledger.is_sidechain_tx_duplicate(&hash)
            || state.node.is_duplicate_sidechain_tx(&hash)
        {
            found.push(text);
        }
    }
    to_value(found)
}

// ============================================================================
// Blocks
// ============================================================================

/// getblock: raw hex (0), summary (1, default) or full records (2)
pub fn get_block(state: &ApiState, params: &Params) -> RpcResult {
    let hash = wire_hash(
        required(params, "blockhash", "block hash not found")?,
        "invalid block hash",
    )?;
    let verbosity = params.uint("verbosity").unwrap_or(1);
    let block = state
        .ledger
        .block(&hash)
        .map_err(|_| RpcError::from_code(ErrCode::UnknownBlock))?;

    match verbosity {
        0 => Ok(Value::String(raw_hex(&block))),
        2 => to_value(block_info(&block, &state.block_context(block.height()), true)),
        _ => to_value(block_info(&block, &state.block_context(block.height()), false)),
    }
}

/// getblockbyheight: full block record
pub fn get_block_by_height(state: &ApiState, params: &Params) -> RpcResult {
    let height = height_param(params)?;
    let hash = state
        .ledger
        .block_hash(height)
        .map_err(|e| RpcError::new(ErrCode::UnknownBlock, e.to_string()))?;
    let block = state
        .ledger
        .block(&hash)
        .map_err(|_| RpcError::from_code(ErrCode::UnknownBlock))?;
    to_value(block_info(&block, &state.block_context(height), true))
}

/// gettransactionsbyheight: transaction hashes of one block
pub fn get_transactions_by_height(state: &ApiState, params: &Params) -> RpcResult {
    let height = height_param(params)?;
    let block = state
        .ledger
        .block_at(height)
        .map_err(|_| RpcError::from_code(ErrCode::UnknownBlock))?;
    to_value(block_transactions(&block))
}

pub fn get_block_hash(state: &ApiState, params: &Params) -> RpcResult {
    let height = height_param(params)?;
    let hash = state
        .ledger
        .block_hash(height)
        .map_err(|_| RpcError::from_code(ErrCode::InvalidParams))?;
    Ok(Value::String(hash.to_wire()))
}

pub fn get_best_block_hash(state: &ApiState, _params: &Params) -> RpcResult {
    let hash = state
        .ledger
        .best_block_hash()
        .map_err(|_| RpcError::from_code(ErrCode::InvalidParams))?;
    Ok(Value::String(hash.to_wire()))
}

pub fn get_block_count(state: &ApiState, _params: &Params) -> RpcResult {
    Ok(json!(state.ledger.best_height() + 1))
}

pub fn get_block_height(state: &ApiState, _params: &Params) -> RpcResult {
    Ok(json!(state.ledger.best_height()))
}

#[derive(Debug, Serialize)]
pub struct ArbitratorGroupInfo {
    #[serde(rename = "OnDutyArbitratorIndex")]
    pub on_duty_arbitrator_index: usize,
    #[serde(rename = "Arbitrators")]
    pub arbitrators: Vec<String>,
}

/// getarbitratorgroupbyheight: arbitrators and the one on duty at a height
pub fn get_arbitrator_group_by_height(state: &ApiState, params: &Params) -> RpcResult {
    let height = height_param(params)?;
    let hash = state
        .ledger
        .block_hash(height)
        .map_err(|_| RpcError::from_code(ErrCode::UnknownBlock))?;
    let block = state
        .ledger
        .block(&hash)
        .map_err(|_| RpcError::from_code(ErrCode::InternalError))?;

    let arbitrators = state.ledger.arbitrators();
    if arbitrators.is_empty() {
        return Err(RpcError::internal("no arbitrators available"));
    }
    to_value(ArbitratorGroupInfo {
        on_duty_arbitrator_index: block.height() as usize % arbitrators.len(),
        arbitrators: arbitrators.iter().map(hex::encode).collect(),
    })
}

// ============================================================================
// Merged Mining
// ============================================================================

pub fn create_aux_block(state: &ApiState, params: &Params) -> RpcResult {
    let address = required(params, "paytoaddress", "parameter paytoaddress not found")?;
    let pay_to = program_hash(address, "invalid paytoaddress")?;
    to_value(state.aux.create_aux_block(&pay_to)?)
}

pub fn submit_aux_block(state: &ApiState, params: &Params) -> RpcResult {
    let block_hash = required(params, "blockhash", "parameter blockhash not found")?;
    let aux_pow = required(params, "auxpow", "parameter auxpow not found")?;
    let hash = wire_hash(block_hash, "bad blockhash")?;
    state.aux.submit_aux_block(&hash, aux_pow)?;
    Ok(Value::Bool(true))
}

pub fn aux_help(_state: &ApiState, _params: &Params) -> RpcResult {
    Ok(json!("createauxblock==submitauxblock"))
}

pub fn toggle_mining(state: &ApiState, params: &Params) -> RpcResult {
    let mining = params
        .bool("mining")
        .ok_or_else(|| RpcError::from_code(ErrCode::InvalidParams))?;
    Ok(json!(state.aux.toggle_mining(mining)?))
}

pub fn discrete_mining(state: &ApiState, params: &Params) -> RpcResult {
    let count = params
        .uint("count")
        .ok_or_else(|| RpcError::from_code(ErrCode::InvalidParams))?;
    let hashes: Vec<String> = state
        .aux
        .discrete_mining(count)?
        .iter()
        .map(Hash256::to_wire)
        .collect();
    to_value(hashes)
}

// ============================================================================
// Node
// ============================================================================

pub fn get_neighbors(state: &ApiState, _params: &Params) -> RpcResult {
    to_value(state.node.neighbour_addresses())
}

pub fn get_connection_count(state: &ApiState, _params: &Params) -> RpcResult {
    Ok(json!(state.node.connection_count()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NeighborInfo {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "HexID")]
    pub hex_id: String,
    pub height: u64,
    pub services: u64,
    pub relay: bool,
    pub external: bool,
    pub state: String,
    pub net_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeState {
    pub compile: String,
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "HexID")]
    pub hex_id: String,
    pub height: u64,
    pub version: u32,
    pub services: u64,
    pub relay: bool,
    pub txn_cnt: u64,
    pub rx_txn_cnt: u64,
    pub port: u16,
    #[serde(rename = "PRCPort")]
    pub rpc_port: u16,
    pub rest_port: u16,
    #[serde(rename = "WSPort")]
    pub ws_port: u16,
    pub open_port: u16,
    pub open_service: bool,
    pub neighbors: Vec<NeighborInfo>,
}

pub fn get_node_state(state: &ApiState, _params: &Params) -> RpcResult {
    let summary = state.node.summary();
    let neighbors = state
        .node
        .neighbours()
        .into_iter()
        .map(|peer| NeighborInfo {
            id: peer.id,
            hex_id: format!("0x{:x}", peer.id),
            height: peer.height,
            services: peer.services,
            relay: peer.relay,
            external: peer.external,
            state: peer.state,
            net_address: peer.net_address,
        })
        .collect();

    let config = &state.config;
    to_value(NodeState {
        compile: env!("CARGO_PKG_VERSION").to_string(),
        id: summary.id,
        hex_id: format!("0x{:x}", summary.id),
        height: state.ledger.best_height() as u64,
        version: summary.version,
        services: summary.services,
        relay: summary.relay,
        txn_cnt: summary.txn_count,
        rx_txn_cnt: summary.rx_txn_count,
        port: config.node_port,
        rpc_port: config.rpc_port,
        rest_port: config.rest_port,
        ws_port: config.ws_port,
        open_port: config.open_port,
        open_service: config.open_service,
        neighbors,
    })
}

#[derive(Debug, Serialize)]
pub struct NodeInfo {
    pub version: u32,
    pub balance: i64,
    pub blocks: u32,
    pub timeoffset: i64,
    pub connections: u32,
    pub testnet: bool,
    pub keypoololdest: i64,
    pub keypoolsize: i64,
    pub unlocked_until: i64,
    pub paytxfee: i64,
    pub relayfee: i64,
    pub errors: String,
}

pub fn get_info(state: &ApiState, _params: &Params) -> RpcResult {
    to_value(NodeInfo {
        version: state.config.version,
        balance: 0,
        blocks: state.ledger.best_height(),
        timeoffset: 0,
        connections: state.node.connection_count(),
        testnet: state.config.testnet,
        keypoololdest: 0,
        keypoolsize: 0,
        unlocked_until: 0,
        paytxfee: 0,
        relayfee: 0,
        errors: String::new(),
    })
}

pub fn set_log_level(_state: &ApiState, params: &Params) -> RpcResult {
    let (level, filter) = params
        .int("level")
        .and_then(|level| level_filter(level).map(|filter| (level, filter)))
        .ok_or_else(|| RpcError::invalid_params("level must be an integer in 0-6"))?;
    log::set_max_level(filter);
    Ok(json!(format!("log level has been set to {}", level)))
}

// ============================================================================
// Assets & Balances
// ============================================================================

pub fn get_asset_by_hash(state: &ApiState, params: &Params) -> RpcResult {
    let hash = wire_hash(required(params, "hash", "")?, "")?;
    let asset = state
        .ledger
        .asset(&hash)
        .map_err(|_| RpcError::from_code(ErrCode::UnknownAsset))?;
    to_value(asset)
}

pub fn get_balance_by_addr(state: &ApiState, params: &Params) -> RpcResult {
    let owner = program_hash(required(params, "addr", "")?, "")?;
    Ok(json!(utxo::balance(state.ledger.as_ref(), &owner, None)?.to_string()))
}

pub fn get_balance_by_asset(state: &ApiState, params: &Params) -> RpcResult {
    let owner = program_hash(required(params, "addr", "")?, "")?;
    let asset_id = wire_hash(required(params, "assetid", "")?, "")?;
    let balance = utxo::balance(state.ledger.as_ref(), &owner, Some(&asset_id))?;
    Ok(json!(balance.to_string()))
}

pub fn get_received_by_address(state: &ApiState, params: &Params) -> RpcResult {
    let address = required(params, "address", "need a parameter named address")?;
    let owner = program_hash(address, &format!("Invalid address: {}", address))?;
    Ok(json!(utxo::received(state.ledger.as_ref(), &owner)?.to_string()))
}

/// listunspent: native-asset outputs of several addresses
pub fn list_unspent(state: &ApiState, params: &Params) -> RpcResult {
    let addresses = params
        .array_string("addresses")
        .ok_or_else(|| RpcError::invalid_params("need addresses in an array!"))?;
    let filter = match params.string("utxotype") {
        Some(name) => name
            .parse::<UtxoFilter>()
            .map_err(|_| RpcError::invalid_params("invalid utxotype"))?,
        None => UtxoFilter::default(),
    };

    let mut result = Vec::new();
    for address in &addresses {
        let owner = program_hash(address, &format!("Invalid address: {}", address))?;
        result.extend(utxo::list_unspent(
            state.ledger.as_ref(),
            address,
            &owner,
            filter,
        )?);
    }
    to_value(result)
}

pub fn get_unspends(state: &ApiState, params: &Params) -> RpcResult {
    let owner = program_hash(required(params, "addr", "")?, "")?;
    to_value(utxo::unspents_by_asset(state.ledger.as_ref(), &owner)?)
}

pub fn get_unspend_output(state: &ApiState, params: &Params) -> RpcResult {
    let owner = program_hash(required(params, "addr", "")?, "")?;
    let asset_id = wire_hash(required(params, "assetid", "")?, "")?;
    let outputs = utxo::unspent_outputs(state.ledger.as_ref(), &owner, &asset_id)
        .map_err(|_| RpcError::from_code(ErrCode::InvalidParams))?;
    to_value(outputs)
}

pub fn get_deposit_coin(state: &ApiState, params: &Params) -> RpcResult {
    let key = required(params, "ownerpublickey", "need a param called ownerpublickey")?;
    let key = hex::decode(key).map_err(|_| RpcError::invalid_params("invalid publickey"))?;
    let deposit = ProgramHash::deposit(&key)
        .map_err(|_| RpcError::invalid_params("invalid publickey to programHash"))?;
    let available = utxo::balance(state.ledger.as_ref(), &deposit, None)?;
    Ok(json!({
        "available": available.to_string(),
        "deducted": Fixed64::ZERO.to_string(),
    }))
}

pub fn vote_status(state: &ApiState, params: &Params) -> RpcResult {
    let address = required(params, "address", "address not found")?;
    let owner = program_hash(address, &format!("Invalid address: {}", address))?;
    to_value(utxo::vote_status(
        state.ledger.as_ref(),
        state.node.as_ref(),
        &owner,
    )?)
}

pub fn get_history(state: &ApiState, params: &Params) -> RpcResult {
    let address = required(params, "addr", "")?;
    program_hash(address, "")?;
    to_value(state.ledger.transaction_history(address))
}

/// estimatesmartfee: fee rate in sela per KB for a confirmation target
pub fn estimate_smart_fee(state: &ApiState, params: &Params) -> RpcResult {
    let confirmations = params
        .int("confirmations")
        .ok_or_else(|| RpcError::invalid_params("need a param called confirmations"))?;
    let ledger = state.ledger.as_ref();
    let fee = state
        .fees
        .estimate(confirmations, ledger.best_height(), |height| {
            ledger.block_at(height).ok().map(|block| block.size())
        })
        .map_err(|e| RpcError::invalid_params(e.to_string()))?;
    Ok(json!(fee))
}

// ============================================================================
// Producers
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProducerRecord {
    pub ownerpublickey: String,
    pub nodepublickey: String,
    pub nickname: String,
    pub url: String,
    pub location: u64,
    pub active: bool,
    pub votes: String,
    pub netaddress: String,
    pub index: u64,
}

#[derive(Debug, Serialize)]
pub struct ProducerList {
    pub producers: Vec<ProducerRecord>,
    pub totalvotes: String,
    pub totalcounts: u64,
}

/// listproducers: producers in `[start, limit)`, with totals over all
pub fn list_producers(state: &ApiState, params: &Params) -> RpcResult {
    let start = params.int("start").unwrap_or(0).max(0) as usize;
    let limit = params
        .int("limit")
        .map_or(usize::MAX, |limit| limit.max(0) as usize);

    let producers = state
        .ledger
        .registered_producers()
        .map_err(|_| RpcError::new(ErrCode::Error, "not found producer"))?;

    let mut total_votes = Fixed64::ZERO;
    let mut records = Vec::with_capacity(producers.len());
    for (index, producer) in producers.iter().enumerate() {
        let votes = state.ledger.producer_votes(&producer.owner_public_key);
        total_votes += votes;
        records.push(ProducerRecord {
            ownerpublickey: hex::encode(&producer.owner_public_key),
            nodepublickey: hex::encode(&producer.node_public_key),
            nickname: producer.nickname.clone(),
            url: producer.url.clone(),
            location: producer.location,
            active: state.ledger.producer_state(&producer.owner_public_key)
                == ProducerState::Registered,
            votes: votes.to_string(),
            netaddress: producer.net_address.clone(),
            index: index as u64,
        });
    }

    let total = records.len();
    let page: Vec<ProducerRecord> = records
        .into_iter()
        .take(limit.min(total))
        .skip(start)
        .collect();
    to_value(ProducerList {
        producers: page,
        totalvotes: total_votes.to_string(),
        totalcounts: total as u64,
    })
}

pub fn producer_status(state: &ApiState, params: &Params) -> RpcResult {
    let key = required(params, "publickey", "public key not found")?;
    let key = hex::decode(key).map_err(|_| RpcError::invalid_params("invalid public key"))?;
    validate_public_key(&key).map_err(|_| RpcError::invalid_params("invalid public key bytes"))?;
    Ok(json!(state.ledger.producer_state(&key).to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::auxpow::tests::sample_aux_pow;
    use crate::core::payload::{ProducerPayload, WithdrawFromSideChain};
    use crate::core::{Encodable, Input, OutPoint, Output, Payload};
    use crate::crypto::address::tests::test_public_key;
    use crate::ledger::memory::tests::{test_miner, transfer, vote_output};
    use crate::ledger::{MemoryChain, PeerInfo};

    pub(crate) fn test_state() -> (Arc<MemoryChain>, ApiState) {
        let chain = Arc::new(MemoryChain::devnet(test_miner()));
        let state = ApiState::new(
            chain.clone(),
            chain.clone(),
            chain.clone(),
            Some(chain.clone()),
            NodeConfig::default(),
        );
        (chain, state)
    }

    fn params(value: Value) -> Params {
        Params::from_value(value).unwrap()
    }

    fn code_of(result: RpcResult) -> ErrCode {
        result.unwrap_err().code
    }

    #[test]
    fn test_block_hash_scenario() {
        let (chain, state) = test_state();
        chain.mine_block().unwrap();

        let result = get_block_hash(&state, &params(json!({"height": 1}))).unwrap();
        assert_eq!(result, json!(chain.block_hash(1).unwrap().to_wire()));

        assert_eq!(
            code_of(get_block_hash(&state, &params(json!({"height": 5})))),
            ErrCode::InvalidParams
        );
        assert_eq!(
            code_of(get_block_hash(&state, &params(json!({"height": -1})))),
            ErrCode::InvalidParams
        );
    }

    #[test]
    fn test_heights_and_counts() {
        let (chain, state) = test_state();
        chain.mine_block().unwrap();
        let empty = Params::default();

        assert_eq!(get_block_height(&state, &empty).unwrap(), json!(1));
        assert_eq!(get_block_count(&state, &empty).unwrap(), json!(2));
        assert_eq!(
            get_best_block_hash(&state, &empty).unwrap(),
            json!(chain.best_block_hash().unwrap().to_wire())
        );
    }

    #[test]
    fn test_get_block_verbosity() {
        let (chain, state) = test_state();
        let block = chain.mine_block().unwrap();
        let hash = block.hash().to_wire();

        let raw = get_block(&state, &params(json!({"blockhash": hash, "verbosity": 0}))).unwrap();
        assert_eq!(raw, json!(hex::encode(block.to_bytes())));

        let summary = get_block(&state, &params(json!({"blockhash": hash}))).unwrap();
        assert!(summary["tx"][0].is_string());

        let full = get_block(&state, &params(json!({"blockhash": hash, "verbosity": 2}))).unwrap();
        assert!(full["tx"][0].is_object());

        assert_eq!(
            code_of(get_block(&state, &params(json!({"blockhash": Hash256([7; 32]).to_wire()})))),
            ErrCode::UnknownBlock
        );
        assert_eq!(
            code_of(get_block(&state, &params(json!({"blockhash": "xyz"})))),
            ErrCode::InvalidParams
        );
    }

    #[test]
    fn test_block_by_height_and_transactions() {
        let (chain, state) = test_state();
        let block = chain.mine_block().unwrap();

        let full = get_block_by_height(&state, &params(json!({"height": 1}))).unwrap();
        assert_eq!(full["hash"], json!(block.hash().to_wire()));
        assert!(full["tx"][0].is_object());

        let txs = get_transactions_by_height(&state, &params(json!({"height": 1}))).unwrap();
        assert_eq!(txs["Height"], json!(1));
        assert_eq!(
            code_of(get_transactions_by_height(&state, &params(json!({"height": 9})))),
            ErrCode::UnknownBlock
        );
    }

    #[test]
    fn test_raw_transaction_lookup() {
        let (chain, state) = test_state();
        let block = chain.mine_block().unwrap();
        let coinbase = &block.transactions[0];
        let txid = coinbase.hash().to_wire();

        let raw = get_raw_transaction(&state, &params(json!({"txid": txid}))).unwrap();
        assert_eq!(raw, json!(hex::encode(coinbase.to_bytes())));

        let verbose =
            get_raw_transaction(&state, &params(json!({"txid": txid, "verbose": true}))).unwrap();
        assert_eq!(verbose["blockhash"], json!(block.hash().to_wire()));
        assert_eq!(verbose["confirmations"], json!(1));

        let by_hash = get_transaction_by_hash(&state, &params(json!({"hash": txid}))).unwrap();
        assert_eq!(by_hash, verbose);

        let missing = get_raw_transaction(
            &state,
            &params(json!({"txid": Hash256([1; 32]).to_wire()})),
        )
        .unwrap_err();
        assert_eq!(missing.code, ErrCode::UnknownTransaction);
        assert_eq!(
            code_of(get_transaction_by_hash(
                &state,
                &params(json!({"hash": Hash256([1; 32]).to_wire()}))
            )),
            ErrCode::UnknownTransaction
        );
    }

    fn spend_of_coinbase(chain: &MemoryChain) -> Transaction {
        let block = chain.mine_block().unwrap();
        let mut spend = transfer(
            vec![Output::new(chain.native_asset_id(), Fixed64(1), test_miner())],
            1,
        );
        spend.inputs.push(Input {
            previous: OutPoint {
                tx_id: block.transactions[0].hash(),
                index: 1,
            },
            sequence: 0,
        });
        spend
    }

    #[test]
    fn test_send_raw_transaction() {
        let (chain, state) = test_state();
        let spend = spend_of_coinbase(&chain);
        let data = hex::encode(spend.to_bytes());

        let result = send_raw_transaction(&state, &params(json!({"data": data}))).unwrap();
        assert_eq!(result, json!(spend.hash().to_wire()));
        assert_eq!(chain.relayed_transactions(), vec![spend.hash()]);

        let pooled =
            get_raw_transaction(&state, &params(json!({"txid": spend.hash().to_wire(), "verbose": true})))
                .unwrap();
        assert_eq!(pooled["confirmations"], json!(0));
        assert_eq!(
            get_raw_mempool(&state, &Params::default()).unwrap()[0]["txid"],
            json!(spend.hash().to_wire())
        );

        // Resubmission is refused by the pool
        assert_eq!(
            code_of(send_raw_transaction(&state, &params(json!({"data": data})))),
            ErrCode::InvalidTransaction
        );
        let err = send_raw_transaction(&state, &params(json!({"data": "zz"}))).unwrap_err();
        assert_eq!(err.message, "hex string to bytes error");
        assert_eq!(
            code_of(send_raw_transaction(&state, &params(json!({"data": "0102"})))),
            ErrCode::InvalidTransaction
        );
    }

    #[test]
    fn test_aux_round_trip() {
        let (chain, state) = test_state();
        chain.mine_block().unwrap();
        let address = test_miner().to_address();

        let template =
            create_aux_block(&state, &params(json!({"paytoaddress": address}))).unwrap();
        assert_eq!(template["height"], json!(2));
        assert_eq!(template["chainid"], json!(6));

        let proof = hex::encode(sample_aux_pow().to_bytes());
        let accepted = submit_aux_block(
            &state,
            &params(json!({"blockhash": template["hash"], "auxpow": proof})),
        )
        .unwrap();
        assert_eq!(accepted, json!(true));
        assert_eq!(chain.best_height(), 2);
    }

    #[test]
    fn test_aux_parameter_errors() {
        let (_, state) = test_state();
        let err = create_aux_block(&state, &Params::default()).unwrap_err();
        assert_eq!(err.message, "parameter paytoaddress not found");
        assert_eq!(
            code_of(create_aux_block(&state, &params(json!({"paytoaddress": "nope"})))),
            ErrCode::InvalidParams
        );

        let err = submit_aux_block(
            &state,
            &params(json!({"blockhash": Hash256([2; 32]).to_wire(), "auxpow": "00"})),
        )
        .unwrap_err();
        assert_eq!(err, RpcError::internal("block hash unknown"));

        let err = submit_aux_block(&state, &params(json!({"blockhash": "12", "auxpow": "00"})))
            .unwrap_err();
        assert_eq!(err.message, "bad blockhash");
    }

    #[test]
    fn test_existing_height_scenario() {
        let (chain, state) = test_state();
        let address = test_miner().to_address();
        let template =
            create_aux_block(&state, &params(json!({"paytoaddress": address}))).unwrap();
        chain.mine_block().unwrap();

        let proof = hex::encode(sample_aux_pow().to_bytes());
        let err = submit_aux_block(
            &state,
            &params(json!({"blockhash": template["hash"], "auxpow": proof})),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrCode::InternalError);
        assert_eq!(err.message, "reject the block which have existing height");
    }

    #[test]
    fn test_mining_commands() {
        let (chain, state) = test_state();
        assert_eq!(
            toggle_mining(&state, &params(json!({"mining": true}))).unwrap(),
            json!("mining started")
        );
        let hashes = discrete_mining(&state, &params(json!({"count": 2}))).unwrap();
        assert_eq!(hashes.as_array().unwrap().len(), 2);
        assert_eq!(hashes[1], json!(chain.best_block_hash().unwrap().to_wire()));

        assert_eq!(
            code_of(discrete_mining(&state, &params(json!({"count": -3})))),
            ErrCode::InvalidParams
        );

        let bare = ApiState::new(
            chain.clone(),
            chain.clone(),
            chain.clone(),
            None,
            NodeConfig::default(),
        );
        assert_eq!(
            code_of(discrete_mining(&bare, &params(json!({"count": 1})))),
            ErrCode::PowServiceNotStarted
        );
        assert_eq!(aux_help(&bare, &Params::default()).unwrap(), json!("createauxblock==submitauxblock"));
    }

    #[test]
    fn test_node_queries() {
        let (chain, state) = test_state();
        chain.add_peer(PeerInfo {
            id: 255,
            height: 3,
            services: 1,
            relay: true,
            external: false,
            state: "ESTABLISH".into(),
            net_address: "127.0.0.1:20608".into(),
        });

        assert_eq!(
            get_neighbors(&state, &Params::default()).unwrap(),
            json!(["127.0.0.1:20608"])
        );
        assert_eq!(get_connection_count(&state, &Params::default()).unwrap(), json!(1));

        let node_state = get_node_state(&state, &Params::default()).unwrap();
        assert_eq!(node_state["Neighbors"][0]["HexID"], json!("0xff"));
        assert_eq!(node_state["PRCPort"], json!(20606));
        assert_eq!(node_state["Height"], json!(0));

        let info = get_info(&state, &Params::default()).unwrap();
        assert_eq!(info["connections"], json!(1));
        assert_eq!(info["blocks"], json!(0));
    }

    #[test]
    fn test_set_log_level() {
        let _ = crate::cli::logger_builder().is_test(true).try_init();
        let (_, state) = test_state();
        assert_eq!(
            set_log_level(&state, &params(json!({"level": 2}))).unwrap(),
            json!("log level has been set to 2")
        );
        for bad in [json!({"level": 7}), json!({"level": -1}), json!({})] {
            let err = set_log_level(&state, &params(bad)).unwrap_err();
            assert_eq!(err.message, "level must be an integer in 0-6");
        }
        assert!(log::log_enabled!(log::Level::Info));
        assert!(!log::log_enabled!(log::Level::Debug));

        set_log_level(&state, &params(json!({"level": 1}))).unwrap();
        assert!(log::log_enabled!(log::Level::Debug));
        assert!(!log::log_enabled!(log::Level::Trace));

        set_log_level(&state, &params(json!({"level": 0}))).unwrap();
        assert!(log::log_enabled!(log::Level::Trace));

        set_log_level(&state, &params(json!({"level": 3}))).unwrap();
        assert!(log::log_enabled!(log::Level::Warn));
        assert!(!log::log_enabled!(log::Level::Info));
    }

    #[test]
    fn test_listunspent_scenario() {
        let (chain, state) = test_state();
        let owner = ProgramHash::standard(&test_public_key(11)).unwrap();
        let vote = transfer(
            vec![vote_output(&chain, owner, 500_000_000, test_public_key(3))],
            1,
        );
        chain.mine_with(vec![vote.clone()]).unwrap();
        let address = owner.to_address();

        let votes = list_unspent(
            &state,
            &params(json!({"addresses": [address], "utxotype": "vote"})),
        )
        .unwrap();
        assert_eq!(votes.as_array().unwrap().len(), 1);
        assert_eq!(votes[0]["txid"], json!(vote.hash().to_wire()));
        assert_eq!(votes[0]["amount"], json!("5"));

        let normal = list_unspent(
            &state,
            &params(json!({"addresses": [address], "utxotype": "normal"})),
        )
        .unwrap();
        assert_eq!(normal, json!([]));

        let err = list_unspent(
            &state,
            &params(json!({"addresses": [address], "utxotype": "all"})),
        )
        .unwrap_err();
        assert_eq!(err.message, "invalid utxotype");
        assert_eq!(
            code_of(list_unspent(&state, &params(json!({"addresses": ["bad"]})))),
            ErrCode::InvalidParams
        );

        let status = vote_status(&state, &params(json!({"address": address}))).unwrap();
        assert_eq!(status, json!({"total": "5", "voting": "5", "pending": false}));
    }

    #[test]
    fn test_balances_and_assets() {
        let (chain, state) = test_state();
        chain.mine_block().unwrap();
        let address = test_miner().to_address();
        let native = chain.native_asset_id().to_wire();

        assert_eq!(
            get_balance_by_addr(&state, &params(json!({"addr": address}))).unwrap(),
            json!("3.5")
        );
        assert_eq!(
            get_balance_by_asset(&state, &params(json!({"addr": address, "assetid": native})))
                .unwrap(),
            json!("3.5")
        );
        assert_eq!(
            get_received_by_address(&state, &params(json!({"address": address}))).unwrap(),
            json!("3.5")
        );
        let err = get_received_by_address(&state, &params(json!({"address": "bad"}))).unwrap_err();
        assert_eq!(err.message, "Invalid address: bad");

        let unspends = get_unspends(&state, &params(json!({"addr": address}))).unwrap();
        assert_eq!(unspends[0]["AssetName"], json!("ELA"));
        let outputs =
            get_unspend_output(&state, &params(json!({"addr": address, "assetid": native})))
                .unwrap();
        assert_eq!(outputs[0]["Value"], json!("3.5"));

        let asset = get_asset_by_hash(&state, &params(json!({"hash": native}))).unwrap();
        assert_eq!(asset["Name"], json!("ELA"));
        assert_eq!(
            code_of(get_asset_by_hash(
                &state,
                &params(json!({"hash": Hash256([5; 32]).to_wire()}))
            )),
            ErrCode::UnknownAsset
        );

        let history = get_history(&state, &params(json!({"addr": address}))).unwrap();
        assert_eq!(history[0]["Type"], json!("income"));
    }

    #[test]
    fn test_deposit_coin() {
        let (chain, state) = test_state();
        let key = test_public_key(21);
        let deposit = ProgramHash::deposit(&key).unwrap();
        chain
            .mine_with(vec![transfer(
                vec![Output::new(chain.native_asset_id(), Fixed64(250_000_000), deposit)],
                4,
            )])
            .unwrap();

        let result =
            get_deposit_coin(&state, &params(json!({"ownerpublickey": hex::encode(&key)}))).unwrap();
        assert_eq!(result, json!({"available": "2.5", "deducted": "0"}));
        assert_eq!(
            get_deposit_coin(&state, &params(json!({"ownerpublickey": "0102"})))
                .unwrap_err()
                .message,
            "invalid publickey to programHash"
        );
    }

    #[test]
    fn test_estimate_smart_fee() {
        let (chain, state) = test_state();
        chain.mine_block().unwrap();
        assert_eq!(
            estimate_smart_fee(&state, &params(json!({"confirmations": 6}))).unwrap(),
            json!(10_000)
        );
        assert_eq!(
            estimate_smart_fee(&state, &params(json!({"confirmations": 0}))).unwrap(),
            json!(20_000)
        );
        assert_eq!(
            estimate_smart_fee(&state, &params(json!({"confirmations": -1}))).unwrap(),
            json!(30_000)
        );
        for bad in [json!({"confirmations": 26}), json!({})] {
            assert_eq!(code_of(estimate_smart_fee(&state, &params(bad))), ErrCode::InvalidParams);
        }
    }

    #[test]
    fn test_exist_withdraw_transactions() {
        let (chain, state) = test_state();
        let withdrawn = Hash256([8; 32]);
        let withdraw = Transaction {
            payload: Payload::WithdrawFromSideChain(WithdrawFromSideChain {
                block_height: 1,
                genesis_block_address: "genesis".into(),
                side_chain_tx_hashes: vec![withdrawn],
            }),
            ..transfer(Vec::new(), 5)
        };
        chain.mine_with(vec![withdraw]).unwrap();

        let known = withdrawn.to_wire();
        let unknown = Hash256([9; 32]).to_wire();
        let as_array = get_exist_withdraw_transactions(
            &state,
            &params(json!({"txs": [known, unknown]})),
        )
        .unwrap();
        assert_eq!(as_array, json!([known]));

        let encoded = hex::encode(serde_json::to_vec(&json!([unknown, known])).unwrap());
        let as_hex =
            get_exist_withdraw_transactions(&state, &params(json!({"txs": encoded}))).unwrap();
        assert_eq!(as_hex, json!([known]));

        assert_eq!(
            code_of(get_exist_withdraw_transactions(&state, &params(json!({"txs": ["zz"]})))),
            ErrCode::InvalidParams
        );
    }

    fn register(owner: Vec<u8>, nickname: &str, nonce: u8) -> Transaction {
        Transaction {
            payload: Payload::RegisterProducer(ProducerPayload {
                owner_public_key: owner,
                node_public_key: test_public_key(nonce + 100),
                nickname: nickname.into(),
                ..ProducerPayload::default()
            }),
            ..transfer(Vec::new(), nonce)
        }
    }

    #[test]
    fn test_producers() {
        let (chain, state) = test_state();
        let (a, b, c) = (test_public_key(1), test_public_key(2), test_public_key(3));
        chain
            .mine_with(vec![
                register(a.clone(), "a", 1),
                register(b.clone(), "b", 2),
                register(c.clone(), "c", 3),
                transfer(vec![vote_output(&chain, test_miner(), 300, b.clone())], 4),
            ])
            .unwrap();

        let all = list_producers(&state, &Params::default()).unwrap();
        assert_eq!(all["totalcounts"], json!(3));
        assert_eq!(all["totalvotes"], json!("0.000003"));
        assert_eq!(all["producers"][0]["ownerpublickey"], json!(hex::encode(&b)));
        assert_eq!(all["producers"][0]["active"], json!(true));

        let page = list_producers(&state, &params(json!({"start": 1, "limit": 2}))).unwrap();
        let page = page["producers"].as_array().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["index"], json!(1));

        let clamped = list_producers(&state, &params(json!({"start": -4}))).unwrap();
        assert_eq!(clamped["producers"].as_array().unwrap().len(), 3);

        assert_eq!(
            producer_status(&state, &params(json!({"publickey": hex::encode(&a)}))).unwrap(),
            json!("Registered")
        );
        assert_eq!(
            producer_status(&state, &params(json!({"publickey": "00ff"})))
                .unwrap_err()
                .message,
            "invalid public key bytes"
        );
    }

    #[test]
    fn test_arbitrator_group() {
        let (chain, state) = test_state();
        chain.mine_block().unwrap();
        chain.mine_block().unwrap();
        assert_eq!(
            code_of(get_arbitrator_group_by_height(&state, &params(json!({"height": 1})))),
            ErrCode::InternalError
        );

        chain.set_arbitrators(vec![vec![1], vec![2]]);
        let group = get_arbitrator_group_by_height(&state, &params(json!({"height": 1}))).unwrap();
        assert_eq!(group, json!({"OnDutyArbitratorIndex": 1, "Arbitrators": ["01", "02"]}));
        assert_eq!(
            code_of(get_arbitrator_group_by_height(&state, &params(json!({"height": 40})))),
            ErrCode::UnknownBlock
        );
    }
}
