//! Command dispatch
//!
//! Maps a command name to its handler and wraps every outcome in the
//! response envelope.

use log::debug;
use serde_json::Value;
use std::collections::HashMap;

use super::errors::{ErrCode, Response, RpcError, RpcResult};
use super::handlers::{self, ApiState};
use super::params::Params;

pub type Handler = fn(&ApiState, &Params) -> RpcResult;

/// Every command the node answers, by wire name
const COMMANDS: &[(&str, Handler)] = &[
    ("getrawtransaction", handlers::get_raw_transaction),
    ("getneighbors", handlers::get_neighbors),
    ("getnodestate", handlers::get_node_state),
    ("setloglevel", handlers::set_log_level),
    ("createauxblock", handlers::create_aux_block),
    ("submitauxblock", handlers::submit_aux_block),
    ("auxhelp", handlers::aux_help),
    ("getinfo", handlers::get_info),
    ("togglemining", handlers::toggle_mining),
    ("discretemining", handlers::discrete_mining),
    ("getconnectioncount", handlers::get_connection_count),
    ("getrawmempool", handlers::get_raw_mempool),
    ("getblock", handlers::get_block),
    ("sendrawtransaction", handlers::send_raw_transaction),
    ("getblockcount", handlers::get_block_count),
    ("getblockheight", handlers::get_block_height),
    ("getbestblockhash", handlers::get_best_block_hash),
    ("getblockhash", handlers::get_block_hash),
    ("getblockbyheight", handlers::get_block_by_height),
    ("gettransactionsbyheight", handlers::get_transactions_by_height),
    ("getarbitratorgroupbyheight", handlers::get_arbitrator_group_by_height),
    ("getassetbyhash", handlers::get_asset_by_hash),
    ("getbalancebyaddr", handlers::get_balance_by_addr),
    ("getbalancebyasset", handlers::get_balance_by_asset),
    ("getreceivedbyaddress", handlers::get_received_by_address),
    ("listunspent", handlers::list_unspent),
    ("getunspends", handlers::get_unspends),
    ("getunspendoutput", handlers::get_unspend_output),
    ("gettransactionbyhash", handlers::get_transaction_by_hash),
    ("getexistwithdrawtransactions", handlers::get_exist_withdraw_transactions),
    ("listproducers", handlers::list_producers),
    ("producerstatus", handlers::producer_status),
    ("votestatus", handlers::vote_status),
    ("getdepositcoin", handlers::get_deposit_coin),
    ("estimatesmartfee", handlers::estimate_smart_fee),
    ("gethistory", handlers::get_history),
];

pub struct CommandDispatcher {
    state: ApiState,
    handlers: HashMap<&'static str, Handler>,
}

impl CommandDispatcher {
    pub fn new(state: ApiState) -> Self {
        Self {
            state,
            handlers: COMMANDS.iter().copied().collect(),
        }
    }

    pub fn state(&self) -> &ApiState {
        &self.state
    }

    /// Registered command names, sorted
    pub fn commands(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run a command with a JSON params value
    pub fn dispatch_value(&self, method: &str, params: Value) -> Response {
        match Params::from_value(params) {
            Ok(params) => self.dispatch(method, &params),
            Err(err) => Response::failure(err),
        }
    }

    pub fn dispatch(&self, method: &str, params: &Params) -> Response {
        Response::from(self.call(method, params))
    }

    fn call(&self, method: &str, params: &Params) -> RpcResult {
        let handler = self.handlers.get(method).ok_or_else(|| {
            debug!("Unknown command {}", method);
            RpcError::from_code(ErrCode::InvalidMethod)
        })?;
        handler(&self.state, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::tests::test_state;
    use serde_json::json;

    #[test]
    fn test_every_command_registered() {
        let (_, state) = test_state();
        let dispatcher = CommandDispatcher::new(state);
        assert_eq!(dispatcher.commands().len(), COMMANDS.len());
        assert_eq!(COMMANDS.len(), 36);
    }

    #[test]
    fn test_unknown_method() {
        let (_, state) = test_state();
        let dispatcher = CommandDispatcher::new(state);
        let response = dispatcher.dispatch("getfoo", &Params::default());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"Result": "Invalid method", "Error": 42001})
        );
    }

    #[test]
    fn test_envelopes() {
        let (chain, state) = test_state();
        chain.mine_block().unwrap();
        let dispatcher = CommandDispatcher::new(state);

        let count = dispatcher.dispatch_value("getblockcount", Value::Null);
        assert!(count.is_success());
        assert_eq!(count.result, json!(2));

        let missing = dispatcher.dispatch_value("getblockhash", json!({"height": 9}));
        assert_eq!(
            serde_json::to_value(&missing).unwrap(),
            json!({"Result": "Invalid Params", "Error": 42002})
        );

        let not_object = dispatcher.dispatch_value("getblockcount", json!([1]));
        assert_eq!(not_object.error, ErrCode::InvalidParams);
    }
}
