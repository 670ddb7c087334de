//! Command surface
//!
//! JSON commands over HTTP. A request names a `method` and an object of
//! named `params`; every answer is an envelope
//! `{"Result": ..., "Error": <code>}`.
//!
//! # Commands
//!
//! ## Merged mining
//! - `createauxblock`, `submitauxblock`, `auxhelp`
//! - `togglemining`, `discretemining`
//!
//! ## Chain
//! - `getblock`, `getblockbyheight`, `getblockhash`, `getbestblockhash`
//! - `getblockcount`, `getblockheight`, `gettransactionsbyheight`
//! - `getarbitratorgroupbyheight`
//!
//! ## Transactions
//! - `getrawtransaction`, `gettransactionbyhash`, `getrawmempool`
//! - `sendrawtransaction`, `getexistwithdrawtransactions`, `estimatesmartfee`
//!
//! ## Addresses & assets
//! - `getbalancebyaddr`, `getbalancebyasset`, `getreceivedbyaddress`
//! - `listunspent`, `getunspends`, `getunspendoutput`, `getassetbyhash`
//! - `votestatus`, `getdepositcoin`, `gethistory`
//!
//! ## Producers & node
//! - `listproducers`, `producerstatus`
//! - `getinfo`, `getnodestate`, `getneighbors`, `getconnectioncount`, `setloglevel`

pub mod codec;
pub mod dispatcher;
pub mod errors;
pub mod handlers;
pub mod params;
pub mod routes;

pub use dispatcher::CommandDispatcher;
pub use errors::{ErrCode, Response, RpcError, RpcResult};
pub use handlers::ApiState;
pub use params::Params;
pub use routes::create_router;
