//! Unspent output classification and queries
//!
//! Outputs are split into vote and normal classes; listings filter on
//! that split (mixed applies no filter).

pub mod classifier;
pub mod query;

pub use classifier::{classify, InvalidFilter, OutputClass, UtxoFilter};
pub use query::{
    balance, list_unspent, received, unspent_outputs, unspents_by_asset, vote_status,
    AssetUnspents, UnspentInfo, UtxoError, UtxoInfo, VoteStatus,
};
