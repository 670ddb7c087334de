//! Mining module: merged-mining templates and transaction pooling

pub mod aux_cache;
pub mod aux_manager;
pub mod mempool;

pub use aux_cache::{AuxBlockCache, Regeneration};
pub use aux_manager::{AuxBlockManager, AuxBlockSummary, AuxError, DEFAULT_REFRESH_SECS};
pub use mempool::{Mempool, MempoolEntry, MempoolError};
