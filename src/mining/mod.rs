//! Block candidate assembly
//!
//! Provides the pending transaction pool and selection of transactions
//! for the next block.

pub mod mempool;

pub use mempool::{Mempool, MempoolEntry, MempoolError, MempoolStats, DEFAULT_MEMPOOL_SIZE};
