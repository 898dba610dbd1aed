//! Core ledger components
//!
//! This module contains the transaction integrity model:
//! - Transactions (inner hash, identity hash, signing, stateless verification)
//! - Error taxonomy for verification and construction misuse
//! - Unspent output set (output identities, spend checks, coin-hour fees)
//! - Fee calculator contract
//! - Transaction batches (fee density ordering, byte-budget packing)
//! - Readable JSON form

pub mod error;
pub mod fee;
pub mod readable;
pub mod transaction;
pub mod transactions;
pub mod unspent;

pub use error::{ErrorKind, TransactionError};
pub use fee::{fee_density, FeeCalculator, FeeError, FEE_DENSITY_UNIT};
pub use readable::{ReadableError, ReadableOutput, ReadableTransaction};
pub use transaction::{
    Transaction, TransactionHeader, TransactionOutput, COIN_QUANTUM, MAX_INPUTS,
};
pub use transactions::{sort_transactions, SortEntry, SortableTransactions, Transactions};
pub use unspent::{SpendError, UnspentPool, UxBody, UxOut};
