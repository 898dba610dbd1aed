//! Fee calculation contract
//!
//! Computing a fee needs ledger state this crate does not own, so every
//! sorting and aggregation call takes the calculator as a parameter.
//! Closures work directly:
//!
//! ```rust
//! use coin_ledger::core::{FeeCalculator, FeeError, Transaction};
//!
//! let flat = |_tx: &Transaction| -> Result<u64, FeeError> { Ok(10) };
//! assert_eq!(flat.fee(&Transaction::new()).unwrap(), 10);
//! ```

use crate::core::transaction::Transaction;
use crate::crypto::Sha256;
use thiserror::Error;

/// Size unit used for fee density (fee per kilobyte)
pub const FEE_DENSITY_UNIT: u64 = 1024;

/// Reasons a fee cannot be computed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("Input {0} not found in unspent outputs")]
    MissingInput(Sha256),
    #[error("Insufficient coin hours: inputs {inputs}, outputs {outputs}")]
    InsufficientHours { inputs: u64, outputs: u64 },
    #[error("Coin hour arithmetic overflow")]
    Overflow,
    #[error("Fee rejected: {0}")]
    Rejected(String),
}

/// Given a transaction, return its fee or an error if the fee cannot be
/// calculated
pub trait FeeCalculator {
    fn fee(&self, tx: &Transaction) -> Result<u64, FeeError>;
}

impl<F> FeeCalculator for F
where
    F: Fn(&Transaction) -> Result<u64, FeeError>,
{
    fn fee(&self, tx: &Transaction) -> Result<u64, FeeError> {
        self(tx)
    }
}

/// Fee per kilobyte of encoded size, `floor(fee * 1024 / size)`.
///
/// The multiplication happens before the division and saturates at
/// `u64::MAX` instead of wrapping. A fee large enough to overflow ranks at the
/// top rather than wrapping around to a small density.
pub fn fee_density(fee: u64, size: usize) -> u64 {
    let size = (size as u64).max(1);
    fee.saturating_mul(FEE_DENSITY_UNIT) / size
}
