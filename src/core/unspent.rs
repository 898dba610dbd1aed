//! Unspent output set
//!
//! An in-memory unspent output set. Transactions only reference the outputs
//! they spend by hash; this set resolves those references to owner and
//! amounts, prices transactions in coin hours, and performs the spend checks
//! that stateless verification cannot:
//! - every input exists and is unspent
//! - the key recovered from signature `i` owns input `i`
//! - no coins are created and hours cover the outputs

use crate::core::fee::{FeeCalculator, FeeError};
use crate::core::transaction::Transaction;
use crate::crypto::{pubkey_from_sig, sum_sha256, Address, KeyError, Sha256};
use crate::encoding;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Ledger-side spend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpendError {
    #[error("Input {0} not found in unspent outputs")]
    MissingInput(Sha256),
    #[error("Invalid number of signatures: {signatures} for {inputs} inputs")]
    SignatureCountMismatch { signatures: usize, inputs: usize },
    #[error("Cannot recover signer of input {index}: {source}")]
    UnrecoverableSigner { index: usize, source: KeyError },
    #[error("Signature for input {index} is not from the owning address")]
    WrongSigner { index: usize },
    #[error("Transaction creates coins: inputs {inputs}, outputs {outputs}")]
    CoinsCreated { inputs: u64, outputs: u64 },
    #[error("Insufficient coin hours: inputs {inputs}, outputs {outputs}")]
    InsufficientHours { inputs: u64, outputs: u64 },
    #[error("Amount overflow")]
    Overflow,
    #[error("Fee error: {0}")]
    Fee(FeeError),
}

impl From<FeeError> for SpendError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::MissingInput(hash) => SpendError::MissingInput(hash),
            FeeError::InsufficientHours { inputs, outputs } => {
                SpendError::InsufficientHours { inputs, outputs }
            }
            FeeError::Overflow => SpendError::Overflow,
            other @ FeeError::Rejected(_) => SpendError::Fee(other),
        }
    }
}

// =============================================================================
// Unspent Outputs
// =============================================================================

/// The hashed part of an unspent output. Its hash is the output's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UxBody {
    /// Identity hash of the transaction that created this output
    pub src_transaction: Sha256,
    pub address: Address,
    pub coins: u64,
    pub hours: u64,
}

impl UxBody {
    pub fn hash(&self) -> Sha256 {
        sum_sha256(&encoding::serialize(self))
    }
}

/// An unspent output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxOut {
    pub body: UxBody,
}

impl UxOut {
    pub fn hash(&self) -> Sha256 {
        self.body.hash()
    }

    pub fn is_owned_by(&self, address: &Address) -> bool {
        self.body.address == *address
    }
}

// =============================================================================
// Unspent Pool
// =============================================================================

/// Unspent outputs indexed by identity hash
#[derive(Debug, Clone, Default)]
pub struct UnspentPool {
    pool: HashMap<Sha256, UxOut>,
}

impl UnspentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an output, returning its hash
    pub fn add(&mut self, ux: UxOut) -> Sha256 {
        let hash = ux.hash();
        self.pool.insert(hash, ux);
        hash
    }

    pub fn remove(&mut self, hash: &Sha256) -> Option<UxOut> {
        self.pool.remove(hash)
    }

    pub fn get(&self, hash: &Sha256) -> Option<&UxOut> {
        self.pool.get(hash)
    }

    pub fn contains(&self, hash: &Sha256) -> bool {
        self.pool.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// All outputs owned by `address`
    pub fn outputs_for(&self, address: &Address) -> Vec<&UxOut> {
        self.pool.values().filter(|ux| ux.is_owned_by(address)).collect()
    }

    /// Resolve every input of `tx`, in input order
    pub fn resolve_inputs(&self, tx: &Transaction) -> Result<Vec<&UxOut>, FeeError> {
        tx.inputs()
            .iter()
            .map(|hash| self.get(hash).ok_or(FeeError::MissingInput(*hash)))
            .collect()
    }

    /// The outputs `tx` would create once accepted
    pub fn create_outputs(tx: &Transaction) -> Vec<UxOut> {
        let src_transaction = tx.hash();
        tx.outputs()
            .iter()
            .map(|out| UxOut {
                body: UxBody {
                    src_transaction,
                    address: out.address,
                    coins: out.coins,
                    hours: out.hours,
                },
            })
            .collect()
    }

    /// Checks that need ledger state: input existence, signer ownership,
    /// coin and hour conservation
    pub fn verify_transaction_spend(&self, tx: &Transaction) -> Result<(), SpendError> {
        let uxs = self.resolve_inputs(tx)?;

        if tx.sigs().len() != uxs.len() {
            return Err(SpendError::SignatureCountMismatch {
                signatures: tx.sigs().len(),
                inputs: uxs.len(),
            });
        }

        let hash = tx.header().hash;
        for (index, (sig, ux)) in tx.sigs().iter().zip(&uxs).enumerate() {
            let public_key = pubkey_from_sig(sig, &hash)
                .map_err(|source| SpendError::UnrecoverableSigner { index, source })?;
            if ux.body.address.verify(&public_key).is_err() {
                return Err(SpendError::WrongSigner { index });
            }
        }

        let input_coins = uxs
            .iter()
            .try_fold(0u64, |total, ux| total.checked_add(ux.body.coins))
            .ok_or(SpendError::Overflow)?;
        let output_coins = tx.output_coins().ok_or(SpendError::Overflow)?;
        if output_coins > input_coins {
            return Err(SpendError::CoinsCreated {
                inputs: input_coins,
                outputs: output_coins,
            });
        }

        self.fee(tx)?;
        Ok(())
    }

    /// Spend the inputs of `tx` and add its outputs. Runs the spend checks
    /// first; the pool is unchanged on error.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<Vec<Sha256>, SpendError> {
        self.verify_transaction_spend(tx)?;

        for input in tx.inputs() {
            self.pool.remove(input);
        }
        Ok(Self::create_outputs(tx)
            .into_iter()
            .map(|ux| self.add(ux))
            .collect())
    }
}

/// The fee is the coin hours destroyed: input hours minus output hours
impl FeeCalculator for UnspentPool {
    fn fee(&self, tx: &Transaction) -> Result<u64, FeeError> {
        let input_hours = self
            .resolve_inputs(tx)?
            .iter()
            .try_fold(0u64, |total, ux| total.checked_add(ux.body.hours))
            .ok_or(FeeError::Overflow)?;
        let output_hours = tx.output_hours().map_err(|_| FeeError::Overflow)?;

        input_hours
            .checked_sub(output_hours)
            .ok_or(FeeError::InsufficientHours {
                inputs: input_hours,
                outputs: output_hours,
            })
    }
}
