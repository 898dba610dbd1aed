//! Transaction handling for the ledger
//!
//! Implements the UTXO transaction model:
//! - Inputs reference unspent outputs by their identity hash
//! - Outputs send coins and coin hours to an address
//! - The header stores the inner hash (inputs + outputs) and one
//!   recoverable signature per input, all over that inner hash
//!
//! Lifecycle: push inputs and outputs, call [`Transaction::update_header`],
//! then [`Transaction::sign_inputs`] exactly once. A signed transaction
//! refuses further mutation.

use crate::core::error::TransactionError;
use crate::core::unspent::UxBody;
use crate::crypto::{
    sign_hash, sum_double_sha256, sum_sha256, verify_signed_hash, Address, Sha256, Sig,
};
use crate::encoding;
use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// =============================================================================
// Constants
// =============================================================================

/// Inputs (and therefore signatures) must stay below this count
pub const MAX_INPUTS: usize = u16::MAX as usize;

/// Output coins must be a nonzero multiple of this many base units
pub const COIN_QUANTUM: u64 = 1_000_000;

// =============================================================================
// Header / Output
// =============================================================================

/// Transaction header: inner hash and per-input signatures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Hash of inputs and outputs only
    pub hash: Sha256,
    /// One signature per input, positional
    pub sigs: Vec<Sig>,
}

/// Transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// Recipient address
    pub address: Address,
    /// Amount in base units
    pub coins: u64,
    /// Amount of coin hours
    pub hours: u64,
}

// =============================================================================
// Transaction
// =============================================================================

/// A ledger transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    head: TransactionHeader,
    #[serde(rename = "in")]
    inputs: Vec<Sha256>,
    #[serde(rename = "out")]
    outputs: Vec<TransactionOutput>,
}

impl Transaction {
    /// Create an empty, unsigned transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a transaction from raw parts without any checks.
    /// Use [`Transaction::verify`] before trusting the result.
    pub fn from_parts(
        head: TransactionHeader,
        inputs: Vec<Sha256>,
        outputs: Vec<TransactionOutput>,
    ) -> Self {
        Self {
            head,
            inputs,
            outputs,
        }
    }

    pub fn header(&self) -> &TransactionHeader {
        &self.head
    }

    pub fn inputs(&self) -> &[Sha256] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.outputs
    }

    pub fn sigs(&self) -> &[Sig] {
        &self.head.sigs
    }

    pub fn is_signed(&self) -> bool {
        !self.head.sigs.is_empty()
    }

    fn ensure_unsigned(&self) -> Result<(), TransactionError> {
        if self.is_signed() {
            Err(TransactionError::AlreadySigned)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Add an input referencing an unspent output by hash.
    /// Returns the signature index for later signing.
    pub fn push_input(&mut self, ux_out: Sha256) -> Result<u16, TransactionError> {
        self.ensure_unsigned()?;
        if self.inputs.len() >= MAX_INPUTS {
            return Err(TransactionError::InputLimitReached);
        }
        self.inputs.push(ux_out);
        Ok((self.inputs.len() - 1) as u16)
    }

    /// Add an output sending coins and hours to an address.
    /// Amounts are not checked here; see [`Transaction::verify`].
    pub fn push_output(
        &mut self,
        address: Address,
        coins: u64,
        hours: u64,
    ) -> Result<(), TransactionError> {
        self.ensure_unsigned()?;
        self.outputs.push(TransactionOutput {
            address,
            coins,
            hours,
        });
        Ok(())
    }

    /// Store the inner hash of the current inputs and outputs in the header
    pub fn update_header(&mut self) -> Result<(), TransactionError> {
        self.ensure_unsigned()?;
        self.head.hash = self.inner_hash();
        Ok(())
    }

    /// Sign every input. `keys[i]` signs input `i`; every signature is over
    /// the header hash.
    pub fn sign_inputs(&mut self, keys: &[SecretKey]) -> Result<(), TransactionError> {
        self.ensure_unsigned()?;
        if keys.len() != self.inputs.len() {
            return Err(TransactionError::KeyCountMismatch {
                keys: keys.len(),
                inputs: self.inputs.len(),
            });
        }
        // Same ceiling as verify: a transaction with MAX_INPUTS signatures
        // could never verify, so refuse to sign it
        if keys.len() >= MAX_INPUTS {
            return Err(TransactionError::TooManyKeys(keys.len()));
        }
        if keys.is_empty() {
            return Err(TransactionError::NoKeys);
        }
        if self.head.hash != self.inner_hash() {
            return Err(TransactionError::StaleHeader);
        }

        let hash = self.head.hash;
        let sigs = keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                sign_hash(&hash, key)
                    .map_err(|source| TransactionError::InvalidSignature { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.head.sigs = sigs;
        Ok(())
    }

    // =========================================================================
    // Hashing & Encoding
    // =========================================================================

    /// Hash of the inputs followed by the outputs; signatures excluded
    pub fn inner_hash(&self) -> Sha256 {
        let mut bytes = encoding::serialize(&self.inputs);
        bytes.extend_from_slice(&encoding::serialize(&self.outputs));
        sum_sha256(&bytes)
    }

    /// Identity hash over the whole signed transaction (the txid).
    /// Changes when signatures are added.
    pub fn hash(&self) -> Sha256 {
        sum_double_sha256(&self.serialize())
    }

    /// Encoded byte size
    pub fn size(&self) -> usize {
        self.serialize().len()
    }

    /// Encoded size and identity hash from a single encoding pass
    pub fn size_hash(&self) -> (usize, Sha256) {
        let bytes = self.serialize();
        (bytes.len(), sum_double_sha256(&bytes))
    }

    /// Canonical encoding
    pub fn serialize(&self) -> Vec<u8> {
        encoding::serialize(self)
    }

    /// Decode a canonical encoding
    pub fn deserialize(bytes: &[u8]) -> Result<Self, TransactionError> {
        Ok(encoding::deserialize(bytes)?)
    }

    // =========================================================================
    // Amounts
    // =========================================================================

    /// Coin hours sent to outputs. This does not include the fee.
    pub fn output_hours(&self) -> Result<u64, TransactionError> {
        self.outputs
            .iter()
            .try_fold(0u64, |total, out| total.checked_add(out.hours))
            .ok_or(TransactionError::HoursOverflow)
    }

    /// Coins sent to outputs, `None` on overflow
    pub fn output_coins(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |total, out| total.checked_add(out.coins))
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check that the transaction is well formed. Fails fast on the first
    /// broken rule.
    ///
    /// Not checked here, because they need the unspent output set: that the
    /// inputs exist and are unspent, that the key recovered from each
    /// signature owns its input, and that no coins are created.
    ///
    /// The duplicate-output rule derives output identities from
    /// [`Transaction::hash`], which covers the signatures, so it is only
    /// meaningful on a signed transaction. An unsigned draft with inputs never
    /// gets that far: the signature count check rejects it first.
    pub fn verify(&self) -> Result<(), TransactionError> {
        if self.inner_hash() != self.head.hash {
            return Err(TransactionError::InvalidHeaderHash);
        }

        if self.inputs.is_empty() {
            return Err(TransactionError::NoInputs);
        }
        if self.outputs.is_empty() {
            return Err(TransactionError::NoOutputs);
        }

        if self.head.sigs.len() != self.inputs.len() {
            return Err(TransactionError::SignatureCountMismatch {
                signatures: self.head.sigs.len(),
                inputs: self.inputs.len(),
            });
        }
        if self.head.sigs.len() >= MAX_INPUTS {
            return Err(TransactionError::TooManyInputs(self.head.sigs.len()));
        }

        let mut spent = HashSet::with_capacity(self.inputs.len());
        if !self.inputs.iter().all(|input| spent.insert(*input)) {
            return Err(TransactionError::DuplicateSpend);
        }

        let src_transaction = self.hash();
        let mut created = HashSet::with_capacity(self.outputs.len());
        let unique_outputs = self.outputs.iter().all(|out| {
            let body = UxBody {
                src_transaction,
                address: out.address,
                coins: out.coins,
                hours: out.hours,
            };
            created.insert(body.hash())
        });
        if !unique_outputs {
            return Err(TransactionError::DuplicateOutput);
        }

        for (index, sig) in self.head.sigs.iter().enumerate() {
            verify_signed_hash(sig, &self.head.hash)
                .map_err(|source| TransactionError::InvalidSignature { index, source })?;
        }

        // Artificial restriction to prevent spam
        for out in &self.outputs {
            if out.coins == 0 {
                return Err(TransactionError::ZeroCoinOutput);
            }
            if out.coins % COIN_QUANTUM != 0 {
                return Err(TransactionError::CoinsNotQuantized { coins: out.coins });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
