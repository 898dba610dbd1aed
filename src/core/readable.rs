//! Human readable transaction form
//!
//! JSON-friendly view with hex hashes and signatures and Base58 addresses,
//! used by the CLI. Converting back checks every field.

use crate::core::transaction::{Transaction, TransactionHeader, TransactionOutput};
use crate::core::unspent::UxBody;
use crate::crypto::{Address, AddressError, HashParseError, KeyError, Sha256, Sig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors converting a readable transaction back
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadableError {
    #[error("Invalid hash {field}: {source}")]
    Hash {
        field: &'static str,
        source: HashParseError,
    },
    #[error("Invalid signature {index}: {source}")]
    Signature { index: usize, source: KeyError },
    #[error("Invalid address in output {index}: {source}")]
    Address { index: usize, source: AddressError },
    #[error("Transaction id mismatch: expected {expected}, computed {computed}")]
    TxidMismatch { expected: Sha256, computed: Sha256 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableOutput {
    /// Identity of the unspent output this creates
    pub hash: String,
    pub address: String,
    pub coins: u64,
    pub hours: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableTransaction {
    pub length: usize,
    /// Inner hash stored in the header
    pub hash: String,
    /// Identity hash
    pub txid: String,
    pub sigs: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<ReadableOutput>,
}

impl ReadableTransaction {
    pub fn from_transaction(tx: &Transaction) -> Self {
        let (length, txid) = tx.size_hash();
        Self {
            length,
            hash: tx.header().hash.to_hex(),
            txid: txid.to_hex(),
            sigs: tx.sigs().iter().map(Sig::to_hex).collect(),
            inputs: tx.inputs().iter().map(Sha256::to_hex).collect(),
            outputs: tx
                .outputs()
                .iter()
                .map(|out| ReadableOutput {
                    hash: UxBody {
                        src_transaction: txid,
                        address: out.address,
                        coins: out.coins,
                        hours: out.hours,
                    }
                    .hash()
                    .to_hex(),
                    address: out.address.to_string(),
                    coins: out.coins,
                    hours: out.hours,
                })
                .collect(),
        }
    }

    /// Rebuild the transaction. The `txid` must match the rebuilt one;
    /// `length` and output hashes are informational.
    pub fn to_transaction(&self) -> Result<Transaction, ReadableError> {
        let hash: Sha256 = self.hash.parse().map_err(|source| ReadableError::Hash {
            field: "hash",
            source,
        })?;

        let sigs = self
            .sigs
            .iter()
            .enumerate()
            .map(|(index, s)| {
                s.parse::<Sig>()
                    .map_err(|source| ReadableError::Signature { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let inputs = self
            .inputs
            .iter()
            .map(|s| {
                s.parse::<Sha256>().map_err(|source| ReadableError::Hash {
                    field: "input",
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = self
            .outputs
            .iter()
            .enumerate()
            .map(|(index, out)| {
                let address: Address = out
                    .address
                    .parse()
                    .map_err(|source| ReadableError::Address { index, source })?;
                Ok(TransactionOutput {
                    address,
                    coins: out.coins,
                    hours: out.hours,
                })
            })
            .collect::<Result<Vec<_>, ReadableError>>()?;

        let tx = Transaction::from_parts(TransactionHeader { hash, sigs }, inputs, outputs);

        let expected: Sha256 = self.txid.parse().map_err(|source| ReadableError::Hash {
            field: "txid",
            source,
        })?;
        let computed = tx.hash();
        if computed != expected {
            return Err(ReadableError::TxidMismatch { expected, computed });
        }
        Ok(tx)
    }
}

impl From<&Transaction> for ReadableTransaction {
    fn from(tx: &Transaction) -> Self {
        Self::from_transaction(tx)
    }
}
