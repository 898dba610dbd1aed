//! Transaction batches
//!
//! Aggregates over a list of transactions and the deterministic ordering
//! used to choose what goes into a block:
//! - fee density (fee per kB of encoded size) descending
//! - identity hash ascending when densities tie
//!
//! Transactions whose fee cannot be computed are left out of the ordering.

use crate::core::error::TransactionError;
use crate::core::fee::{fee_density, FeeCalculator, FeeError};
use crate::core::transaction::Transaction;
use crate::crypto::Sha256;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// =============================================================================
// Transactions
// =============================================================================

/// An ordered list of transactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transactions(pub Vec<Transaction>);

impl Transactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.0.iter()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.0.push(tx);
    }

    pub fn into_inner(self) -> Vec<Transaction> {
        self.0
    }

    /// Sum of every transaction's fee. The first failure aborts the sum.
    pub fn fees<C: FeeCalculator + ?Sized>(&self, calc: &C) -> Result<u64, TransactionError> {
        let mut total = 0u64;
        for tx in &self.0 {
            let fee = calc.fee(tx)?;
            total = total.checked_add(fee).ok_or(FeeError::Overflow)?;
        }
        Ok(total)
    }

    /// Identity hashes, in order
    pub fn hashes(&self) -> Vec<Sha256> {
        self.0.iter().map(Transaction::hash).collect()
    }

    /// Sum of the transactions' encoded sizes. This is not the encoded size of
    /// the list itself, which adds a length prefix.
    pub fn size(&self) -> usize {
        self.0.iter().map(Transaction::size).sum()
    }

    /// Keep the longest prefix whose total size fits in `size` bytes.
    ///
    /// Stops at the first transaction that does not fit, even if a later,
    /// smaller one would. Sort first to prefer high fee transactions.
    pub fn truncate_bytes_to(mut self, size: usize) -> Self {
        let keep = fitting_prefix(self.0.iter().map(Transaction::size), size);
        self.0.truncate(keep);
        self
    }

    /// Sort by fee density, see [`sort_transactions`]
    pub fn sort<C: FeeCalculator + ?Sized>(self, calc: &C) -> Self {
        sort_transactions(self, calc)
    }
}

/// Number of leading items whose sizes sum to at most `budget`
fn fitting_prefix(sizes: impl Iterator<Item = usize>, budget: usize) -> usize {
    let mut total = 0usize;
    let mut count = 0usize;
    for pending in sizes {
        match total.checked_add(pending) {
            Some(next) if next <= budget => total = next,
            _ => break,
        }
        count += 1;
    }
    count
}

impl From<Vec<Transaction>> for Transactions {
    fn from(txns: Vec<Transaction>) -> Self {
        Self(txns)
    }
}

impl FromIterator<Transaction> for Transactions {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Transactions {
    type Item = Transaction;
    type IntoIter = std::vec::IntoIter<Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Transactions {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// A transaction with its precomputed sort keys
#[derive(Debug, Clone)]
pub struct SortEntry {
    pub tx: Transaction,
    /// Fee per kB of encoded size
    pub fee_density: u64,
    /// Identity hash
    pub hash: Sha256,
}

/// Fee density descending, hash ascending when densities tie
fn compare_entries(a: &SortEntry, b: &SortEntry) -> Ordering {
    b.fee_density
        .cmp(&a.fee_density)
        .then_with(|| a.hash.cmp(&b.hash))
}

/// Transactions that can be sorted by fee. Fees are computed once at
/// construction; transactions with no computable fee are dropped there.
#[derive(Debug, Clone, Default)]
pub struct SortableTransactions {
    entries: Vec<SortEntry>,
}

impl SortableTransactions {
    pub fn new<C: FeeCalculator + ?Sized>(txns: Transactions, calc: &C) -> Self {
        let entries = txns
            .into_iter()
            .filter_map(|tx| match calc.fee(&tx) {
                Ok(fee) => {
                    let (size, hash) = tx.size_hash();
                    Some(SortEntry {
                        fee_density: fee_density(fee, size),
                        hash,
                        tx,
                    })
                }
                Err(e) => {
                    log::debug!("Excluding transaction {} from sort: {}", tx.hash(), e);
                    None
                }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SortEntry] {
        &self.entries
    }

    pub fn sort(&mut self) {
        self.entries.sort_by(compare_entries);
    }

    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| compare_entries(&pair[0], &pair[1]) != Ordering::Greater)
    }

    pub fn into_transactions(self) -> Transactions {
        self.entries.into_iter().map(|entry| entry.tx).collect()
    }
}

/// Returns transactions sorted by fee per kB, lowest hash first when tied.
/// Transactions whose fee cannot be computed are excluded.
pub fn sort_transactions<C: FeeCalculator + ?Sized>(txns: Transactions, calc: &C) -> Transactions {
    let mut sortable = SortableTransactions::new(txns, calc);
    sortable.sort();
    sortable.into_transactions()
}
