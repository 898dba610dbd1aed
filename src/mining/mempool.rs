//! Transaction pool (mempool) for pending transactions
//!
//! Holds verified, unconfirmed transactions until a block takes them:
//! - Stateless verification plus the unspent-set spend checks on admission
//! - Conflict detection against inputs already spent by pooled transactions
//! - Block candidates ordered by fee density and cut to a byte budget

use crate::core::{
    FeeCalculator, SpendError, Transaction, TransactionError, Transactions, UnspentPool,
};
use crate::crypto::Sha256;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

/// Default maximum mempool transaction count
pub const DEFAULT_MEMPOOL_SIZE: usize = 10_000;

// =============================================================================
// Error Types
// =============================================================================

/// Mempool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MempoolError {
    #[error("Transaction {0} already in pool")]
    AlreadyKnown(Sha256),
    #[error("Invalid transaction: {0}")]
    Invalid(#[from] TransactionError),
    #[error("Spend rejected: {0}")]
    Spend(#[from] SpendError),
    #[error("Input {input} already spent by pooled transaction {spender}")]
    DoubleSpend { input: Sha256, spender: Sha256 },
    #[error("Mempool full ({0} transactions)")]
    PoolFull(usize),
}

// =============================================================================
// Mempool Entry
// =============================================================================

/// Entry in the mempool with metadata
#[derive(Debug, Clone)]
pub struct MempoolEntry {
    pub tx: Transaction,
    /// Identity hash
    pub hash: Sha256,
    /// Encoded size in bytes
    pub size: usize,
    /// Fee at admission time
    pub fee: u64,
    pub received: DateTime<Utc>,
}

// =============================================================================
// Mempool
// =============================================================================

/// Memory pool for pending transactions
#[derive(Debug)]
pub struct Mempool {
    /// Entries by identity hash
    entries: HashMap<Sha256, MempoolEntry>,
    /// Hashes in order of arrival
    by_time: Vec<Sha256>,
    /// Spent input -> hash of the pooled transaction spending it
    spends: HashMap<Sha256, Sha256>,
    max_size: usize,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new(DEFAULT_MEMPOOL_SIZE)
    }
}

impl Mempool {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            by_time: Vec::new(),
            spends: HashMap::new(),
            max_size,
        }
    }

    /// Verify and admit a transaction. Returns its identity hash.
    pub fn add_transaction(
        &mut self,
        tx: Transaction,
        unspent: &UnspentPool,
    ) -> Result<Sha256, MempoolError> {
        let (size, hash) = tx.size_hash();

        let result = self.check_admission(&tx, hash, unspent);
        let fee = match result {
            Ok(fee) => fee,
            Err(e) => {
                log::warn!("Rejected transaction {}: {}", hash, e);
                return Err(e);
            }
        };

        for input in tx.inputs() {
            self.spends.insert(*input, hash);
        }
        self.by_time.push(hash);
        self.entries.insert(
            hash,
            MempoolEntry {
                tx,
                hash,
                size,
                fee,
                received: Utc::now(),
            },
        );

        log::debug!("Accepted transaction {} ({} bytes, fee {})", hash, size, fee);
        Ok(hash)
    }

    fn check_admission(
        &self,
        tx: &Transaction,
        hash: Sha256,
        unspent: &UnspentPool,
    ) -> Result<u64, MempoolError> {
        if self.entries.contains_key(&hash) {
            return Err(MempoolError::AlreadyKnown(hash));
        }
        if self.entries.len() >= self.max_size {
            return Err(MempoolError::PoolFull(self.max_size));
        }

        tx.verify()?;
        unspent.verify_transaction_spend(tx)?;

        for input in tx.inputs() {
            if let Some(spender) = self.spends.get(input) {
                return Err(MempoolError::DoubleSpend {
                    input: *input,
                    spender: *spender,
                });
            }
        }

        Ok(unspent.fee(tx).map_err(TransactionError::from)?)
    }

    /// Remove a transaction from the pool
    pub fn remove_transaction(&mut self, hash: &Sha256) -> Option<Transaction> {
        let entry = self.entries.remove(hash)?;
        self.by_time.retain(|h| h != hash);
        for input in entry.tx.inputs() {
            self.spends.remove(input);
        }
        Some(entry.tx)
    }

    /// Remove transactions that are now in a block
    pub fn remove_transactions(&mut self, hashes: &[Sha256]) {
        for hash in hashes {
            self.remove_transaction(hash);
        }
    }

    /// Drop transactions whose inputs are no longer unspent.
    /// Returns the number removed.
    pub fn remove_spent(&mut self, unspent: &UnspentPool) -> usize {
        let stale: Vec<Sha256> = self
            .entries
            .values()
            .filter(|e| e.tx.inputs().iter().any(|input| !unspent.contains(input)))
            .map(|e| e.hash)
            .collect();

        self.remove_transactions(&stale);
        if !stale.is_empty() {
            log::debug!("Removed {} transactions with spent inputs", stale.len());
        }
        stale.len()
    }

    pub fn get(&self, hash: &Sha256) -> Option<&MempoolEntry> {
        self.entries.get(hash)
    }

    pub fn contains(&self, hash: &Sha256) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pooled transactions in arrival order
    pub fn transactions(&self) -> Transactions {
        self.by_time
            .iter()
            .filter_map(|hash| self.entries.get(hash).map(|e| e.tx.clone()))
            .collect()
    }

    /// Select transactions for a block: highest fee density first, then the
    /// longest prefix that fits in `max_block_size` bytes
    pub fn create_block_candidate<C: FeeCalculator + ?Sized>(
        &self,
        calc: &C,
        max_block_size: usize,
    ) -> Transactions {
        let pending = self.len();
        let candidate = self
            .transactions()
            .sort(calc)
            .truncate_bytes_to(max_block_size);

        log::info!(
            "Block candidate: {} of {} pending transactions, {} bytes",
            candidate.len(),
            pending,
            candidate.size()
        );
        candidate
    }

    /// Get mempool statistics
    pub fn stats(&self) -> MempoolStats {
        MempoolStats {
            tx_count: self.entries.len(),
            total_fees: self
                .entries
                .values()
                .fold(0u64, |total, e| total.saturating_add(e.fee)),
            total_size: self.entries.values().map(|e| e.size).sum(),
        }
    }
}

/// Mempool statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolStats {
    pub tx_count: usize,
    pub total_fees: u64,
    pub total_size: usize,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{UxBody, UxOut};
    use crate::crypto::{sum_sha256, KeyPair};

    struct Fixture {
        owner: KeyPair,
        unspent: UnspentPool,
        outputs: Vec<Sha256>,
    }

    fn fixture(count: u8, hours: u64) -> Fixture {
        let owner = KeyPair::generate();
        let mut unspent = UnspentPool::new();
        let outputs = (0..count)
            .map(|i| {
                unspent.add(UxOut {
                    body: UxBody {
                        src_transaction: sum_sha256(&[i]),
                        address: owner.address(0),
                        coins: 10_000_000,
                        hours,
                    },
                })
            })
            .collect();
        Fixture {
            owner,
            unspent,
            outputs,
        }
    }

    fn spend(f: &Fixture, inputs: &[Sha256], hours_kept: u64) -> Transaction {
        let mut tx = Transaction::new();
        for input in inputs {
            tx.push_input(*input).unwrap();
        }
        tx.push_output(f.owner.address(0), 10_000_000, hours_kept)
            .unwrap();
        tx.update_header().unwrap();
        tx.sign_inputs(&vec![f.owner.secret_key; inputs.len()])
            .unwrap();
        tx
    }

    #[test]
    fn test_add_and_remove() {
        let f = fixture(1, 100);
        let mut pool = Mempool::default();
        let tx = spend(&f, &[f.outputs[0]], 40);

        let hash = pool.add_transaction(tx.clone(), &f.unspent).unwrap();
        assert_eq!(hash, tx.hash());
        assert!(pool.contains(&hash));
        assert_eq!(pool.get(&hash).unwrap().fee, 60);
        assert_eq!(
            pool.stats(),
            MempoolStats {
                tx_count: 1,
                total_fees: 60,
                total_size: tx.size()
            }
        );

        assert_eq!(pool.remove_transaction(&hash), Some(tx));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_rejects_duplicates_and_double_spends() {
        let f = fixture(1, 100);
        let mut pool = Mempool::default();
        let tx = spend(&f, &[f.outputs[0]], 40);
        let hash = pool.add_transaction(tx.clone(), &f.unspent).unwrap();

        assert_eq!(
            pool.add_transaction(tx, &f.unspent),
            Err(MempoolError::AlreadyKnown(hash))
        );

        let rival = spend(&f, &[f.outputs[0]], 10);
        assert_eq!(
            pool.add_transaction(rival, &f.unspent),
            Err(MempoolError::DoubleSpend {
                input: f.outputs[0],
                spender: hash
            })
        );
    }

    #[test]
    fn test_rejects_invalid_transactions() {
        let f = fixture(1, 100);
        let mut pool = Mempool::default();

        let mut bad = Transaction::new();
        bad.push_input(f.outputs[0]).unwrap();
        bad.push_output(f.owner.address(0), 1_500_000, 0).unwrap();
        bad.update_header().unwrap();
        bad.sign_inputs(&[f.owner.secret_key]).unwrap();
        assert!(matches!(
            pool.add_transaction(bad, &f.unspent),
            Err(MempoolError::Invalid(TransactionError::CoinsNotQuantized { .. }))
        ));

        let greedy = spend(&f, &[f.outputs[0]], 101);
        assert!(matches!(
            pool.add_transaction(greedy, &f.unspent),
            Err(MempoolError::Spend(SpendError::InsufficientHours { .. }))
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_full() {
        let f = fixture(2, 100);
        let mut pool = Mempool::new(1);
        pool.add_transaction(spend(&f, &[f.outputs[0]], 0), &f.unspent)
            .unwrap();
        assert_eq!(
            pool.add_transaction(spend(&f, &[f.outputs[1]], 0), &f.unspent),
            Err(MempoolError::PoolFull(1))
        );
    }

    #[test]
    fn test_remove_spent() {
        let f = fixture(2, 100);
        let mut unspent = f.unspent.clone();
        let mut pool = Mempool::default();
        let first = pool
            .add_transaction(spend(&f, &[f.outputs[0]], 0), &unspent)
            .unwrap();
        pool.add_transaction(spend(&f, &[f.outputs[1]], 0), &unspent)
            .unwrap();

        unspent.remove(&f.outputs[1]);
        assert_eq!(pool.remove_spent(&unspent), 1);
        assert_eq!(pool.transactions().hashes(), vec![first]);

        // The freed input can be spent again
        pool.remove_transaction(&first);
        assert!(pool
            .add_transaction(spend(&f, &[f.outputs[0]], 5), &unspent)
            .is_ok());
    }

    #[test]
    fn test_block_candidate_prefers_fee_density() {
        let f = fixture(3, 100);
        let mut pool = Mempool::default();
        let low = pool
            .add_transaction(spend(&f, &[f.outputs[0]], 90), &f.unspent)
            .unwrap();
        let high = pool
            .add_transaction(spend(&f, &[f.outputs[1]], 0), &f.unspent)
            .unwrap();
        let mid = pool
            .add_transaction(spend(&f, &[f.outputs[2]], 50), &f.unspent)
            .unwrap();

        let all = pool.create_block_candidate(&f.unspent, usize::MAX);
        assert_eq!(all.hashes(), vec![high, mid, low]);
        assert_eq!(pool.transactions().hashes(), vec![low, high, mid]);

        let one_tx = pool.get(&high).unwrap().size;
        let candidate = pool.create_block_candidate(&f.unspent, one_tx * 2 - 1);
        assert_eq!(candidate.hashes(), vec![high]);
    }
}
