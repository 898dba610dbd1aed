//! Coin Ledger: the transaction integrity core of a UTXO ledger node
//!
//! This crate provides:
//! - Canonical transaction encoding with inner and identity hashes
//! - Recoverable secp256k1 signatures over the inner hash, one per input
//! - Stateless, fail-fast transaction verification
//! - An unspent output set with spend checks and coin-hour fees
//! - Deterministic fee-density ordering and byte-budget block packing
//!
//! # Example
//!
//! ```rust
//! use coin_ledger::core::{Transaction, UnspentPool, UxBody, UxOut};
//! use coin_ledger::crypto::{sum_sha256, KeyPair};
//! use coin_ledger::mining::Mempool;
//!
//! let owner = KeyPair::generate();
//! let mut unspent = UnspentPool::new();
//! let funds = unspent.add(UxOut {
//!     body: UxBody {
//!         src_transaction: sum_sha256(b"genesis"),
//!         address: owner.address(0),
//!         coins: 10_000_000,
//!         hours: 100,
//!     },
//! });
//!
//! let mut tx = Transaction::new();
//! tx.push_input(funds).unwrap();
//! tx.push_output(KeyPair::generate().address(0), 10_000_000, 60).unwrap();
//! tx.update_header().unwrap();
//! tx.sign_inputs(&[owner.secret_key]).unwrap();
//! assert!(tx.verify().is_ok());
//!
//! let mut mempool = Mempool::default();
//! mempool.add_transaction(tx, &unspent).unwrap();
//! let block = mempool.create_block_candidate(&unspent, 32 * 1024);
//! assert_eq!(block.len(), 1);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod encoding;
pub mod mining;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use core::{
    FeeCalculator, Transaction, TransactionError, Transactions, UnspentPool, COIN_QUANTUM,
};
pub use crypto::{Address, KeyPair, Sha256, Sig};
pub use mining::Mempool;
