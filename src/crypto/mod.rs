//! Cryptographic primitives for the ledger
//!
//! This module provides:
//! - SHA-256 and double SHA-256 digests
//! - ECDSA key management with public key recovery (secp256k1)
//! - Address derivation and Base58Check encoding

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{Address, AddressError};
pub use hash::{sum_double_sha256, sum_sha256, HashParseError, Sha256};
pub use keys::{
    pubkey_from_sig, public_key_from_hex, sign_hash, verify_signature, verify_signed_hash,
    KeyError, KeyPair, Sig, SIG_LENGTH,
};
