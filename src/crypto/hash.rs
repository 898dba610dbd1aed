//! Cryptographic hashing utilities for the ledger
//!
//! Provides the 32-byte SHA-256 digest type used for transaction hashes,
//! output identities and address checksums.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256 as Sha256Hasher};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing a hex digest
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashParseError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid digest length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A SHA-256 digest
///
/// Ordering is byte-lexicographic, which is what transaction sorting relies on
/// for its tie-break.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Sha256(pub [u8; 32]);

impl Sha256 {
    /// The all-zero digest
    pub const ZERO: Sha256 = Sha256([0u8; 32]);

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashParseError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| HashParseError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl AsRef<[u8]> for Sha256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Sha256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Sha256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256({})", self.to_hex())
    }
}

impl FromStr for Sha256 {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// Computes SHA-256 of the input data
pub fn sum_sha256(data: &[u8]) -> Sha256 {
    let mut hasher = Sha256Hasher::new();
    hasher.update(data);
    Sha256(hasher.finalize().into())
}

/// Computes double SHA-256 (SHA-256 of SHA-256)
/// Used for transaction identity hashes and address checksums
pub fn sum_double_sha256(data: &[u8]) -> Sha256 {
    sum_sha256(&sum_sha256(data).0)
}
