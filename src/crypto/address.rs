//! Ledger addresses
//!
//! An address is a version byte plus `RIPEMD160(SHA256(SHA256(pubkey)))`.
//! Its printable form is Base58 of `version || key || checksum`, where the
//! checksum is the first four bytes of the double SHA-256 of `version || key`.

use ripemd::{Digest, Ripemd160};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::{sum_double_sha256, sum_sha256};

/// Length of the address key (RIPEMD-160 digest)
pub const ADDRESS_KEY_LENGTH: usize = 20;

/// Length of the printable address checksum
pub const ADDRESS_CHECKSUM_LENGTH: usize = 4;

/// Errors parsing or checking an address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58: {0}")]
    InvalidBase58(String),
    #[error("Invalid address length: {0}")]
    InvalidLength(usize),
    #[error("Invalid address checksum")]
    InvalidChecksum,
    #[error("Address version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },
    #[error("Public key does not match address")]
    PublicKeyMismatch,
}

/// A ledger address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address {
    pub version: u8,
    pub key: [u8; ADDRESS_KEY_LENGTH],
}

impl Address {
    /// Derive the address owned by `public_key`
    pub fn from_pubkey(public_key: &PublicKey, version: u8) -> Self {
        let inner = sum_sha256(&public_key.serialize());
        let outer = sum_sha256(inner.as_bytes());

        let mut ripemd = Ripemd160::new();
        ripemd.update(outer.as_bytes());
        let key: [u8; ADDRESS_KEY_LENGTH] = ripemd.finalize().into();

        Self { version, key }
    }

    /// Check that `public_key` derives this address
    pub fn verify(&self, public_key: &PublicKey) -> Result<(), AddressError> {
        if Self::from_pubkey(public_key, self.version) == *self {
            Ok(())
        } else {
            Err(AddressError::PublicKeyMismatch)
        }
    }

    /// Parse and require a specific version byte
    pub fn parse_with_version(s: &str, version: u8) -> Result<Self, AddressError> {
        let address: Address = s.parse()?;
        if address.version != version {
            return Err(AddressError::VersionMismatch {
                expected: version,
                actual: address.version,
            });
        }
        Ok(address)
    }

    fn checksum(&self) -> [u8; ADDRESS_CHECKSUM_LENGTH] {
        let mut body = Vec::with_capacity(1 + ADDRESS_KEY_LENGTH);
        body.push(self.version);
        body.extend_from_slice(&self.key);
        let hash = sum_double_sha256(&body);

        let mut checksum = [0u8; ADDRESS_CHECKSUM_LENGTH];
        checksum.copy_from_slice(&hash.as_bytes()[..ADDRESS_CHECKSUM_LENGTH]);
        checksum
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = Vec::with_capacity(1 + ADDRESS_KEY_LENGTH + ADDRESS_CHECKSUM_LENGTH);
        bytes.push(self.version);
        bytes.extend_from_slice(&self.key);
        bytes.extend_from_slice(&self.checksum());
        f.write_str(&bs58::encode(bytes).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;

        if bytes.len() != 1 + ADDRESS_KEY_LENGTH + ADDRESS_CHECKSUM_LENGTH {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let mut key = [0u8; ADDRESS_KEY_LENGTH];
        key.copy_from_slice(&bytes[1..1 + ADDRESS_KEY_LENGTH]);
        let address = Address {
            version: bytes[0],
            key,
        };

        if address.checksum()[..] != bytes[1 + ADDRESS_KEY_LENGTH..] {
            return Err(AddressError::InvalidChecksum);
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_address_round_trip() {
        let kp = KeyPair::generate();
        let address = kp.address(0);
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_address_verify() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let address = kp.address(0);

        assert!(address.verify(&kp.public_key).is_ok());
        assert_eq!(
            address.verify(&other.public_key),
            Err(AddressError::PublicKeyMismatch)
        );
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let kp = KeyPair::generate();
        let mut bytes = bs58::decode(kp.address(0).to_string()).into_vec().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let tampered = bs58::encode(bytes).into_string();

        assert_eq!(
            tampered.parse::<Address>(),
            Err(AddressError::InvalidChecksum)
        );
        assert!(matches!(
            "0OIl".parse::<Address>(),
            Err(AddressError::InvalidBase58(_))
        ));
        assert!(matches!(
            "1111".parse::<Address>(),
            Err(AddressError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_version_is_checked() {
        let kp = KeyPair::generate();
        let text = kp.address(7).to_string();
        assert!(Address::parse_with_version(&text, 7).is_ok());
        assert_eq!(
            Address::parse_with_version(&text, 0),
            Err(AddressError::VersionMismatch {
                expected: 0,
                actual: 7
            })
        );
    }
}
