//! ECDSA key management for the ledger
//!
//! Provides key pair generation, hash signing, and signature verification
//! with public key recovery on the secp256k1 curve. Signatures carry their
//! recovery id so a verifier can obtain the signing key from the signature
//! and the signed hash alone.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::address::Address;
use super::hash::Sha256;

/// Length of a compact recoverable signature (64 bytes + recovery id)
pub const SIG_LENGTH: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("Signature verification failed")]
    VerificationFailed,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

// =============================================================================
// Signature
// =============================================================================

/// A compact recoverable secp256k1 signature: `r || s || recovery_id`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sig(pub [u8; SIG_LENGTH]);

impl Sig {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; SIG_LENGTH] = bytes.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SIG_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn to_recoverable(&self) -> Result<RecoverableSignature, KeyError> {
        let rec = self.0[SIG_LENGTH - 1];
        let rec_id =
            RecoveryId::from_i32(rec as i32).map_err(|_| KeyError::InvalidRecoveryId(rec))?;
        RecoverableSignature::from_compact(&self.0[..SIG_LENGTH - 1], rec_id)
            .map_err(|_| KeyError::InvalidSignature)
    }
}

impl fmt::Debug for Sig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sig({})", self.to_hex())
    }
}

impl fmt::Display for Sig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Sig {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        Self::from_bytes(&bytes)
    }
}

// serde only derives arrays up to 32 elements; encode as a fixed tuple so the
// canonical encoding carries no length prefix.
impl Serialize for Sig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(SIG_LENGTH)?;
        for byte in &self.0 {
            tup.serialize_element(byte)?;
        }
        tup.end()
    }
}

impl<'de> Deserialize<'de> for Sig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SigVisitor;

        impl<'de> Visitor<'de> for SigVisitor {
            type Value = Sig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} signature bytes", SIG_LENGTH)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Sig, A::Error> {
                let mut bytes = [0u8; SIG_LENGTH];
                for (i, slot) in bytes.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                Ok(Sig(bytes))
            }
        }

        deserializer.deserialize_tuple(SIG_LENGTH, SigVisitor)
    }
}

// =============================================================================
// Key Pair
// =============================================================================

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_secret_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Public key as hex (compressed format)
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Derive the address for this key pair
    pub fn address(&self, version: u8) -> Address {
        Address::from_pubkey(&self.public_key, version)
    }

    pub fn sign(&self, hash: &Sha256) -> Result<Sig, KeyError> {
        sign_hash(hash, &self.secret_key)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_hex())
            .finish_non_exhaustive()
    }
}

/// Sign a 32-byte hash, producing a recoverable signature
pub fn sign_hash(hash: &Sha256, secret_key: &SecretKey) -> Result<Sig, KeyError> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest_slice(hash.as_bytes())?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (rec_id, compact) = signature.serialize_compact();

    let mut bytes = [0u8; SIG_LENGTH];
    bytes[..SIG_LENGTH - 1].copy_from_slice(&compact);
    bytes[SIG_LENGTH - 1] = rec_id.to_i32() as u8;
    Ok(Sig(bytes))
}

/// Recover the public key that produced `sig` over `hash`
pub fn pubkey_from_sig(sig: &Sig, hash: &Sha256) -> Result<PublicKey, KeyError> {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest_slice(hash.as_bytes())?;
    let recoverable = sig.to_recoverable()?;
    secp.recover_ecdsa(&message, &recoverable)
        .map_err(|_| KeyError::InvalidPublicKey)
}

/// Check that `sig` is a valid signature over `hash` by some well-formed key.
///
/// Only the signature itself is checked; which key signed is not.
pub fn verify_signed_hash(sig: &Sig, hash: &Sha256) -> Result<(), KeyError> {
    let public_key = pubkey_from_sig(sig, hash)?;
    verify_signature(&public_key, sig, hash)
}

/// Verify a signature against a known public key
pub fn verify_signature(public_key: &PublicKey, sig: &Sig, hash: &Sha256) -> Result<(), KeyError> {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest_slice(hash.as_bytes())?;
    let standard = sig.to_recoverable()?.to_standard();
    secp.verify_ecdsa(&message, &standard, public_key)
        .map_err(|_| KeyError::VerificationFailed)
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::sum_sha256;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.secret_hex().len(), 64);
        assert_eq!(kp.public_hex().len(), 66);
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let hash = sum_sha256(b"Hello, ledger!");

        let sig = kp.sign(&hash).unwrap();
        assert_eq!(pubkey_from_sig(&sig, &hash).unwrap(), kp.public_key);
        assert!(verify_signed_hash(&sig, &hash).is_ok());
        assert!(verify_signature(&kp.public_key, &sig, &hash).is_ok());
    }

    #[test]
    fn test_signature_over_other_hash_recovers_other_key() {
        let kp = KeyPair::generate();
        let hash = sum_sha256(b"signed");
        let other = sum_sha256(b"not signed");
        let sig = kp.sign(&hash).unwrap();

        match pubkey_from_sig(&sig, &other) {
            Ok(pk) => assert_ne!(pk, kp.public_key),
            Err(_) => {}
        }
        assert!(verify_signature(&kp.public_key, &sig, &other).is_err());
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let hash = sum_sha256(b"data");
        let zero = Sig([0u8; SIG_LENGTH]);
        assert!(verify_signed_hash(&zero, &hash).is_err());

        let mut bad_rec = Sig([1u8; SIG_LENGTH]);
        bad_rec.0[SIG_LENGTH - 1] = 9;
        assert_eq!(
            verify_signed_hash(&bad_rec, &hash),
            Err(KeyError::InvalidRecoveryId(9))
        );
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_secret_hex(&kp1.secret_hex()).unwrap();
        assert_eq!(kp1.public_hex(), kp2.public_hex());
        assert_eq!(kp1.address(0), kp2.address(0));
        assert!(KeyPair::from_secret_hex("not hex").is_err());
    }

    #[test]
    fn test_sig_hex_round_trip() {
        let kp = KeyPair::generate();
        let sig = kp.sign(&sum_sha256(b"x")).unwrap();
        let parsed: Sig = sig.to_string().parse().unwrap();
        assert_eq!(parsed, sig);
        assert!("00".parse::<Sig>().is_err());
    }
}
