//! Canonical binary encoding
//!
//! One fixed bincode configuration used for everything that is hashed,
//! signed, stored or broadcast:
//! - fixed-width little-endian integers
//! - sequences prefixed with a u64 element count
//! - fixed-size arrays and tuples without a prefix
//! - struct fields in declaration order
//! - trailing bytes rejected on decode
//!
//! Identical values always encode to identical bytes, and decoding accepts
//! exactly the bytes that encoding produces.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Upper bound on any decoded value, so hostile length prefixes cannot
/// trigger huge allocations
pub const MAX_ENCODED_SIZE: u64 = 32 * 1024 * 1024;

/// Decode errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Malformed encoding: {0}")]
    Malformed(String),
}

impl From<bincode::Error> for EncodingError {
    fn from(err: bincode::Error) -> Self {
        EncodingError::Malformed(err.to_string())
    }
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_ENCODED_SIZE)
        .reject_trailing_bytes()
}

/// Encode a value canonically
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    // Every type in this crate has a fixed shape and no fallible Serialize impl,
    // and the values hashed here are far below the size limit.
    options()
        .serialize(value)
        .expect("canonical encoding of an in-memory value cannot fail")
}

/// Decode a value, rejecting malformed or trailing bytes
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EncodingError> {
    Ok(options().deserialize(bytes)?)
}

/// Encoded length of a value without keeping the bytes
pub fn serialized_size<T: Serialize + ?Sized>(value: &T) -> usize {
    serialize(value).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        a: u8,
        b: u64,
        items: Vec<[u8; 2]>,
    }

    #[test]
    fn test_layout_is_fixed() {
        let value = Sample {
            a: 7,
            b: 1,
            items: vec![[0xAA, 0xBB]],
        };
        let bytes = serialize(&value);
        assert_eq!(
            bytes,
            vec![7, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0xAA, 0xBB]
        );
        assert_eq!(serialized_size(&value), bytes.len());
        assert_eq!(deserialize::<Sample>(&bytes).unwrap(), value);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = serialize(&Sample {
            a: 1,
            b: 2,
            items: vec![],
        });
        bytes.push(0);
        assert!(deserialize::<Sample>(&bytes).is_err());
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = serialize(&Sample {
            a: 1,
            b: 2,
            items: vec![[1, 2], [3, 4]],
        });
        assert!(deserialize::<Sample>(&bytes[..bytes.len() - 1]).is_err());
        assert!(deserialize::<Sample>(&[]).is_err());
    }

    #[test]
    fn test_hostile_length_prefix_rejected() {
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&2u64.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(deserialize::<Sample>(&bytes).is_err());
    }
}
