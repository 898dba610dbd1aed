//! Transaction error taxonomy
//!
//! Data failures found by verification and misuse of the construction API
//! are both recoverable results. Each variant belongs to one [`ErrorKind`].

use crate::core::fee::FeeError;
use crate::crypto::KeyError;
use crate::encoding::EncodingError;
use thiserror::Error;

/// Broad class of a [`TransactionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or mismatched counts, too many inputs
    Structural,
    /// Header hash mismatch, undecodable bytes
    Integrity,
    /// Repeated input, colliding output identity
    Duplication,
    /// Signature does not verify
    Signature,
    /// Output amounts outside policy
    Policy,
    /// Fee calculator could not price the transaction
    FeeComputation,
    /// Construction API used out of order
    Misuse,
}

/// Transaction-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    // Structural
    #[error("No inputs")]
    NoInputs,
    #[error("No outputs")]
    NoOutputs,
    #[error("Invalid number of signatures: {signatures} for {inputs} inputs")]
    SignatureCountMismatch { signatures: usize, inputs: usize },
    #[error("Too many signatures and inputs: {0}")]
    TooManyInputs(usize),

    // Integrity
    #[error("Invalid header hash")]
    InvalidHeaderHash,
    #[error("Failed to decode transaction: {0}")]
    Decode(#[from] EncodingError),

    // Duplication
    #[error("Duplicate spend")]
    DuplicateSpend,
    #[error("Duplicate output in transaction")]
    DuplicateOutput,

    // Signature
    #[error("Invalid signature for input {index}: {source}")]
    InvalidSignature { index: usize, source: KeyError },

    // Policy
    #[error("Zero coin output")]
    ZeroCoinOutput,
    #[error("Transaction outputs must be multiple of 1e6 base units, got {coins}")]
    CoinsNotQuantized { coins: u64 },
    #[error("Output hours overflow")]
    HoursOverflow,

    // Fee computation
    #[error("Fee computation failed: {0}")]
    Fee(#[from] FeeError),

    // Misuse
    #[error("Transaction has been signed")]
    AlreadySigned,
    #[error("Invalid number of keys: {keys} for {inputs} inputs")]
    KeyCountMismatch { keys: usize, inputs: usize },
    #[error("Too many keys: {0}")]
    TooManyKeys(usize),
    #[error("No keys")]
    NoKeys,
    #[error("Max transaction inputs reached")]
    InputLimitReached,
    #[error("Header hash is stale; call update_header before signing")]
    StaleHeader,
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        use TransactionError::*;
        match self {
            NoInputs | NoOutputs | SignatureCountMismatch { .. } | TooManyInputs(_) => {
                ErrorKind::Structural
            }
            InvalidHeaderHash | Decode(_) => ErrorKind::Integrity,
            DuplicateSpend | DuplicateOutput => ErrorKind::Duplication,
            InvalidSignature { .. } => ErrorKind::Signature,
            ZeroCoinOutput | CoinsNotQuantized { .. } | HoursOverflow => ErrorKind::Policy,
            Fee(_) => ErrorKind::FeeComputation,
            AlreadySigned
            | KeyCountMismatch { .. }
            | TooManyKeys(_)
            | NoKeys
            | InputLimitReached
            | StaleHeader => ErrorKind::Misuse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(TransactionError::NoInputs.kind(), ErrorKind::Structural);
        assert_eq!(
            TransactionError::InvalidHeaderHash.kind(),
            ErrorKind::Integrity
        );
        assert_eq!(
            TransactionError::Decode(EncodingError::Malformed("x".into())).kind(),
            ErrorKind::Integrity
        );
        assert_eq!(
            TransactionError::DuplicateOutput.kind(),
            ErrorKind::Duplication
        );
        assert_eq!(
            TransactionError::InvalidSignature {
                index: 0,
                source: KeyError::InvalidSignature
            }
            .kind(),
            ErrorKind::Signature
        );
        assert_eq!(
            TransactionError::CoinsNotQuantized { coins: 5 }.kind(),
            ErrorKind::Policy
        );
        assert_eq!(
            TransactionError::Fee(FeeError::Overflow).kind(),
            ErrorKind::FeeComputation
        );
        assert_eq!(TransactionError::AlreadySigned.kind(), ErrorKind::Misuse);
    }
}
