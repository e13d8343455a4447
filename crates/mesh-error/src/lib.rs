//! # Mesh Error
//!
//! This crate provides the error types shared by every crate of the Mesh Cardano
//! wallet SDK. Errors fall into four families that callers are expected to treat
//! differently:
//!
//! - **Codec**: malformed or unsupported binary / Data / Metadata shapes. Fatal to the
//!   call, never retried.
//! - **Backend rejection**: the extension user declined, the extension refused, or the
//!   embedded key could not be decrypted.
//! - **Insufficient resource**: collateral or UTxO selection cannot meet a minimum.
//!   Fund the wallet rather than retrying.
//! - **Network**: submission or fetch failures. Safe to retry; nothing in the SDK
//!   retries on its own.
//!
//! ## Example
//!
//! ```
//! use mesh_error::{ErrorKind, MeshError, OperationContext};
//!
//! fn sign() -> Result<(), MeshError> {
//!     Err(MeshError::DecryptionFailed)
//! }
//!
//! let err = sign().during("signTx").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::BackendRejection);
//! assert_eq!(err.operation(), Some("signTx"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// Failures raised while converting between wire encodings and application types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input is not valid hexadecimal
    #[error("Hex decode error: {0}")]
    Hex(String),

    /// Input is not well-formed CBOR, or does not have the expected shape
    #[error("CBOR error: {0}")]
    Cbor(String),

    /// A Plutus Data item uses a tag or major type that has no Data representation
    #[error("Unsupported Plutus Data kind: {0}")]
    UnsupportedDataKind(String),

    /// A value has no representation as transaction metadata
    #[error("Unsupported metadatum: {0}")]
    UnsupportedMetadatum(String),

    /// Invalid address encoding
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The offending address (as given by the caller)
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Asset unit that is neither `lovelace` nor policy id followed by an asset name
    #[error("Invalid asset unit '{0}'")]
    InvalidUnit(String),

    /// Malformed script
    #[error("Invalid script: {0}")]
    InvalidScript(String),

    /// Malformed key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl From<hex::FromHexError> for CodecError {
    fn from(err: hex::FromHexError) -> Self {
        CodecError::Hex(err.to_string())
    }
}

impl From<minicbor::decode::Error> for CodecError {
    fn from(err: minicbor::decode::Error) -> Self {
        CodecError::Cbor(err.to_string())
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for CodecError {
    fn from(err: minicbor::encode::Error<E>) -> Self {
        CodecError::Cbor(err.to_string())
    }
}

/// The main error type for Mesh wallet operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Wire-format failure
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The backend refused the request (user declined, extension error, ...)
    #[error("{operation} rejected: {reason}")]
    BackendRejection {
        /// Operation that was refused, e.g. `signTx`
        operation: String,
        /// Reason reported by the backend
        reason: String,
    },

    /// Wrong password, or tampered ciphertext
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Account index outside of the wallet's configured account space
    #[error("Account index {index} is out of range (limit {limit})")]
    AccountOutOfRange {
        /// Requested index
        index: u32,
        /// Exclusive upper bound
        limit: u32,
    },

    /// Collateral selection cannot reach the required amount
    #[error("Collateral unavailable: required {required} lovelace, available {available}")]
    CollateralUnavailable {
        /// Required lovelace
        required: u64,
        /// Lovelace reachable within the input limit
        available: u64,
    },

    /// Submission or fetch failure
    #[error("Network error during {operation}: {reason}")]
    Network {
        /// Operation in flight
        operation: String,
        /// Error reason
        reason: String,
    },

    /// No injected wallet matches the requested name
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    /// Key derivation failed
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Feature not supported by this backend
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// An error annotated with the operation it surfaced from
    #[error("An error occurred during {operation}: {source}")]
    Operation {
        /// Operation name, e.g. `signTx`
        operation: &'static str,
        /// Underlying error
        #[source]
        source: Box<MeshError>,
    },
}

/// Convenient Result type using MeshError
pub type Result<T> = std::result::Result<T, MeshError>;

/// Error families used to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Malformed or unsupported encoding
    Codec,
    /// Backend declined or key could not be unlocked
    BackendRejection,
    /// Not enough funds / collateral
    InsufficientResource,
    /// Transport failure, retryable by the caller
    Network,
    /// Caller supplied an argument outside the accepted domain
    InvalidInput,
}

impl MeshError {
    /// Creates a backend rejection for `operation`
    pub fn rejected(operation: impl Into<String>, reason: impl ToString) -> Self {
        MeshError::BackendRejection {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a network error for `operation`
    pub fn network(operation: impl Into<String>, reason: impl ToString) -> Self {
        MeshError::Network {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the family of this error, looking through operation annotations
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeshError::Codec(_) => ErrorKind::Codec,
            MeshError::BackendRejection { .. }
            | MeshError::DecryptionFailed
            | MeshError::WalletNotFound(_)
            | MeshError::NotSupported(_) => ErrorKind::BackendRejection,
            MeshError::CollateralUnavailable { .. } => ErrorKind::InsufficientResource,
            MeshError::Network { .. } => ErrorKind::Network,
            MeshError::AccountOutOfRange { .. } | MeshError::KeyDerivation(_) => {
                ErrorKind::InvalidInput
            }
            MeshError::Operation { source, .. } => source.kind(),
        }
    }

    /// Returns the outermost operation annotation, if any
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            MeshError::Operation { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Returns the error with every operation annotation removed
    pub fn root(&self) -> &MeshError {
        match self {
            MeshError::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if the caller may safely retry the operation
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

/// Extension trait annotating failures with the operation they surfaced from.
pub trait OperationContext<T> {
    /// Wraps the error (if any) in [`MeshError::Operation`]
    fn during(self, operation: &'static str) -> Result<T>;
}

impl<T, E: Into<MeshError>> OperationContext<T> for std::result::Result<T, E> {
    fn during(self, operation: &'static str) -> Result<T> {
        self.map_err(|e| {
            let source = e.into();
            // Keep a single annotation per operation when calls nest.
            if source.operation() == Some(operation) {
                source
            } else {
                MeshError::Operation {
                    operation,
                    source: Box::new(source),
                }
            }
        })
    }
}

impl From<hex::FromHexError> for MeshError {
    fn from(err: hex::FromHexError) -> Self {
        MeshError::Codec(err.into())
    }
}

impl From<minicbor::decode::Error> for MeshError {
    fn from(err: minicbor::decode::Error) -> Self {
        MeshError::Codec(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodecError::InvalidAddress {
            address: "addr1xyz".to_string(),
            reason: "bad checksum".to_string(),
        };
        assert!(err.to_string().contains("addr1xyz"));
        assert!(err.to_string().contains("bad checksum"));
    }

    #[test]
    fn test_error_kind() {
        let err = MeshError::CollateralUnavailable { required: 5_000_000, available: 1 };
        assert_eq!(err.kind(), ErrorKind::InsufficientResource);

        let err: MeshError = CodecError::UnsupportedDataKind("tag 99".into()).into();
        assert_eq!(err.kind(), ErrorKind::Codec);

        assert_eq!(MeshError::DecryptionFailed.kind(), ErrorKind::BackendRejection);
    }

    #[test]
    fn test_retryable() {
        let err = MeshError::network("submitTx", "connection reset");
        assert!(err.is_retryable());

        let err = MeshError::rejected("signTx", "user declined");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_operation_context_keeps_kind() {
        let result: std::result::Result<(), CodecError> =
            Err(CodecError::Cbor("unexpected end of input".into()));

        let err = result.during("signTx").unwrap_err();
        assert_eq!(err.operation(), Some("signTx"));
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert!(err.to_string().contains("signTx"));
        assert!(matches!(err.root(), MeshError::Codec(CodecError::Cbor(_))));
    }

    #[test]
    fn test_operation_context_not_doubled() {
        let result: Result<()> = Err(MeshError::DecryptionFailed);
        let err = result.during("signData").during("signData").unwrap_err();
        match err {
            MeshError::Operation { source, .. } => {
                assert!(matches!(*source, MeshError::DecryptionFailed))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_hex_conversion() {
        let err: MeshError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, MeshError::Codec(CodecError::Hex(_))));
    }
}
