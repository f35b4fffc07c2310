//! Error types for encoding and signing.
//!
//! Encoding errors are raised before any signer is contacted; signing errors
//! cover the coordinator and the capabilities it drives. [`ErrorKind`] tells
//! a caller whether to fix its input, inspect a network rejection, or retry.

use crate::amount::AmountError;
use crate::pack::PackError;
use crate::signer::{EthSignerError, L2SignerError};
use crate::tx::TxType;
use crate::version::ProtocolVersion;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller's input was invalid and can be corrected.
    InvalidInput,
    /// The network rejected the request with a structured error.
    Rejected,
    /// The transport failed; the request may be retried.
    Transport,
}

impl ErrorKind {
    /// Returns the `snake_case` name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Rejected => "rejected",
            Self::Transport => "transport",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building a signing payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Amount or fee packing failed.
    #[error(transparent)]
    Pack(#[from] PackError),
    /// An amount could not be rendered for the L1 message.
    #[error(transparent)]
    Amount(#[from] AmountError),
    /// A numeric field is outside its protocol range.
    #[error("{field} {value} is out of range, maximum is {max}")]
    FieldOutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Largest accepted value.
        max: u64,
    },
    /// A value does not fit its fixed-width field.
    #[error("{field} does not fit in {width} bytes")]
    FieldTooLarge {
        /// Field name.
        field: &'static str,
        /// Field width in bytes.
        width: usize,
    },
    /// An address or public-key hash is malformed.
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),
    /// The transaction type has no layout in this protocol version.
    #[error("{tx_type} is not supported by the {version} protocol layout")]
    UnsupportedTransactionType {
        /// Requested transaction type.
        tx_type: TxType,
        /// Protocol version in use.
        version: ProtocolVersion,
    },
}

/// Errors raised while producing signatures.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The payload could not be built.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// No L2 signing capability is configured.
    #[error("an L2 signing key is required for this operation")]
    SigningKeyRequired,
    /// The authorization variant is not one of the protocol's variants.
    #[error("unknown authorization variant '{0}'")]
    UnknownAuthorizationVariant(String),
    /// A signature did not verify against the expected signer.
    #[error("signature verification failed: {0}")]
    SignatureVerificationFailed(String),
    /// The L2 signing capability failed.
    #[error(transparent)]
    L2Signer(#[from] L2SignerError),
    /// The L1 signing capability failed.
    #[error(transparent)]
    EthSigner(#[from] EthSignerError),
    /// The operation needs the account id, which is not known yet.
    #[error("account id is not set")]
    AccountIdRequired,
    /// A batch must contain at least one transaction.
    #[error("batch is empty")]
    EmptyBatch,
}

impl From<PackError> for SigningError {
    fn from(e: PackError) -> Self {
        Self::Encoding(EncodingError::Pack(e))
    }
}

impl SigningError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EthSigner(EthSignerError::Transport(_)) => ErrorKind::Transport,
            Self::Encoding(_)
            | Self::SigningKeyRequired
            | Self::UnknownAuthorizationVariant(_)
            | Self::SignatureVerificationFailed(_)
            | Self::L2Signer(_)
            | Self::EthSigner(_)
            | Self::AccountIdRequired
            | Self::EmptyBatch => ErrorKind::InvalidInput,
        }
    }
}
