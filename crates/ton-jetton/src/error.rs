//! Error types for jetton transfer construction.

use thiserror::Error;
use ton_cell::CellError;
use ton_crypto::Ed25519Error;
use ton_wallet::WalletError;

/// Broad class of a [`JettonError`], for callers that only need to decide
/// whether to ask the user again, give up, or report a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The request itself is malformed.
    InvalidInput,
    /// A value is well formed but does not fit the wire format.
    EncodingLimit,
    /// A collaborator failed to provide required data.
    Upstream,
    /// Unexpected failure inside the encoding stack.
    Internal,
}

/// Errors that can occur while building a jetton transfer.
#[derive(Debug, Error)]
pub enum JettonError {
    /// The amount string is not a non-negative decimal number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// An address could not be parsed or is not usable here.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The signing secret is malformed.
    #[error("Invalid signing secret: {0}")]
    InvalidSecret(String),

    /// A coin field does not fit into VarUInteger 16.
    #[error("Amount does not fit into the coin format of field `{field}`")]
    AmountOverflow { field: &'static str },

    /// A payload does not fit into the space left in its cell.
    #[error("Payload `{field}` needs {bits} bits, only {available} available")]
    PayloadTooLarge {
        field: &'static str,
        bits: usize,
        available: usize,
    },

    /// The token metadata carries no jetton master address.
    #[error("Token metadata has no jetton master address")]
    MissingTokenAddress,

    /// A collaborator (chain state, jetton data) failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Cell operation error.
    #[error("Cell error: {0}")]
    Cell(#[from] CellError),

    /// Wallet contract error.
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
}

impl JettonError {
    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            JettonError::InvalidAmount(_)
            | JettonError::InvalidAddress(_)
            | JettonError::InvalidSecret(_) => ErrorCategory::InvalidInput,
            JettonError::AmountOverflow { .. } | JettonError::PayloadTooLarge { .. } => {
                ErrorCategory::EncodingLimit
            }
            JettonError::MissingTokenAddress | JettonError::Upstream(_) => ErrorCategory::Upstream,
            JettonError::Cell(_) | JettonError::Wallet(_) => ErrorCategory::Internal,
        }
    }

    /// Map a coin-format overflow onto the field being written.
    pub(crate) fn coins(field: &'static str) -> impl FnOnce(CellError) -> JettonError {
        move |err| match err {
            CellError::CoinsOverflow { .. } => JettonError::AmountOverflow { field },
            other => JettonError::Cell(other),
        }
    }
}

impl From<Ed25519Error> for JettonError {
    fn from(err: Ed25519Error) -> Self {
        JettonError::InvalidSecret(err.to_string())
    }
}

/// Result type for jetton operations.
pub type JettonResult<T> = Result<T, JettonError>;
