//! Error types for ton-wallet

use thiserror::Error;

/// Wallet error type
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Cell error: {0}")]
    Cell(#[from] ton_cell::CellError),

    #[error("Key error: {0}")]
    Key(#[from] ton_crypto::Ed25519Error),

    #[error("Too many messages: max {max}, got {got}")]
    TooManyMessages { max: usize, got: usize },

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("State init does not hash to the wallet address")]
    StateInitMismatch,

    #[error("Unknown wallet version: {0}")]
    UnknownVersion(String),
}

/// Result type alias
pub type WalletResult<T> = Result<T, WalletError>;
