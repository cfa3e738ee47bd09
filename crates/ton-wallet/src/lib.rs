//! TON Wallet implementations
//!
//! This crate builds signed transfers for the classic wallet contracts:
//! - Wallet V3R1 / V3R2: subwallet ID, seqno and expiry
//! - Wallet V4R2: the V3 layout plus an op byte
//!
//! A wallet is bound to an already known account address. Contract code is
//! not bundled; callers that want the deployment state init either pass it
//! in or derive the wallet from the code cell with `from_code`.

pub mod error;
pub mod transfer;
pub mod v3;
pub mod v4r2;
pub mod wallet;

// Re-exports
pub use error::{WalletError, WalletResult};
pub use transfer::{SendMode, Transfer};
pub use v3::WalletV3;
pub use v4r2::WalletV4R2;
pub use wallet::{
    build_state_init, default_subwallet_id, default_valid_until, state_init_address, Wallet,
    WalletVersion, DEFAULT_SUBWALLET_ID, MAX_MESSAGES,
};
