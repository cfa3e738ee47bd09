//! # ton-jetton
//!
//! TEP-74 Jetton (fungible token) transfers for TON.
//!
//! Sending jettons means asking one's own jetton wallet contract to move
//! tokens. This crate turns a user-level request (recipient, amount such as
//! `"1.5"` or `max`, optional comment) into the signed external message a
//! wallet broadcasts:
//!
//! 1. [`AmountRequest::resolve`] turns the amount into smallest units.
//! 2. [`encode_comment`] builds the optional text comment payload.
//! 3. [`JettonTransferBody::encode`] serializes the `transfer` request.
//! 4. [`TransferAssembler`] puts the body into a signed wallet transfer
//!    addressed to the sender's jetton wallet and serializes it as a BoC.
//!
//! The sender's jetton wallet is found through a [`JettonWalletResolver`]:
//! either a known address ([`FixedJettonWallet`]) or one derived from the
//! master's `get_jetton_data` ([`DerivedJettonWallet`]).
//!
//! ## Operation Codes
//!
//! - `transfer` (0x0f8a7ea5): Transfer tokens to another address
//! - text comment (0x00000000): Forward payload carrying a UTF-8 comment
//!
//! ## Example
//!
//! ```rust
//! use ton_cell::MsgAddress;
//! use ton_jetton::{
//!     build_jetton_transfer, FixedJettonWallet, TokenMetadata, TransferRequest, WalletState,
//! };
//! use ton_wallet::WalletVersion;
//!
//! let token = TokenMetadata::new("5000000000".parse().unwrap())
//!     .with_decimals(9)
//!     .with_jetton_master("0:1111111111111111111111111111111111111111111111111111111111111111".parse().unwrap());
//! let request = TransferRequest::new(
//!     "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c",
//!     "1.5".parse().unwrap(),
//!     token,
//! )
//! .unwrap()
//! .with_comment("thanks!");
//!
//! let wallet_address = MsgAddress::from_string(
//!     "0:2222222222222222222222222222222222222222222222222222222222222222",
//! )
//! .unwrap();
//! let wallet = WalletState::new(WalletVersion::V4R2, wallet_address, 12);
//! let resolver = FixedJettonWallet::new(
//!     "0:3333333333333333333333333333333333333333333333333333333333333333".parse().unwrap(),
//! );
//!
//! let message = build_jetton_transfer(&request, &wallet, &[1u8; 32], &resolver).unwrap();
//! assert!(!message.as_bytes().is_empty());
//! ```
//!
//! ## References
//!
//! - [TEP-74: Fungible tokens (Jettons) standard](https://github.com/ton-blockchain/TEPs/blob/master/text/0074-jettons-standard.md)

pub mod amount;
pub mod assembler;
pub mod body;
pub mod comment;
pub mod config;
pub mod error;
pub mod resolver;
pub mod types;

// Re-export main types
pub use amount::{parse_decimal, AmountRequest, TokenAmount};
pub use assembler::{build_jetton_transfer, ExternalMessage, TransferAssembler};
pub use body::{default_query_id, encode_transfer_body, JettonTransferBody};
pub use comment::{encode_comment, MAX_COMMENT_BYTES};
pub use config::{
    JettonTransferConfig, DEFAULT_DECIMALS, DEFAULT_FORWARD_TON_AMOUNT,
    DEFAULT_JETTON_TRANSFER_VALUE, DEFAULT_MESSAGE_TTL, DEFAULT_SEND_MODE,
};
pub use error::{ErrorCategory, JettonError, JettonResult};
pub use resolver::{
    derive_wallet_address, jetton_wallet_data, DerivedJettonWallet, FixedJettonWallet,
    JettonDataSource, JettonWalletAddressSource, JettonWalletResolver, QueriedJettonWallet,
};
pub use types::{
    parse_address, JettonData, JettonMasterAddress, JettonWalletAddress, TokenMetadata,
    TransferRequest, WalletState,
};

// Re-export operation codes
pub use body::opcodes::OP_TRANSFER;
pub use comment::OP_COMMENT;

/// Encode a transfer body with a fresh query ID and an optional comment.
///
/// # Example
///
/// ```rust
/// use ton_jetton::{transfer_jetton_body, TokenAmount};
/// use ton_cell::MsgAddress;
///
/// let sender_response = MsgAddress::Internal {
///     workchain: 0,
///     address: [0x12; 32],
/// };
/// let to = MsgAddress::Internal {
///     workchain: 0,
///     address: [0x34; 32],
/// };
///
/// let body = transfer_jetton_body(
///     &sender_response,
///     &to,
///     TokenAmount::from(1_000_000_000u64), // 1 token (9 decimals)
///     100_000,                             // 0.0001 TON forward
///     Some("Payment"),
/// ).unwrap();
/// assert_eq!(body.reference_count(), 0);
/// ```
pub fn transfer_jetton_body(
    response_destination: &ton_cell::MsgAddress,
    to: &ton_cell::MsgAddress,
    amount: TokenAmount,
    forward_ton: u128,
    comment: Option<&str>,
) -> JettonResult<ton_cell::Cell> {
    JettonTransferBody {
        query_id: default_query_id(),
        amount,
        destination: to.clone(),
        response_destination: response_destination.clone(),
        forward_ton_amount: forward_ton,
        forward_payload: encode_comment(comment)?,
    }
    .encode()
}
