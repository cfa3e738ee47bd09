//! Core jetton transfer types.
//!
//! Snapshots the caller hands in (wallet state, token metadata, the
//! request itself) and typed addresses for the two jetton contracts.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ton_cell::{Cell, MsgAddress};
use ton_wallet::WalletVersion;

use crate::amount::{AmountRequest, TokenAmount};
use crate::error::{JettonError, JettonResult};

/// Parse a raw or user-friendly address.
pub fn parse_address(s: &str) -> JettonResult<MsgAddress> {
    MsgAddress::from_string(s).map_err(|e| JettonError::InvalidAddress(e.to_string()))
}

/// Jetton Master contract address.
///
/// Wraps a MsgAddress to provide type safety for Jetton Master addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JettonMasterAddress(pub MsgAddress);

impl JettonMasterAddress {
    /// Creates a new JettonMasterAddress.
    pub fn new(address: MsgAddress) -> Self {
        Self(address)
    }

    /// Returns the inner address.
    pub fn address(&self) -> &MsgAddress {
        &self.0
    }

    /// Consumes self and returns the inner address.
    pub fn into_inner(self) -> MsgAddress {
        self.0
    }
}

impl From<MsgAddress> for JettonMasterAddress {
    fn from(addr: MsgAddress) -> Self {
        Self(addr)
    }
}

impl FromStr for JettonMasterAddress {
    type Err = JettonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map(Self)
    }
}

impl fmt::Display for JettonMasterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Jetton Wallet contract address: the sender's per-token wallet that
/// receives the transfer request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JettonWalletAddress(pub MsgAddress);

impl JettonWalletAddress {
    /// Creates a new JettonWalletAddress.
    pub fn new(address: MsgAddress) -> Self {
        Self(address)
    }

    /// Returns the inner address.
    pub fn address(&self) -> &MsgAddress {
        &self.0
    }

    /// Consumes self and returns the inner address.
    pub fn into_inner(self) -> MsgAddress {
        self.0
    }
}

impl From<MsgAddress> for JettonWalletAddress {
    fn from(addr: MsgAddress) -> Self {
        Self(addr)
    }
}

impl FromStr for JettonWalletAddress {
    type Err = JettonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map(Self)
    }
}

impl fmt::Display for JettonWalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Data returned by the `get_jetton_data` get method on Jetton Master contract.
#[derive(Debug, Clone)]
pub struct JettonData {
    /// Total supply of tokens (in smallest units).
    pub total_supply: TokenAmount,
    /// Whether new tokens can be minted.
    pub mintable: bool,
    /// Address of the admin/owner of the Jetton.
    pub admin_address: MsgAddress,
    /// Raw TEP-64 content cell.
    pub content: Arc<Cell>,
    /// Code of the Jetton Wallet contract.
    pub wallet_code: Arc<Cell>,
}

impl JettonData {
    /// Creates a new JettonData.
    pub fn new(
        total_supply: TokenAmount,
        mintable: bool,
        admin_address: MsgAddress,
        content: Arc<Cell>,
        wallet_code: Arc<Cell>,
    ) -> Self {
        Self {
            total_supply,
            mintable,
            admin_address,
            content,
            wallet_code,
        }
    }
}

/// What the caller knows about the token being sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Token decimals; the configured default applies when absent.
    pub decimals: Option<u8>,
    /// Sender's balance in smallest units.
    pub balance: TokenAmount,
    /// Jetton master address.
    pub jetton_master: Option<JettonMasterAddress>,
}

impl TokenMetadata {
    pub fn new(balance: TokenAmount) -> Self {
        Self {
            decimals: None,
            balance,
            jetton_master: None,
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn with_jetton_master(mut self, master: JettonMasterAddress) -> Self {
        self.jetton_master = Some(master);
        self
    }
}

/// Snapshot of the sending wallet account.
#[derive(Debug, Clone)]
pub struct WalletState {
    /// Wallet contract version.
    pub version: WalletVersion,
    /// Wallet account address.
    pub address: MsgAddress,
    /// Current seqno; 0 for a wallet that is not deployed yet.
    pub seqno: u32,
    /// Subwallet ID, if it differs from the workchain default.
    pub subwallet_id: Option<u32>,
    /// State init sent along with the first transfer.
    pub state_init: Option<Arc<Cell>>,
}

impl WalletState {
    pub fn new(version: WalletVersion, address: MsgAddress, seqno: u32) -> Self {
        Self {
            version,
            address,
            seqno,
            subwallet_id: None,
            state_init: None,
        }
    }

    pub fn with_subwallet_id(mut self, subwallet_id: u32) -> Self {
        self.subwallet_id = Some(subwallet_id);
        self
    }

    pub fn with_state_init(mut self, state_init: Arc<Cell>) -> Self {
        self.state_init = Some(state_init);
        self
    }
}

/// A single jetton transfer as requested by the user.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Owner address that receives the tokens.
    pub recipient: MsgAddress,
    /// Amount to send.
    pub amount: AmountRequest,
    /// Token being sent.
    pub token: TokenMetadata,
    /// Optional text comment forwarded to the recipient.
    pub comment: Option<String>,
    /// Where excess TON goes; the sending wallet when absent.
    pub response_destination: Option<MsgAddress>,
    /// Query ID; current Unix time in milliseconds when absent.
    pub query_id: Option<u64>,
    /// Expiry of the signed transfer; derived from the TTL when absent.
    pub valid_until: Option<u32>,
}

impl TransferRequest {
    /// Create a request, parsing the recipient address.
    pub fn new(recipient: &str, amount: AmountRequest, token: TokenMetadata) -> JettonResult<Self> {
        Ok(Self {
            recipient: parse_address(recipient)?,
            amount,
            token,
            comment: None,
            response_destination: None,
            query_id: None,
            valid_until: None,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_response_destination(mut self, address: MsgAddress) -> Self {
        self.response_destination = Some(address);
        self
    }

    pub fn with_query_id(mut self, query_id: u64) -> Self {
        self.query_id = Some(query_id);
        self
    }

    pub fn with_valid_until(mut self, valid_until: u32) -> Self {
        self.valid_until = Some(valid_until);
        self
    }
}
