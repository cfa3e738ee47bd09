//! Outbound transfer messages

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MsgAddress};

use crate::error::{WalletError, WalletResult};

/// Send mode byte stored next to every outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SendMode(u8);

impl SendMode {
    /// Ordinary message, fees deducted from the value.
    pub const ORDINARY: SendMode = SendMode(0);
    /// Pay forwarding fees separately from the message value.
    pub const PAY_GAS_SEPARATELY: SendMode = SendMode(1);
    /// Ignore errors during the action phase.
    pub const IGNORE_ERRORS: SendMode = SendMode(2);
    /// Destroy the account if its balance reaches zero.
    pub const DESTROY_ON_ZERO_BALANCE: SendMode = SendMode(32);
    /// Carry the remaining value of the inbound message.
    pub const CARRY_ALL_REMAINING_INCOMING_VALUE: SendMode = SendMode(64);
    /// Carry the whole remaining balance.
    pub const CARRY_ALL_REMAINING_BALANCE: SendMode = SendMode(128);

    /// Wrap a raw mode byte.
    pub const fn from_bits(bits: u8) -> Self {
        SendMode(bits)
    }

    /// Raw mode byte.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether all flags of `other` are set.
    pub const fn contains(self, other: SendMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SendMode {
    type Output = SendMode;

    fn bitor(self, rhs: SendMode) -> SendMode {
        SendMode(self.0 | rhs.0)
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transfer to be sent from a wallet
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Destination address
    pub to: MsgAddress,
    /// Amount in nanotons
    pub amount: u128,
    /// Optional message body, always attached by reference
    pub payload: Option<Arc<Cell>>,
    /// Bounce flag
    pub bounce: bool,
    /// Send mode (default: pay gas separately + ignore errors)
    pub mode: SendMode,
}

impl Transfer {
    /// Create a bounceable transfer without a body
    pub fn new(to: MsgAddress, amount: u128) -> Self {
        Self {
            to,
            amount,
            payload: None,
            bounce: true,
            mode: SendMode::PAY_GAS_SEPARATELY | SendMode::IGNORE_ERRORS,
        }
    }

    /// Set payload
    pub fn with_payload(mut self, payload: Cell) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Set bounce flag
    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    /// Set send mode
    pub fn with_mode(mut self, mode: SendMode) -> Self {
        self.mode = mode;
        self
    }

    /// Encode as an internal message cell.
    ///
    /// `int_msg_info$0 ihr_disabled:1 bounce bounced:0 src:addr_none dest
    /// value extra:0 ihr_fee:0 fwd_fee:0 created_lt:0 created_at:0 init:0
    /// body:(Either)`. Source, fees and timestamps are rewritten by the
    /// validator; the body, when present, goes into a reference.
    pub fn to_internal_message(&self) -> WalletResult<Cell> {
        if !self.to.is_internal() {
            return Err(WalletError::InvalidDestination(
                "internal message needs an internal destination".to_string(),
            ));
        }

        let mut builder = CellBuilder::new();

        // int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
        builder.store_bit(false)?;
        builder.store_bit(true)?;
        builder.store_bit(self.bounce)?;
        builder.store_bit(false)?;

        builder.store_address(&MsgAddress::Null)?;
        builder.store_address(&self.to)?;

        // value: CurrencyCollection with an empty extra-currency dict
        builder.store_coins_u128(self.amount)?;
        builder.store_bit(false)?;

        // ihr_fee, fwd_fee
        builder.store_coins_u128(0)?;
        builder.store_coins_u128(0)?;

        // created_lt, created_at
        builder.store_u64(0)?;
        builder.store_u32(0)?;

        // init: nothing
        builder.store_bit(false)?;

        match &self.payload {
            Some(payload) => {
                builder.store_bit(true)?;
                builder.store_ref(payload.clone())?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }

        builder.build().map_err(Into::into)
    }
}
