//! Transfer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ton_wallet::SendMode;

/// TON attached to the jetton wallet call, in nanotons (0.64 TON).
pub const DEFAULT_JETTON_TRANSFER_VALUE: u64 = 640_000_000;

/// TON forwarded to the recipient with the transfer notification, in
/// nanotons (0.0001 TON).
pub const DEFAULT_FORWARD_TON_AMOUNT: u64 = 100_000;

/// Decimals assumed when token metadata does not carry them.
pub const DEFAULT_DECIMALS: u8 = 9;

/// Send mode of the outbound message: pay fees separately, ignore errors.
pub const DEFAULT_SEND_MODE: u8 = 3;

/// Lifetime of a signed transfer.
pub const DEFAULT_MESSAGE_TTL: Duration = Duration::from_secs(60);

/// Values the assembler puts into every jetton transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JettonTransferConfig {
    /// TON attached to the jetton wallet call. Default: 0.64 TON.
    pub attached_value: u64,

    /// TON forwarded with the transfer notification. Default: 0.0001 TON.
    pub forward_ton_amount: u64,

    /// Decimals used when the token does not report any. Default: `9`.
    pub default_decimals: u8,

    /// Send mode byte of the outbound message. Default: `3`.
    pub send_mode: u8,

    /// Seconds a signed transfer stays valid. Default: `60`.
    pub message_ttl_secs: u64,
}

impl JettonTransferConfig {
    pub fn send_mode(&self) -> SendMode {
        SendMode::from_bits(self.send_mode)
    }

    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(self.message_ttl_secs)
    }
}

impl Default for JettonTransferConfig {
    fn default() -> Self {
        Self {
            attached_value: DEFAULT_JETTON_TRANSFER_VALUE,
            forward_ton_amount: DEFAULT_FORWARD_TON_AMOUNT,
            default_decimals: DEFAULT_DECIMALS,
            send_mode: DEFAULT_SEND_MODE,
            message_ttl_secs: DEFAULT_MESSAGE_TTL.as_secs(),
        }
    }
}
