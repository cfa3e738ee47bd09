//! Jetton transfer request body.

use std::time::{SystemTime, UNIX_EPOCH};

use ton_cell::{Cell, CellBuilder, MsgAddress};
use tracing::debug;

use crate::amount::TokenAmount;
use crate::error::{JettonError, JettonResult};

/// TEP-74 operation codes.
pub mod opcodes {
    /// Transfer tokens to another address.
    pub const OP_TRANSFER: u32 = 0x0f8a7ea5;
}

pub use opcodes::*;

/// Query ID derived from the current time in milliseconds.
///
/// It only needs to be unique enough to match the `excesses` reply.
pub fn default_query_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Fields of a `transfer` message sent to the sender's jetton wallet.
///
/// ```text
/// transfer#0f8a7ea5
///   query_id:uint64
///   amount:(VarUInteger 16)
///   destination:MsgAddress
///   response_destination:MsgAddress
///   custom_payload:(Maybe ^Cell)
///   forward_ton_amount:(VarUInteger 16)
///   forward_payload:(Either Cell ^Cell)
/// ```
///
/// `custom_payload` is never set and the forward payload is always stored
/// inline (`Either` tag 0).
#[derive(Debug, Clone)]
pub struct JettonTransferBody {
    /// Query ID for response tracking.
    pub query_id: u64,
    /// Tokens to transfer, in smallest units.
    pub amount: TokenAmount,
    /// New owner of the tokens.
    pub destination: MsgAddress,
    /// Receiver of the excess TON.
    pub response_destination: MsgAddress,
    /// TON forwarded to the new owner with the notification, in nanotons.
    pub forward_ton_amount: u128,
    /// Payload forwarded to the new owner; an empty cell for none.
    pub forward_payload: Cell,
}

impl JettonTransferBody {
    /// Encode into a single cell.
    pub fn encode(&self) -> JettonResult<Cell> {
        if !self.destination.is_internal() {
            return Err(JettonError::InvalidAddress(
                "transfer destination must be an internal address".to_string(),
            ));
        }

        let mut builder = CellBuilder::new();

        builder.store_u32(OP_TRANSFER)?;
        builder.store_u64(self.query_id)?;
        builder
            .store_coins(self.amount.as_biguint())
            .map_err(JettonError::coins("amount"))?;
        builder.store_address(&self.destination)?;
        builder.store_address(&self.response_destination)?;

        // custom_payload: nothing
        builder.store_bit(false)?;

        builder
            .store_coins_u128(self.forward_ton_amount)
            .map_err(JettonError::coins("forward_ton_amount"))?;

        // forward_payload: inline
        builder.store_bit(false)?;
        let payload = &self.forward_payload;
        if payload.bit_len() > builder.bits_left()
            || payload.reference_count() > builder.refs_left()
        {
            return Err(JettonError::PayloadTooLarge {
                field: "forward_payload",
                bits: payload.bit_len(),
                available: builder.bits_left(),
            });
        }
        builder.store_cell_contents(payload)?;

        let cell = builder.build()?;
        debug!(
            query_id = self.query_id,
            amount = %self.amount,
            bits = cell.bit_len(),
            "encoded jetton transfer body"
        );
        Ok(cell)
    }
}

/// Encode a jetton transfer body.
pub fn encode_transfer_body(body: &JettonTransferBody) -> JettonResult<Cell> {
    body.encode()
}
