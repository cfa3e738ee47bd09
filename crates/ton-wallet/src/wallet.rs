//! Wallet trait definition and the pieces every wallet version shares

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use ton_cell::{Cell, CellBuilder, MsgAddress};
use ton_crypto::Ed25519Keypair;
use tracing::{debug, trace};

use crate::error::{WalletError, WalletResult};
use crate::transfer::Transfer;
use crate::v3::WalletV3;
use crate::v4r2::WalletV4R2;

/// Default subwallet ID for workchain 0
pub const DEFAULT_SUBWALLET_ID: u32 = 698983191;

/// Outbound messages a single wallet transfer can carry.
pub const MAX_MESSAGES: usize = 4;

/// Subwallet ID used by wallet apps for a given workchain.
pub fn default_subwallet_id(workchain: i32) -> u32 {
    DEFAULT_SUBWALLET_ID.wrapping_add_signed(workchain)
}

/// `valid_until` for a transfer sent now.
///
/// A wallet that has not been deployed yet (seqno 0) gets `u32::MAX`, as
/// wallet apps do for deployment messages.
pub fn default_valid_until(seqno: u32, ttl: Duration) -> u32 {
    if seqno == 0 {
        return u32::MAX;
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u32::try_from(now.saturating_add(ttl).as_secs()).unwrap_or(u32::MAX)
}

/// Supported wallet contract versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletVersion {
    V3R1,
    V3R2,
    V4R2,
}

impl WalletVersion {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletVersion::V3R1 => "v3r1",
            WalletVersion::V3R2 => "v3r2",
            WalletVersion::V4R2 => "v4r2",
        }
    }

    /// Bind a keypair to an existing wallet account of this version.
    ///
    /// `subwallet_id` defaults to [`default_subwallet_id`] of the address'
    /// workchain. A `state_init`, if given, must hash to the address.
    pub fn open(
        self,
        keypair: Ed25519Keypair,
        address: MsgAddress,
        subwallet_id: Option<u32>,
        state_init: Option<Arc<Cell>>,
    ) -> WalletResult<Box<dyn Wallet>> {
        let mut account = WalletAccount::new(keypair, address)?;
        if let Some(id) = subwallet_id {
            account.subwallet_id = id;
        }
        if let Some(state_init) = state_init {
            account.set_state_init(state_init)?;
        }

        Ok(match self {
            WalletVersion::V3R1 | WalletVersion::V3R2 => Box::new(WalletV3::from_account(self, account)?),
            WalletVersion::V4R2 => Box::new(WalletV4R2::from_account(account)),
        })
    }
}

impl fmt::Display for WalletVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletVersion {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v3r1" => Ok(WalletVersion::V3R1),
            "v3r2" => Ok(WalletVersion::V3R2),
            "v4r2" => Ok(WalletVersion::V4R2),
            _ => Err(WalletError::UnknownVersion(s.to_string())),
        }
    }
}

/// Key, address and deployment data of one wallet account.
#[derive(Clone)]
pub(crate) struct WalletAccount {
    pub(crate) keypair: Ed25519Keypair,
    pub(crate) address: MsgAddress,
    pub(crate) subwallet_id: u32,
    pub(crate) state_init: Option<Arc<Cell>>,
}

impl WalletAccount {
    pub(crate) fn new(keypair: Ed25519Keypair, address: MsgAddress) -> WalletResult<Self> {
        let Some(workchain) = address.workchain() else {
            return Err(WalletError::InvalidDestination(
                "wallet address must be internal".to_string(),
            ));
        };
        Ok(Self {
            keypair,
            address,
            subwallet_id: default_subwallet_id(workchain),
            state_init: None,
        })
    }

    pub(crate) fn set_state_init(&mut self, state_init: Arc<Cell>) -> WalletResult<()> {
        if self.address.hash_part() != Some(&state_init.hash()) {
            return Err(WalletError::StateInitMismatch);
        }
        self.state_init = Some(state_init);
        Ok(())
    }

    /// Store `subwallet_id valid_until seqno`.
    pub(crate) fn store_header(
        &self,
        builder: &mut CellBuilder,
        seqno: u32,
        valid_until: u32,
    ) -> WalletResult<()> {
        builder.store_u32(self.subwallet_id)?;
        builder.store_u32(valid_until)?;
        builder.store_u32(seqno)?;
        Ok(())
    }
}

/// Store `(mode:uint8 ^message)*` for every transfer.
pub(crate) fn store_messages(builder: &mut CellBuilder, transfers: &[Transfer]) -> WalletResult<()> {
    if transfers.len() > MAX_MESSAGES {
        return Err(WalletError::TooManyMessages {
            max: MAX_MESSAGES,
            got: transfers.len(),
        });
    }
    for transfer in transfers {
        builder.store_u8(transfer.mode.bits())?;
        builder.store_ref(Arc::new(transfer.to_internal_message()?))?;
    }
    Ok(())
}

/// `signature:bits512` over the body hash, followed by the body itself.
pub(crate) fn sign_body(keypair: &Ed25519Keypair, body: &Cell) -> WalletResult<Cell> {
    let signature = keypair.sign(&body.hash());
    trace!(body_bits = body.bit_len(), "signing wallet body");

    let mut builder = CellBuilder::new();
    builder.store_bytes(&signature)?;
    builder.store_cell_contents(body)?;
    builder.build().map_err(Into::into)
}

/// Build a `StateInit` with code and data in references.
pub fn build_state_init(code: Arc<Cell>, data: Arc<Cell>) -> WalletResult<Cell> {
    let mut builder = CellBuilder::new();
    builder.store_bit(false)?; // no split_depth
    builder.store_bit(false)?; // no special
    builder.store_bit(true)?; // code
    builder.store_ref(code)?;
    builder.store_bit(true)?; // data
    builder.store_ref(data)?;
    builder.store_bit(false)?; // no library
    builder.build().map_err(Into::into)
}

/// Address of the account deployed with `state_init`.
pub fn state_init_address(workchain: i32, state_init: &Cell) -> MsgAddress {
    MsgAddress::Internal {
        workchain,
        address: state_init.hash(),
    }
}

/// Common wallet interface
pub trait Wallet: Send + Sync {
    /// Contract version
    fn version(&self) -> WalletVersion;

    /// Get wallet address
    fn address(&self) -> &MsgAddress;

    /// Get public key
    fn public_key(&self) -> &[u8; 32];

    /// Subwallet ID stored in every transfer body
    fn subwallet_id(&self) -> u32;

    /// State init attached to the first (seqno 0) transfer, if known
    fn state_init(&self) -> Option<&Arc<Cell>>;

    /// Create unsigned transfer message body
    fn create_transfer_body(
        &self,
        seqno: u32,
        transfers: &[Transfer],
        valid_until: u32,
    ) -> WalletResult<Cell>;

    /// Sign a message body
    fn sign(&self, body: &Cell) -> WalletResult<Cell>;

    /// Wrap a signed body into an inbound external message.
    ///
    /// The state init rides along only with seqno 0.
    fn create_external_message(&self, seqno: u32, signed_body: Cell) -> WalletResult<Cell> {
        let state_init = if seqno == 0 { self.state_init() } else { None };
        debug!(
            version = %self.version(),
            seqno,
            with_state_init = state_init.is_some(),
            "building external message"
        );

        let mut builder = CellBuilder::new();

        // ext_in_msg_info$10 src:addr_none dest import_fee:0
        builder.store_bits(&[true, false])?;
        builder.store_address(&MsgAddress::Null)?;
        builder.store_address(self.address())?;
        builder.store_coins_u128(0)?;

        match state_init {
            Some(si) => {
                builder.store_bit(true)?; // has state_init
                builder.store_bit(true)?; // in a reference
                builder.store_ref(si.clone())?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }

        builder.store_bit(true)?; // body in a reference
        builder.store_ref(Arc::new(signed_body))?;

        builder.build().map_err(Into::into)
    }

    /// Build, sign and wrap a transfer in one go.
    fn create_transfer(
        &self,
        seqno: u32,
        transfers: &[Transfer],
        valid_until: u32,
    ) -> WalletResult<Cell> {
        debug!(
            version = %self.version(),
            seqno,
            messages = transfers.len(),
            valid_until,
            "creating wallet transfer"
        );
        let body = self.create_transfer_body(seqno, transfers, valid_until)?;
        let signed = self.sign(&body)?;
        self.create_external_message(seqno, signed)
    }
}
