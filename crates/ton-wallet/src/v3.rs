//! Wallet V3 (revisions 1 and 2)
//!
//! Both revisions accept the same external message body and keep the same
//! persistent data; they differ only in contract code.

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MsgAddress};
use ton_crypto::Ed25519Keypair;

use crate::error::{WalletError, WalletResult};
use crate::transfer::Transfer;
use crate::wallet::{
    build_state_init, sign_body, state_init_address, store_messages, Wallet, WalletAccount,
    WalletVersion,
};

/// Wallet V3
#[derive(Clone)]
pub struct WalletV3 {
    version: WalletVersion,
    account: WalletAccount,
}

impl WalletV3 {
    /// Bind a keypair to a deployed V3 wallet at `address`.
    pub fn new(version: WalletVersion, keypair: Ed25519Keypair, address: MsgAddress) -> WalletResult<Self> {
        Self::from_account(version, WalletAccount::new(keypair, address)?)
    }

    pub(crate) fn from_account(version: WalletVersion, account: WalletAccount) -> WalletResult<Self> {
        match version {
            WalletVersion::V3R1 | WalletVersion::V3R2 => Ok(Self { version, account }),
            other => Err(WalletError::UnknownVersion(format!("{other} is not a V3 wallet"))),
        }
    }

    /// Derive the wallet from its contract code.
    ///
    /// The address is the hash of the state init built from `code` and the
    /// initial data; the state init is kept for the deployment transfer.
    pub fn from_code(
        version: WalletVersion,
        keypair: Ed25519Keypair,
        workchain: i32,
        subwallet_id: u32,
        code: Arc<Cell>,
    ) -> WalletResult<Self> {
        let data = Self::initial_data(&keypair.public_key, subwallet_id)?;
        let state_init = Arc::new(build_state_init(code, Arc::new(data))?);
        let address = state_init_address(workchain, &state_init);

        let mut account = WalletAccount::new(keypair, address)?;
        account.subwallet_id = subwallet_id;
        account.set_state_init(state_init)?;
        Self::from_account(version, account)
    }

    /// Initial persistent data: `seqno:32 subwallet_id:32 public_key:256`.
    pub fn initial_data(public_key: &[u8; 32], subwallet_id: u32) -> WalletResult<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_u32(0)?;
        builder.store_u32(subwallet_id)?;
        builder.store_bytes(public_key)?;
        builder.build().map_err(Into::into)
    }

    /// Override the subwallet ID.
    pub fn with_subwallet_id(mut self, subwallet_id: u32) -> Self {
        self.account.subwallet_id = subwallet_id;
        self
    }

    /// Attach the state init used for deployment.
    pub fn with_state_init(mut self, state_init: Arc<Cell>) -> WalletResult<Self> {
        self.account.set_state_init(state_init)?;
        Ok(self)
    }
}

impl Wallet for WalletV3 {
    fn version(&self) -> WalletVersion {
        self.version
    }

    fn address(&self) -> &MsgAddress {
        &self.account.address
    }

    fn public_key(&self) -> &[u8; 32] {
        &self.account.keypair.public_key
    }

    fn subwallet_id(&self) -> u32 {
        self.account.subwallet_id
    }

    fn state_init(&self) -> Option<&Arc<Cell>> {
        self.account.state_init.as_ref()
    }

    fn create_transfer_body(
        &self,
        seqno: u32,
        transfers: &[Transfer],
        valid_until: u32,
    ) -> WalletResult<Cell> {
        // subwallet_id:32 valid_until:32 seqno:32 (mode:8 ^message)*
        let mut builder = CellBuilder::new();
        self.account.store_header(&mut builder, seqno, valid_until)?;
        store_messages(&mut builder, transfers)?;
        builder.build().map_err(Into::into)
    }

    fn sign(&self, body: &Cell) -> WalletResult<Cell> {
        sign_body(&self.account.keypair, body)
    }
}
