//! Wallet V4R2 implementation

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MsgAddress};
use ton_crypto::Ed25519Keypair;

use crate::error::WalletResult;
use crate::transfer::Transfer;
use crate::wallet::{
    build_state_init, sign_body, state_init_address, store_messages, Wallet, WalletAccount,
    WalletVersion,
};

/// Body op for a plain transfer.
const OP_SIMPLE_SEND: u8 = 0;

/// Wallet V4 revision 2
#[derive(Clone)]
pub struct WalletV4R2 {
    account: WalletAccount,
}

impl WalletV4R2 {
    /// Bind a keypair to a deployed V4R2 wallet at `address`.
    pub fn new(keypair: Ed25519Keypair, address: MsgAddress) -> WalletResult<Self> {
        Ok(Self::from_account(WalletAccount::new(keypair, address)?))
    }

    pub(crate) fn from_account(account: WalletAccount) -> Self {
        Self { account }
    }

    /// Derive the wallet from its contract code.
    pub fn from_code(
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
        Ok(Self { account })
    }

    /// Initial persistent data: `seqno:32 subwallet_id:32 public_key:256 plugins:dict`.
    pub fn initial_data(public_key: &[u8; 32], subwallet_id: u32) -> WalletResult<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_u32(0)?;
        builder.store_u32(subwallet_id)?;
        builder.store_bytes(public_key)?;
        builder.store_bit(false)?; // empty plugins dict
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

impl Wallet for WalletV4R2 {
    fn version(&self) -> WalletVersion {
        WalletVersion::V4R2
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
        // subwallet_id:32 valid_until:32 seqno:32 op:8 (mode:8 ^message)*
        let mut builder = CellBuilder::new();
        self.account.store_header(&mut builder, seqno, valid_until)?;
        builder.store_u8(OP_SIMPLE_SEND)?;
        store_messages(&mut builder, transfers)?;
        builder.build().map_err(Into::into)
    }

    fn sign(&self, body: &Cell) -> WalletResult<Cell> {
        sign_body(&self.account.keypair, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ton_cell::CellSlice;

    fn code() -> Arc<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_u32(0xFF00F4A4).unwrap();
        builder.store_u8(4).unwrap();
        Arc::new(builder.build().unwrap())
    }

    fn destination() -> MsgAddress {
        MsgAddress::Internal {
            workchain: 0,
            address: [0x22; 32],
        }
    }

    #[test]
    fn test_transfer_body_has_op() {
        let keypair = Ed25519Keypair::generate();
        let wallet = WalletV4R2::from_code(keypair, 0, 698983191, code()).unwrap();
        let body = wallet
            .create_transfer_body(3, &[Transfer::new(destination(), 5)], 1_700_000_000)
            .unwrap();
        assert_eq!(body.bit_len(), 32 * 3 + 8 + 8);

        let mut slice = CellSlice::new(&body);
        slice.skip_bits(96).unwrap();
        assert_eq!(slice.load_u8().unwrap(), OP_SIMPLE_SEND);
        assert_eq!(slice.load_u8().unwrap(), 3);
    }

    #[test]
    fn test_deployment_message_carries_state_init() {
        let keypair = Ed25519Keypair::generate();
        let wallet = WalletV4R2::from_code(keypair, 0, 698983191, code()).unwrap();
        let transfers = [Transfer::new(destination(), 5)];

        let deploy = wallet.create_transfer(0, &transfers, u32::MAX).unwrap();
        assert_eq!(deploy.reference_count(), 2);

        let regular = wallet.create_transfer(1, &transfers, u32::MAX).unwrap();
        assert_eq!(regular.reference_count(), 1);

        let mut slice = CellSlice::new(&regular);
        assert_eq!(slice.load_uint(2).unwrap(), 0b10);
        assert_eq!(slice.load_address().unwrap(), MsgAddress::Null);
        assert_eq!(&slice.load_address().unwrap(), wallet.address());
        assert_eq!(slice.load_coins_u128().unwrap(), 0);
        assert!(!slice.load_bit().unwrap()); // no state init
        assert!(slice.load_bit().unwrap()); // body in ref
        assert_eq!(slice.bits_left(), 0);
    }

    #[test]
    fn test_different_versions_share_address_binding() {
        let keypair = Ed25519Keypair::from_private_key([3; 32]);
        let v4 = WalletV4R2::from_code(keypair.clone(), 0, 698983191, code()).unwrap();
        let v3 = crate::WalletV3::from_code(WalletVersion::V3R2, keypair, 0, 698983191, code()).unwrap();
        // Same code, different initial data layout.
        assert_ne!(v3.address(), v4.address());
    }
}
