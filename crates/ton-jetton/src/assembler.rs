//! Signed external messages carrying a jetton transfer.
//!
//! The jetton transfer body travels as the payload of one internal message
//! from the owner's wallet contract to the owner's jetton wallet. That
//! internal message is put into a signed wallet transfer, wrapped into an
//! inbound external message and serialized as a Bag of Cells.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ton_cell::{BagOfCells, Cell};
use ton_crypto::Ed25519Keypair;
use ton_wallet::{default_valid_until, Transfer};
use tracing::debug;

use crate::body::{default_query_id, JettonTransferBody};
use crate::comment::encode_comment;
use crate::config::JettonTransferConfig;
use crate::error::{JettonError, JettonResult};
use crate::resolver::JettonWalletResolver;
use crate::types::{JettonWalletAddress, TransferRequest, WalletState};

/// A serialized external message, ready to be broadcast.
#[derive(Debug, Clone)]
pub struct ExternalMessage {
    cell: Arc<Cell>,
    boc: Vec<u8>,
}

impl ExternalMessage {
    fn from_cell(cell: Cell) -> JettonResult<Self> {
        let cell = Arc::new(cell);
        let boc = BagOfCells::new(vec![cell.clone()]).serialize()?;
        Ok(Self { cell, boc })
    }

    /// Root cell of the message.
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    /// BoC bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.boc
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.boc
    }

    /// BoC bytes in standard base64, as HTTP APIs expect them.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.boc)
    }

    /// Message hash, the usual handle for tracking a sent transfer.
    pub fn hash(&self) -> [u8; 32] {
        self.cell.hash()
    }
}

/// Builds signed jetton transfers from wallet state and a signing secret.
#[derive(Debug, Clone, Default)]
pub struct TransferAssembler {
    config: JettonTransferConfig,
}

impl TransferAssembler {
    pub fn new(config: JettonTransferConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JettonTransferConfig {
        &self.config
    }

    /// Sign an already encoded jetton transfer `body` and wrap it for
    /// broadcast.
    ///
    /// `secret` is a 32-byte seed or a 64-byte `seed || public_key`.
    /// `valid_until` defaults to now plus the configured TTL, or to
    /// `u32::MAX` for an undeployed wallet.
    pub fn assemble(
        &self,
        wallet: &WalletState,
        secret: &[u8],
        jetton_wallet: &JettonWalletAddress,
        body: Cell,
        valid_until: Option<u32>,
    ) -> JettonResult<ExternalMessage> {
        let keypair = Ed25519Keypair::from_secret(secret)?;
        check_wallet_address(wallet)?;
        self.sign_and_wrap(wallet, keypair, jetton_wallet, body, valid_until)
    }

    /// Resolve, encode, sign and serialize a complete jetton transfer.
    ///
    /// Everything the caller supplied is validated before any encoding
    /// starts.
    pub fn build_jetton_transfer(
        &self,
        request: &TransferRequest,
        wallet: &WalletState,
        secret: &[u8],
        resolver: &dyn JettonWalletResolver,
    ) -> JettonResult<ExternalMessage> {
        let keypair = Ed25519Keypair::from_secret(secret)?;
        check_wallet_address(wallet)?;
        let master = request
            .token
            .jetton_master
            .as_ref()
            .ok_or(JettonError::MissingTokenAddress)?;
        let decimals = request.token.decimals.unwrap_or(self.config.default_decimals);
        let amount = request.amount.resolve(decimals, &request.token.balance)?;

        let jetton_wallet = resolver.resolve(master, &wallet.address)?;

        let body = JettonTransferBody {
            query_id: request.query_id.unwrap_or_else(default_query_id),
            amount,
            destination: request.recipient.clone(),
            response_destination: request
                .response_destination
                .clone()
                .unwrap_or_else(|| wallet.address.clone()),
            forward_ton_amount: u128::from(self.config.forward_ton_amount),
            forward_payload: encode_comment(request.comment.as_deref())?,
        }
        .encode()?;

        self.sign_and_wrap(wallet, keypair, &jetton_wallet, body, request.valid_until)
    }

    fn sign_and_wrap(
        &self,
        wallet: &WalletState,
        keypair: Ed25519Keypair,
        jetton_wallet: &JettonWalletAddress,
        body: Cell,
        valid_until: Option<u32>,
    ) -> JettonResult<ExternalMessage> {
        if !jetton_wallet.address().is_internal() {
            return Err(JettonError::InvalidAddress(
                "jetton wallet address must be internal".to_string(),
            ));
        }

        let contract = wallet.version.open(
            keypair,
            wallet.address.clone(),
            wallet.subwallet_id,
            wallet.state_init.clone(),
        )?;
        let valid_until = valid_until
            .unwrap_or_else(|| default_valid_until(wallet.seqno, self.config.message_ttl()));

        let transfer = Transfer::new(
            jetton_wallet.address().clone(),
            u128::from(self.config.attached_value),
        )
        .with_payload(body)
        .with_mode(self.config.send_mode());

        let message = ExternalMessage::from_cell(contract.create_transfer(
            wallet.seqno,
            &[transfer],
            valid_until,
        )?)?;

        debug!(
            wallet = %wallet.address,
            jetton_wallet = %jetton_wallet,
            seqno = wallet.seqno,
            hash = %hex::encode(message.hash()),
            bytes = message.as_bytes().len(),
            "assembled jetton transfer"
        );
        Ok(message)
    }
}

fn check_wallet_address(wallet: &WalletState) -> JettonResult<()> {
    if wallet.address.is_internal() {
        Ok(())
    } else {
        Err(JettonError::InvalidAddress(
            "wallet address must be internal".to_string(),
        ))
    }
}

/// [`TransferAssembler::build_jetton_transfer`] with the default
/// configuration.
pub fn build_jetton_transfer(
    request: &TransferRequest,
    wallet: &WalletState,
    secret: &[u8],
    resolver: &dyn JettonWalletResolver,
) -> JettonResult<ExternalMessage> {
    TransferAssembler::default().build_jetton_transfer(request, wallet, secret, resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ton_cell::{CellBuilder, CellSlice, MsgAddress};
    use ton_wallet::WalletVersion;

    use crate::amount::{AmountRequest, TokenAmount};
    use crate::resolver::FixedJettonWallet;
    use crate::types::{JettonMasterAddress, TokenMetadata};

    const SEED: [u8; 32] = [7; 32];

    fn address(byte: u8) -> MsgAddress {
        MsgAddress::Internal {
            workchain: 0,
            address: [byte; 32],
        }
    }

    fn wallet() -> WalletState {
        WalletState::new(WalletVersion::V4R2, address(0x01), 3)
    }

    fn jetton_wallet() -> JettonWalletAddress {
        JettonWalletAddress::new(address(0x02))
    }

    fn body() -> Cell {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x0f8a7ea5).unwrap();
        builder.build().unwrap()
    }

    fn request() -> TransferRequest {
        let token = TokenMetadata::new(TokenAmount::from(10u64))
            .with_jetton_master(JettonMasterAddress::new(address(0x03)));
        TransferRequest {
            recipient: address(0x04),
            amount: AmountRequest::Exact("1".to_string()),
            token,
            comment: None,
            response_destination: None,
            query_id: Some(1),
            valid_until: Some(1_700_000_000),
        }
    }

    #[test]
    fn test_assemble_message_envelope() {
        let message = TransferAssembler::default()
            .assemble(&wallet(), &SEED, &jetton_wallet(), body(), Some(1_700_000_000))
            .unwrap();

        let restored = BagOfCells::deserialize(message.as_bytes()).unwrap();
        let root = restored.single_root().unwrap();
        assert_eq!(root.hash(), message.hash());

        let mut slice = CellSlice::new(root);
        assert_eq!(slice.load_uint(2).unwrap(), 0b10);
        assert_eq!(slice.load_address().unwrap(), MsgAddress::Null);
        assert_eq!(slice.load_address().unwrap(), address(0x01));
        assert_eq!(slice.load_coins_u128().unwrap(), 0);
        assert!(!slice.load_bit().unwrap());
        assert!(slice.load_bit().unwrap());
    }

    #[test]
    fn test_base64_matches_bytes() {
        let message = TransferAssembler::default()
            .assemble(&wallet(), &SEED, &jetton_wallet(), body(), Some(1))
            .unwrap();
        let decoded = STANDARD.decode(message.to_base64()).unwrap();
        assert_eq!(decoded, message.clone().into_bytes());
    }

    #[test]
    fn test_invalid_secret() {
        let secrets: [&[u8]; 4] = [&[], &[1; 31], &[1; 33], &[1; 65]];
        for secret in secrets {
            let err = TransferAssembler::default()
                .assemble(&wallet(), secret, &jetton_wallet(), body(), None)
                .unwrap_err();
            assert!(matches!(err, JettonError::InvalidSecret(_)));
        }
    }

    #[test]
    fn test_secret_layouts_sign_identically() {
        let keypair = Ed25519Keypair::from_private_key(SEED);
        let mut full = SEED.to_vec();
        full.extend_from_slice(&keypair.public_key);

        let assembler = TransferAssembler::default();
        let from_seed = assembler
            .assemble(&wallet(), &SEED, &jetton_wallet(), body(), Some(5))
            .unwrap();
        let from_full = assembler
            .assemble(&wallet(), &full, &jetton_wallet(), body(), Some(5))
            .unwrap();
        assert_eq!(from_seed.as_bytes(), from_full.as_bytes());

        full[40] ^= 1;
        let err = assembler
            .assemble(&wallet(), &full, &jetton_wallet(), body(), Some(5))
            .unwrap_err();
        assert!(matches!(err, JettonError::InvalidSecret(_)));
    }

    #[test]
    fn test_null_jetton_wallet_rejected() {
        let err = TransferAssembler::default()
            .assemble(
                &wallet(),
                &SEED,
                &JettonWalletAddress::new(MsgAddress::Null),
                body(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, JettonError::InvalidAddress(_)));
    }

    #[test]
    fn test_missing_token_address() {
        let mut request = request();
        request.token.jetton_master = None;
        let resolver = FixedJettonWallet::new(jetton_wallet());
        let err = build_jetton_transfer(&request, &wallet(), &SEED, &resolver).unwrap_err();
        assert!(matches!(err, JettonError::MissingTokenAddress));
    }

    #[test]
    fn test_secret_checked_before_amount() {
        let mut request = request();
        request.amount = AmountRequest::Exact("abc".to_string());
        let resolver = FixedJettonWallet::new(jetton_wallet());

        let err = build_jetton_transfer(&request, &wallet(), &[0; 3], &resolver).unwrap_err();
        assert!(matches!(err, JettonError::InvalidSecret(_)));

        let err = build_jetton_transfer(&request, &wallet(), &SEED, &resolver).unwrap_err();
        assert!(matches!(err, JettonError::InvalidAmount(_)));
    }

    #[test]
    fn test_custom_config_values() {
        let config = JettonTransferConfig {
            attached_value: 50_000_000,
            send_mode: 1,
            ..Default::default()
        };
        let message = TransferAssembler::new(config)
            .build_jetton_transfer(
                &request(),
                &wallet(),
                &SEED,
                &FixedJettonWallet::new(jetton_wallet()),
            )
            .unwrap();

        // external -> signed body -> internal message
        let signed = message.cell().reference(0).unwrap();
        let mut slice = CellSlice::new(signed);
        slice.skip_bits(512 + 32 * 3 + 8).unwrap();
        assert_eq!(slice.load_u8().unwrap(), 1);

        let internal = signed.reference(0).unwrap();
        let mut slice = CellSlice::new(internal);
        slice.skip_bits(4).unwrap();
        assert_eq!(slice.load_address().unwrap(), MsgAddress::Null);
        assert_eq!(slice.load_address().unwrap(), address(0x02));
        assert_eq!(slice.load_coins_u128().unwrap(), 50_000_000);
    }
}
