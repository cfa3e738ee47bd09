//! End-to-end jetton transfer construction
//!
//! Every test builds a full external message and takes it apart again from
//! the serialized BoC bytes.

use std::sync::Arc;

use num_bigint::BigUint;
use ton_cell::{BagOfCells, Cell, CellBuilder, CellSlice, MsgAddress};
use ton_crypto::{verify_signature, Ed25519Keypair};
use ton_jetton::{
    derive_wallet_address, AmountRequest, DerivedJettonWallet, ErrorCategory, FixedJettonWallet,
    JettonData, JettonDataSource, JettonError, JettonMasterAddress, JettonResult,
    JettonTransferBody, TokenAmount, TokenMetadata, TransferAssembler, TransferRequest,
    WalletState, OP_TRANSFER,
};
use ton_wallet::{build_state_init, state_init_address, WalletV4R2, WalletVersion};

const SEED: [u8; 32] = [0x5E; 32];
const RECIPIENT: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";
const MASTER: &str = "0:b113a994b5024a16719f69139328eb759596c38a25f59028b146fecdc3621dfe";
const JETTON_WALLET: &str = "0:3333333333333333333333333333333333333333333333333333333333333333";
const WALLET: &str = "0:2222222222222222222222222222222222222222222222222222222222222222";

fn address(s: &str) -> MsgAddress {
    MsgAddress::from_string(s).unwrap()
}

fn wallet(seqno: u32) -> WalletState {
    WalletState::new(WalletVersion::V4R2, address(WALLET), seqno)
}

fn token(balance: &str, decimals: Option<u8>) -> TokenMetadata {
    let mut token = TokenMetadata::new(balance.parse().unwrap())
        .with_jetton_master(MASTER.parse().unwrap());
    token.decimals = decimals;
    token
}

fn request(amount: AmountRequest, token: TokenMetadata) -> TransferRequest {
    TransferRequest::new(RECIPIENT, amount, token)
        .unwrap()
        .with_query_id(1_700_000_000_123)
        .with_valid_until(1_700_000_060)
}

fn fixed_resolver() -> FixedJettonWallet {
    FixedJettonWallet::new(JETTON_WALLET.parse().unwrap())
}

/// Pieces of a decoded v4r2 jetton transfer.
struct Decoded {
    root: Arc<Cell>,
    signed: Arc<Cell>,
    internal: Arc<Cell>,
    body: Arc<Cell>,
}

fn decode(bytes: &[u8]) -> Decoded {
    let boc = BagOfCells::deserialize(bytes).unwrap();
    let root = boc.single_root().unwrap().clone();
    let signed = root.reference(root.reference_count() - 1).unwrap().clone();
    let internal = signed.reference(0).unwrap().clone();
    let body = internal.reference(0).unwrap().clone();
    Decoded {
        root,
        signed,
        internal,
        body,
    }
}

fn body_amount(body: &Cell) -> BigUint {
    let mut slice = CellSlice::new(body);
    assert_eq!(slice.load_u32().unwrap(), OP_TRANSFER);
    slice.load_u64().unwrap();
    slice.load_coins().unwrap()
}

#[test]
fn test_decimal_amount_end_to_end() {
    let request = request(
        AmountRequest::Exact("1.5".to_string()),
        token("5000000000", Some(9)),
    )
    .with_comment("for coffee");
    let message = TransferAssembler::default()
        .build_jetton_transfer(&request, &wallet(7), &SEED, &fixed_resolver())
        .unwrap();
    let decoded = decode(message.as_bytes());

    let mut slice = CellSlice::new(&decoded.body);
    assert_eq!(slice.load_u32().unwrap(), OP_TRANSFER);
    assert_eq!(slice.load_u64().unwrap(), 1_700_000_000_123);
    assert_eq!(slice.load_coins_u128().unwrap(), 1_500_000_000);
    assert_eq!(slice.load_address().unwrap(), address(RECIPIENT));
    assert_eq!(slice.load_address().unwrap(), address(WALLET));
    assert!(!slice.load_bit().unwrap());
    assert_eq!(slice.load_coins_u128().unwrap(), 100_000);
    assert!(!slice.load_bit().unwrap());
    assert_eq!(slice.load_u32().unwrap(), 0);
    assert_eq!(slice.load_bytes(10).unwrap(), b"for coffee");
    assert!(slice.is_empty());
}

#[test]
fn test_max_amount_end_to_end() {
    for decimals in [None, Some(0), Some(6), Some(18)] {
        let request = request(AmountRequest::Max, token("42", decimals));
        let message = TransferAssembler::default()
            .build_jetton_transfer(&request, &wallet(1), &SEED, &fixed_resolver())
            .unwrap();
        assert_eq!(body_amount(&decode(message.as_bytes()).body), BigUint::from(42u8));
    }
}

#[test]
fn test_default_decimals_apply() {
    let request = request(AmountRequest::Exact("2".to_string()), token("0", None));
    let message = TransferAssembler::default()
        .build_jetton_transfer(&request, &wallet(1), &SEED, &fixed_resolver())
        .unwrap();
    assert_eq!(
        body_amount(&decode(message.as_bytes()).body),
        BigUint::from(2_000_000_000u64)
    );
}

#[test]
fn test_signed_message_structure() {
    let request = request(AmountRequest::Exact("0.25".to_string()), token("1", Some(2)));
    let message = TransferAssembler::default()
        .build_jetton_transfer(&request, &wallet(9), &SEED, &fixed_resolver())
        .unwrap();
    let decoded = decode(message.as_bytes());
    assert_eq!(decoded.root.hash(), message.hash());

    // ext_in_msg_info$10 src:addr_none dest import_fee:0 init:nothing body:^
    let mut slice = CellSlice::new(&decoded.root);
    assert_eq!(slice.load_uint(2).unwrap(), 0b10);
    assert_eq!(slice.load_address().unwrap(), MsgAddress::Null);
    assert_eq!(slice.load_address().unwrap(), address(WALLET));
    assert_eq!(slice.load_coins_u128().unwrap(), 0);
    assert!(!slice.load_bit().unwrap());
    assert!(slice.load_bit().unwrap());
    assert_eq!(decoded.root.reference_count(), 1);

    // signature over the unsigned v4r2 body
    let mut slice = CellSlice::new(&decoded.signed);
    let signature: [u8; 64] = slice.load_bytes(64).unwrap().try_into().unwrap();
    let unsigned_bits = slice.load_bytes(14).unwrap();
    let mut unsigned = CellBuilder::new();
    unsigned.store_bytes(&unsigned_bits).unwrap();
    unsigned.store_ref(decoded.internal.clone()).unwrap();
    let unsigned = unsigned.build().unwrap();

    let keypair = Ed25519Keypair::from_private_key(SEED);
    verify_signature(&keypair.public_key, &unsigned.hash(), &signature).unwrap();

    let mut slice = CellSlice::new(&unsigned);
    assert_eq!(slice.load_u32().unwrap(), 698983191);
    assert_eq!(slice.load_u32().unwrap(), 1_700_000_060);
    assert_eq!(slice.load_u32().unwrap(), 9);
    assert_eq!(slice.load_u8().unwrap(), 0);
    assert_eq!(slice.load_u8().unwrap(), 3);

    // internal message to the jetton wallet
    let mut slice = CellSlice::new(&decoded.internal);
    assert!(!slice.load_bit().unwrap());
    assert!(slice.load_bit().unwrap());
    assert!(slice.load_bit().unwrap()); // bounce
    assert!(!slice.load_bit().unwrap());
    assert_eq!(slice.load_address().unwrap(), MsgAddress::Null);
    assert_eq!(slice.load_address().unwrap(), address(JETTON_WALLET));
    assert_eq!(slice.load_coins_u128().unwrap(), 640_000_000);

    // body is exactly the encoded transfer request
    let expected = JettonTransferBody {
        query_id: 1_700_000_000_123,
        amount: TokenAmount::from(25u64),
        destination: address(RECIPIENT),
        response_destination: address(WALLET),
        forward_ton_amount: 100_000,
        forward_payload: Cell::empty(),
    }
    .encode()
    .unwrap();
    assert_eq!(decoded.body.hash(), expected.hash());
}

#[test]
fn test_identical_inputs_give_identical_bytes() {
    let build = |query_id: u64| {
        let request = request(AmountRequest::Exact("3".to_string()), token("0", Some(9)))
            .with_query_id(query_id)
            .with_comment("same");
        TransferAssembler::default()
            .build_jetton_transfer(&request, &wallet(4), &SEED, &fixed_resolver())
            .unwrap()
    };

    let first = build(1);
    let second = build(1);
    assert_eq!(first.as_bytes(), second.as_bytes());

    let third = build(2);
    assert_ne!(first.as_bytes(), third.as_bytes());

    let first_body = decode(first.as_bytes()).body;
    let third_body = decode(third.as_bytes()).body;
    assert_eq!(first_body.bit_len(), third_body.bit_len());
    let differing: Vec<usize> = first_body
        .data()
        .iter()
        .zip(third_body.data())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(differing, vec![11]);
}

#[test]
fn test_amount_overflow_boundary() {
    let limit = BigUint::from(1u8) << 120usize;
    let build = |balance: &BigUint| {
        let request = request(AmountRequest::Max, token(&balance.to_string(), Some(9)));
        TransferAssembler::default().build_jetton_transfer(
            &request,
            &wallet(1),
            &SEED,
            &fixed_resolver(),
        )
    };

    let below = limit.clone() - 1u32;
    let message = build(&below).unwrap();
    assert_eq!(body_amount(&decode(message.as_bytes()).body), below);

    let err = build(&limit).unwrap_err();
    assert!(matches!(err, JettonError::AmountOverflow { field: "amount" }));
    assert_eq!(err.category(), ErrorCategory::EncodingLimit);
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let assembler = TransferAssembler::default();

    let bad_amount = request(AmountRequest::Exact("1.2.3".to_string()), token("1", None));
    let err = assembler
        .build_jetton_transfer(&bad_amount, &wallet(1), &SEED, &fixed_resolver())
        .unwrap_err();
    assert!(matches!(err, JettonError::InvalidAmount(_)));

    let good = request(AmountRequest::Max, token("1", None));
    let err = assembler
        .build_jetton_transfer(&good, &wallet(1), &[0u8; 16], &fixed_resolver())
        .unwrap_err();
    assert!(matches!(err, JettonError::InvalidSecret(_)));

    let err = TransferRequest::new("123", AmountRequest::Max, token("1", None)).unwrap_err();
    assert!(matches!(err, JettonError::InvalidAddress(_)));
    assert_eq!(err.category(), ErrorCategory::InvalidInput);
}

#[test]
fn test_long_comment_does_not_fit() {
    let request = request(AmountRequest::Max, token("1", None)).with_comment("x".repeat(60));
    let err = TransferAssembler::default()
        .build_jetton_transfer(&request, &wallet(1), &SEED, &fixed_resolver())
        .unwrap_err();
    assert!(matches!(
        err,
        JettonError::PayloadTooLarge {
            field: "forward_payload",
            ..
        }
    ));
}

#[test]
fn test_deployment_transfer_carries_state_init() {
    let keypair = Ed25519Keypair::from_private_key(SEED);
    let mut code = CellBuilder::new();
    code.store_u32(0xFF00_F4A4).unwrap();
    let code = Arc::new(code.build().unwrap());
    let data = WalletV4R2::initial_data(&keypair.public_key, 698983191).unwrap();
    let state_init = Arc::new(build_state_init(code, Arc::new(data)).unwrap());
    let wallet_address = state_init_address(0, &state_init);

    let wallet = WalletState::new(WalletVersion::V4R2, wallet_address.clone(), 0)
        .with_state_init(state_init.clone());
    let mut request = request(AmountRequest::Max, token("10", None));
    request.valid_until = None;

    let message = TransferAssembler::default()
        .build_jetton_transfer(&request, &wallet, &SEED, &fixed_resolver())
        .unwrap();
    let decoded = decode(message.as_bytes());
    assert_eq!(decoded.root.reference_count(), 2);
    assert_eq!(decoded.root.reference(0).unwrap().hash(), state_init.hash());

    let mut slice = CellSlice::new(&decoded.signed);
    slice.skip_bits(512 + 32).unwrap();
    assert_eq!(slice.load_u32().unwrap(), u32::MAX);

    // once deployed the state init is left out
    let deployed = WalletState { seqno: 1, ..wallet };
    let message = TransferAssembler::default()
        .build_jetton_transfer(&request, &deployed, &SEED, &fixed_resolver())
        .unwrap();
    assert_eq!(decode(message.as_bytes()).root.reference_count(), 1);
}

#[test]
fn test_v3_wallet_body() {
    let wallet = WalletState::new(WalletVersion::V3R2, address(WALLET), 2).with_subwallet_id(42);
    let request = request(AmountRequest::Max, token("1", None));
    let message = TransferAssembler::default()
        .build_jetton_transfer(&request, &wallet, &SEED, &fixed_resolver())
        .unwrap();

    let decoded = decode(message.as_bytes());
    assert_eq!(decoded.signed.bit_len(), 512 + 32 * 3 + 8);
    let mut slice = CellSlice::new(&decoded.signed);
    slice.skip_bits(512).unwrap();
    assert_eq!(slice.load_u32().unwrap(), 42);
    slice.skip_bits(64).unwrap();
    assert_eq!(slice.load_u8().unwrap(), 3);
}

struct MasterData {
    wallet_code: Arc<Cell>,
}

impl JettonDataSource for MasterData {
    fn get_jetton_data(&self, _master: &JettonMasterAddress) -> JettonResult<JettonData> {
        Ok(JettonData::new(
            TokenAmount::from(21_000_000u64),
            false,
            MsgAddress::Null,
            Arc::new(Cell::empty()),
            self.wallet_code.clone(),
        ))
    }
}

#[test]
fn test_derived_jetton_wallet_is_message_destination() {
    let mut code = CellBuilder::new();
    code.store_u64(0x0123_4567_89AB_CDEF).unwrap();
    let wallet_code = Arc::new(code.build().unwrap());
    let resolver = DerivedJettonWallet::new(MasterData {
        wallet_code: wallet_code.clone(),
    });

    let request = request(AmountRequest::Max, token("5", None));
    let message = TransferAssembler::default()
        .build_jetton_transfer(&request, &wallet(3), &SEED, &resolver)
        .unwrap();

    let expected = derive_wallet_address(
        &MASTER.parse().unwrap(),
        &address(WALLET),
        wallet_code,
    )
    .unwrap();

    let decoded = decode(message.as_bytes());
    let mut slice = CellSlice::new(&decoded.internal);
    slice.skip_bits(4).unwrap();
    slice.load_address().unwrap();
    assert_eq!(&slice.load_address().unwrap(), expected.address());
}

#[test]
fn test_assemble_prebuilt_body() {
    let body = JettonTransferBody {
        query_id: 5,
        amount: TokenAmount::from(1u64),
        destination: address(RECIPIENT),
        response_destination: address(WALLET),
        forward_ton_amount: 0,
        forward_payload: Cell::empty(),
    }
    .encode()
    .unwrap();
    let body_hash = body.hash();

    let message = TransferAssembler::default()
        .assemble(
            &wallet(2),
            &SEED,
            &JETTON_WALLET.parse().unwrap(),
            body,
            Some(100),
        )
        .unwrap();
    assert_eq!(decode(message.as_bytes()).body.hash(), body_hash);
}
