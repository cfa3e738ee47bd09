//! Jetton wallet address resolution.
//!
//! Tokens never leave the owner's wallet contract directly: the transfer
//! request goes to the owner's jetton wallet for the given master. Callers
//! either know that address already ([`FixedJettonWallet`]), ask the
//! master's `get_wallet_address` get method ([`QueriedJettonWallet`]), or
//! derive it from `get_jetton_data` ([`DerivedJettonWallet`]).
//!
//! Only the master's own answer is authoritative for every jetton.
//! Derivation assumes the reference wallet data layout and gives a wrong
//! address for masters whose wallets store anything else.

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MsgAddress};
use ton_wallet::{build_state_init, state_init_address};
use tracing::debug;

use crate::error::{JettonError, JettonResult};
use crate::types::{JettonData, JettonMasterAddress, JettonWalletAddress};

/// Finds the jetton wallet an owner holds for a master.
pub trait JettonWalletResolver: Send + Sync {
    fn resolve(
        &self,
        master: &JettonMasterAddress,
        owner: &MsgAddress,
    ) -> JettonResult<JettonWalletAddress>;
}

/// Source of `get_jetton_data` results, typically a lite client or an
/// HTTP API. Failures should be reported as [`JettonError::Upstream`].
pub trait JettonDataSource: Send + Sync {
    fn get_jetton_data(&self, master: &JettonMasterAddress) -> JettonResult<JettonData>;
}

impl<S: JettonDataSource + ?Sized> JettonDataSource for Arc<S> {
    fn get_jetton_data(&self, master: &JettonMasterAddress) -> JettonResult<JettonData> {
        (**self).get_jetton_data(master)
    }
}

/// Source of `get_wallet_address(owner)` results from a jetton master.
pub trait JettonWalletAddressSource: Send + Sync {
    fn get_wallet_address(
        &self,
        master: &JettonMasterAddress,
        owner: &MsgAddress,
    ) -> JettonResult<JettonWalletAddress>;
}

impl<S: JettonWalletAddressSource + ?Sized> JettonWalletAddressSource for Arc<S> {
    fn get_wallet_address(
        &self,
        master: &JettonMasterAddress,
        owner: &MsgAddress,
    ) -> JettonResult<JettonWalletAddress> {
        (**self).get_wallet_address(master, owner)
    }
}

/// Resolver for a jetton wallet address the caller already knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedJettonWallet(pub JettonWalletAddress);

impl FixedJettonWallet {
    pub fn new(address: JettonWalletAddress) -> Self {
        Self(address)
    }
}

impl JettonWalletResolver for FixedJettonWallet {
    fn resolve(
        &self,
        _master: &JettonMasterAddress,
        _owner: &MsgAddress,
    ) -> JettonResult<JettonWalletAddress> {
        Ok(self.0.clone())
    }
}

/// Resolver that asks the master contract for the owner's wallet.
///
/// Any source failure is reported as [`JettonError::Upstream`], as is an
/// answer that is not an internal address.
#[derive(Debug, Clone)]
pub struct QueriedJettonWallet<S> {
    source: S,
}

impl<S: JettonWalletAddressSource> QueriedJettonWallet<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: JettonWalletAddressSource> JettonWalletResolver for QueriedJettonWallet<S> {
    fn resolve(
        &self,
        master: &JettonMasterAddress,
        owner: &MsgAddress,
    ) -> JettonResult<JettonWalletAddress> {
        if !master.address().is_internal() || !owner.is_internal() {
            return Err(JettonError::InvalidAddress(
                "jetton master and owner must be internal addresses".to_string(),
            ));
        }
        let address = self
            .source
            .get_wallet_address(master, owner)
            .map_err(|err| match err {
                JettonError::Upstream(msg) => JettonError::Upstream(msg),
                other => JettonError::Upstream(format!("get_wallet_address failed: {other}")),
            })?;
        if !address.address().is_internal() {
            return Err(JettonError::Upstream(format!(
                "get_wallet_address returned a non-internal address for {owner}"
            )));
        }
        debug!(%master, %owner, jetton_wallet = %address, "queried jetton wallet address");
        Ok(address)
    }
}

/// Resolver that derives the address of a reference TEP-74 jetton wallet
/// from the master's wallet code.
///
/// Only valid for wallets whose data is exactly [`jetton_wallet_data`].
/// Masters with custom wallet storage need [`QueriedJettonWallet`].
#[derive(Debug, Clone)]
pub struct DerivedJettonWallet<S> {
    source: S,
}

impl<S: JettonDataSource> DerivedJettonWallet<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: JettonDataSource> JettonWalletResolver for DerivedJettonWallet<S> {
    fn resolve(
        &self,
        master: &JettonMasterAddress,
        owner: &MsgAddress,
    ) -> JettonResult<JettonWalletAddress> {
        let data = self.source.get_jetton_data(master)?;
        let address = derive_wallet_address(master, owner, data.wallet_code)?;
        debug!(%master, %owner, jetton_wallet = %address, "derived jetton wallet address");
        Ok(address)
    }
}

/// Initial data of a reference jetton wallet:
/// `balance:Coins owner:MsgAddress master:MsgAddress wallet_code:^Cell`.
pub fn jetton_wallet_data(
    owner: &MsgAddress,
    master: &JettonMasterAddress,
    wallet_code: Arc<Cell>,
) -> JettonResult<Cell> {
    let mut builder = CellBuilder::new();
    builder.store_coins_u128(0)?;
    builder.store_address(owner)?;
    builder.store_address(master.address())?;
    builder.store_ref(wallet_code)?;
    Ok(builder.build()?)
}

/// Address of `owner`'s jetton wallet, in the master's workchain.
pub fn derive_wallet_address(
    master: &JettonMasterAddress,
    owner: &MsgAddress,
    wallet_code: Arc<Cell>,
) -> JettonResult<JettonWalletAddress> {
    let Some(workchain) = master.address().workchain() else {
        return Err(JettonError::InvalidAddress(
            "jetton master address must be internal".to_string(),
        ));
    };
    if !owner.is_internal() {
        return Err(JettonError::InvalidAddress(
            "jetton wallet owner must be internal".to_string(),
        ));
    }

    let data = jetton_wallet_data(owner, master, wallet_code.clone())?;
    let state_init = build_state_init(wallet_code, Arc::new(data))?;
    Ok(JettonWalletAddress::new(state_init_address(workchain, &state_init)))
}
