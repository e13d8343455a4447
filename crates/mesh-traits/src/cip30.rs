//! The CIP-30 dApp connector contract.
//!
//! An extension registers an [`InjectedWallet`] under its key in the host's wallet
//! registry. Enabling it yields a [`WalletApi`] whose methods exchange hex-encoded
//! CBOR: addresses as raw address bytes, values and UTxOs as their ledger encodings,
//! and witness sets rather than whole transactions from `sign_tx`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{DataSignature, Result};

/// The capability object returned by a successful `enable` handshake.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Network id of the connected account
    async fn get_network_id(&self) -> Result<u8>;

    /// Balance as a CBOR `value`
    async fn get_balance(&self) -> Result<String>;

    /// Change address bytes
    async fn get_change_address(&self) -> Result<String>;

    /// Reward address bytes
    async fn get_reward_addresses(&self) -> Result<Vec<String>>;

    /// Unused address bytes
    async fn get_unused_addresses(&self) -> Result<Vec<String>>;

    /// Used address bytes
    async fn get_used_addresses(&self) -> Result<Vec<String>>;

    /// `transaction_unspent_output` items; `None` when the extension reports nothing
    async fn get_utxos(&self) -> Result<Option<Vec<String>>>;

    /// `experimental.getCollateral`
    async fn get_collateral(&self) -> Result<Option<Vec<String>>>;

    /// Signs hex `payload` with the key behind the hex `address` bytes
    async fn sign_data(&self, address: &str, payload: &str) -> Result<DataSignature>;

    /// Returns the witness set produced for `tx`
    async fn sign_tx(&self, tx: &str, partial_sign: bool) -> Result<String>;

    /// Submits `tx`, returning its hash
    async fn submit_tx(&self, tx: &str) -> Result<String>;
}

/// A registry entry published by an extension.
#[async_trait]
pub trait InjectedWallet: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Icon as a data URI
    fn icon(&self) -> &str;

    /// CIP-30 API version
    fn api_version(&self) -> &str;

    /// Asks the user to connect; fails when the user declines
    async fn enable(&self) -> Result<Arc<dyn WalletApi>>;
}
