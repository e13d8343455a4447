//! # Mesh Traits
//!
//! This crate provides the capability interface every Mesh wallet backend implements,
//! and the narrow contracts the backends rely on: the CIP-30 extension bridge, the
//! chain-data fetcher and the transaction submitter.
//!
//! ## Core Traits
//!
//! - [`Wallet`] - Address discovery, balance, UTxOs, collateral, signing and submission
//! - [`Fetcher`] - Chain queries used by the embedded backend
//! - [`Submitter`] - Transaction submission used by the embedded backend
//! - [`cip30::WalletApi`] / [`cip30::InjectedWallet`] - The browser extension handshake
//!
//! ## Example
//!
//! ```ignore
//! use mesh_traits::prelude::*;
//!
//! async fn spendable<W: Wallet>(wallet: &W) -> Result<u64> {
//!     wallet.get_lovelace().await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cip30;

use async_trait::async_trait;
use mesh_common::{assets_extended, lovelace, policy_id_assets, policy_ids, Asset, AssetExtended, UTxO};
use serde::{Deserialize, Serialize};

pub use mesh_error::{MeshError, Result};

/// CIP-8 signature over arbitrary data, hex-encoded COSE structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSignature {
    /// `COSE_Sign1` structure
    pub signature: String,
    /// `COSE_Key` of the verification key
    pub key: String,
}

/// An extension found in the injected wallet registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledWallet {
    /// Display name
    pub name: String,
    /// Icon as a data URI
    pub icon: String,
    /// CIP-30 API version reported by the extension
    pub version: String,
}

/// The wallet capability interface.
///
/// Implemented by the extension-backed and the embedded wallets. Addresses are
/// returned in their human-readable encoding, transactions are hex-encoded CBOR.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Network id of the wallet: `0` testnet, `1` mainnet
    async fn get_network_id(&self) -> Result<u8>;

    /// Address that should receive change
    async fn get_change_address(&self) -> Result<String>;

    /// Stake addresses owned by the wallet
    async fn get_reward_addresses(&self) -> Result<Vec<String>>;

    /// Addresses that never appeared on chain
    async fn get_unused_addresses(&self) -> Result<Vec<String>>;

    /// Addresses that appeared on chain
    async fn get_used_addresses(&self) -> Result<Vec<String>>;

    /// Total balance as a flat asset list
    async fn get_balance(&self) -> Result<Vec<Asset>>;

    /// Every UTxO controlled by the wallet
    async fn get_utxos(&self) -> Result<Vec<UTxO>>;

    /// At most `limit` collateral UTxOs; `None` uses the configured maximum
    async fn get_collateral(&self, limit: Option<usize>) -> Result<Vec<UTxO>>;

    /// CIP-8 signature of the UTF-8 `payload` with the key behind `address`
    async fn sign_data(&self, address: &str, payload: &str) -> Result<DataSignature>;

    /// Signs `unsigned_tx` and returns it with the new witnesses merged in.
    ///
    /// `partial_sign = false` lets the backend refuse when it cannot produce every
    /// required signature.
    async fn sign_tx(&self, unsigned_tx: &str, partial_sign: bool) -> Result<String>;

    /// Submits a signed transaction, returning its hash
    async fn submit_tx(&self, tx: &str) -> Result<String>;

    /// Native assets with policy id, name and fingerprint
    async fn get_assets(&self) -> Result<Vec<AssetExtended>> {
        let balance = self.get_balance().await?;
        Ok(assets_extended(&balance)?)
    }

    /// Lovelace held by the wallet
    async fn get_lovelace(&self) -> Result<u64> {
        let balance = self.get_balance().await?;
        Ok(lovelace(&balance))
    }

    /// Native assets under `policy_id`
    async fn get_policy_id_assets(&self, policy_id: &str) -> Result<Vec<AssetExtended>> {
        let balance = self.get_balance().await?;
        Ok(policy_id_assets(&balance, policy_id)?)
    }

    /// Distinct policy ids held by the wallet
    async fn get_policy_ids(&self) -> Result<Vec<String>> {
        let balance = self.get_balance().await?;
        Ok(policy_ids(&balance))
    }
}

/// Chain-data queries.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// UTxOs currently sitting at `address`
    async fn fetch_address_utxos(&self, address: &str) -> Result<Vec<UTxO>>;
}

/// Transaction submission.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submits a signed transaction (hex CBOR), returning its hash
    async fn submit_tx(&self, tx: &str) -> Result<String>;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cip30::{InjectedWallet, WalletApi};
    pub use crate::{DataSignature, Fetcher, InstalledWallet, MeshError, Result, Submitter, Wallet};
}
