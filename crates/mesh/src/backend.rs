//! One handle over every wallet backend.

use async_trait::async_trait;
use mesh_common::{Asset, UTxO};
use mesh_error::Result;
use mesh_traits::{DataSignature, Wallet};

#[cfg(feature = "app")]
use mesh_app::AppWallet;
#[cfg(feature = "browser")]
use mesh_browser::BrowserWallet;

/// A wallet of either kind, chosen when it is constructed.
///
/// Application code holds a `WalletBackend` and calls the [`Wallet`] contract on it
/// without caring where the keys live.
#[derive(Debug, Clone)]
pub enum WalletBackend {
    /// CIP-30 browser extension
    #[cfg(feature = "browser")]
    Browser(BrowserWallet),
    /// Embedded signer
    #[cfg(feature = "app")]
    App(AppWallet),
}

impl WalletBackend {
    /// `"browser"` or `"app"`
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "browser")]
            WalletBackend::Browser(_) => "browser",
            #[cfg(feature = "app")]
            WalletBackend::App(_) => "app",
        }
    }
}

#[cfg(feature = "browser")]
impl From<BrowserWallet> for WalletBackend {
    fn from(wallet: BrowserWallet) -> Self {
        WalletBackend::Browser(wallet)
    }
}

#[cfg(feature = "app")]
impl From<AppWallet> for WalletBackend {
    fn from(wallet: AppWallet) -> Self {
        WalletBackend::App(wallet)
    }
}

macro_rules! dispatch {
    ($self:ident, $wallet:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "browser")]
            WalletBackend::Browser($wallet) => $call,
            #[cfg(feature = "app")]
            WalletBackend::App($wallet) => $call,
        }
    };
}

#[async_trait]
impl Wallet for WalletBackend {
    async fn get_network_id(&self) -> Result<u8> {
        dispatch!(self, wallet => wallet.get_network_id().await)
    }

    async fn get_change_address(&self) -> Result<String> {
        dispatch!(self, wallet => wallet.get_change_address().await)
    }

    async fn get_reward_addresses(&self) -> Result<Vec<String>> {
        dispatch!(self, wallet => wallet.get_reward_addresses().await)
    }

    async fn get_unused_addresses(&self) -> Result<Vec<String>> {
        dispatch!(self, wallet => wallet.get_unused_addresses().await)
    }

    async fn get_used_addresses(&self) -> Result<Vec<String>> {
        dispatch!(self, wallet => wallet.get_used_addresses().await)
    }

    async fn get_balance(&self) -> Result<Vec<Asset>> {
        dispatch!(self, wallet => wallet.get_balance().await)
    }

    async fn get_utxos(&self) -> Result<Vec<UTxO>> {
        dispatch!(self, wallet => wallet.get_utxos().await)
    }

    async fn get_collateral(&self, limit: Option<usize>) -> Result<Vec<UTxO>> {
        dispatch!(self, wallet => wallet.get_collateral(limit).await)
    }

    async fn sign_data(&self, address: &str, payload: &str) -> Result<DataSignature> {
        dispatch!(self, wallet => wallet.sign_data(address, payload).await)
    }

    async fn sign_tx(&self, unsigned_tx: &str, partial_sign: bool) -> Result<String> {
        dispatch!(self, wallet => wallet.sign_tx(unsigned_tx, partial_sign).await)
    }

    async fn submit_tx(&self, tx: &str) -> Result<String> {
        dispatch!(self, wallet => wallet.submit_tx(tx).await)
    }
}
