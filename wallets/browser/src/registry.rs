//! The injected wallet registry (`window.cardano` in a browser host).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use mesh_common::config::SUPPORTED_WALLETS;
use mesh_traits::cip30::InjectedWallet;
use mesh_traits::InstalledWallet;

/// Extensions injected by the host, keyed the way they register themselves.
#[derive(Clone, Default)]
pub struct WalletRegistry {
    entries: HashMap<String, Arc<dyn InjectedWallet>>,
}

impl WalletRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `wallet` under `key`, replacing any previous entry
    pub fn register(&mut self, key: impl Into<String>, wallet: Arc<dyn InjectedWallet>) {
        self.entries.insert(key.into(), wallet);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_wallet(mut self, key: impl Into<String>, wallet: Arc<dyn InjectedWallet>) -> Self {
        self.register(key, wallet);
        self
    }

    /// Entry registered under `key`
    pub fn get(&self, key: &str) -> Option<&Arc<dyn InjectedWallet>> {
        self.entries.get(key)
    }

    /// Number of registered entries, supported or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered entries under a supported key, in the supported-wallet order
    pub fn supported(&self) -> impl Iterator<Item = &Arc<dyn InjectedWallet>> + '_ {
        SUPPORTED_WALLETS.iter().filter_map(|key| self.entries.get(*key))
    }

    /// Name, icon and API version of every supported entry
    pub fn installed(&self) -> Vec<InstalledWallet> {
        self.supported()
            .map(|wallet| InstalledWallet {
                name: wallet.name().to_string(),
                icon: wallet.icon().to_string(),
                version: wallet.api_version().to_string(),
            })
            .collect()
    }

    /// Supported entry whose display name matches `name`, ignoring case
    pub fn find(&self, name: &str) -> Option<&Arc<dyn InjectedWallet>> {
        self.supported()
            .find(|wallet| wallet.name().to_lowercase() == name.to_lowercase())
    }
}

impl fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("WalletRegistry").field("keys", &keys).finish()
    }
}
