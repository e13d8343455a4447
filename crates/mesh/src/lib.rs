//! # Mesh - Cardano Wallet SDK
//!
//! Mesh gives applications one wallet interface whether the keys live in a CIP-30
//! browser extension or inside the application itself, together with the codecs
//! needed to talk to the chain: values and assets, Plutus Data, transaction
//! metadata, UTxOs, scripts and witness sets.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `browser` | CIP-30 browser extension wallet |
//! | `app` | Embedded signer and application wallet |
//! | `full` (default) | Both backends |
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! # Server-side signing only
//! mesh = { version = "0.1", default-features = false, features = ["app"] }
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use mesh::prelude::*;
//!
//! let wallet: WalletBackend = BrowserWallet::enable(&registry, "eternl").await?.into();
//! let lovelace = wallet.get_lovelace().await?;
//! let signed = wallet.sign_tx(&unsigned_tx, false).await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

// ============================================================================
// Core re-exports
// ============================================================================

pub use mesh_common as common;
pub use mesh_error as error;
pub use mesh_traits as traits;

// ============================================================================
// Backends
// ============================================================================

/// CIP-30 browser extension wallet
#[cfg(feature = "browser")]
#[cfg_attr(docsrs, doc(cfg(feature = "browser")))]
pub mod browser {
    pub use mesh_browser::*;
}

/// Embedded signer and application wallet
#[cfg(feature = "app")]
#[cfg_attr(docsrs, doc(cfg(feature = "app")))]
pub mod app {
    pub use mesh_app::*;
}

#[cfg(any(feature = "browser", feature = "app"))]
mod backend;

#[cfg(any(feature = "browser", feature = "app"))]
pub use backend::WalletBackend;

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports
///
/// ```ignore
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    pub use mesh_common::{
        Address, Asset, AssetExtended, Data, Metadata, Recipient, UTxO, Value, WalletConfig,
    };
    pub use mesh_error::{ErrorKind, OperationContext};
    pub use mesh_traits::prelude::*;

    #[cfg(feature = "app")]
    pub use mesh_app::{AppWallet, AppWalletKey, AppWalletOptions};
    #[cfg(feature = "browser")]
    pub use mesh_browser::{BrowserWallet, WalletRegistry};

    #[cfg(any(feature = "browser", feature = "app"))]
    pub use crate::WalletBackend;
}

// ============================================================================
// Version information
// ============================================================================

/// Returns the Mesh SDK version
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns the wallet backends compiled in
pub fn enabled_backends() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut backends = Vec::new();

    #[cfg(feature = "browser")]
    backends.push("browser");

    #[cfg(feature = "app")]
    backends.push("app");

    backends
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
        assert!(v.contains('.'));
    }

    #[test]
    fn test_enabled_backends() {
        let backends = enabled_backends();
        assert_eq!(backends.contains(&"browser"), cfg!(feature = "browser"));
        assert_eq!(backends.contains(&"app"), cfg!(feature = "app"));
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let config = WalletConfig::testnet();
        assert!(!config.is_mainnet());
        assert_eq!(Asset::lovelace(1).unit, "lovelace");
    }
}
