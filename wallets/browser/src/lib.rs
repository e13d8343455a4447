//! # Mesh Browser Wallet
//!
//! Wallet backend that talks to a CIP-30 browser extension. Extensions are looked up
//! in an explicit [`WalletRegistry`] rather than an ambient global, so a host can hand
//! in whatever it injected (and tests can hand in mocks).
//!
//! ## Example
//!
//! ```ignore
//! use mesh_browser::{BrowserWallet, WalletRegistry};
//! use mesh_traits::Wallet;
//!
//! let registry: WalletRegistry = host_registry();
//! for wallet in BrowserWallet::get_installed_wallets(&registry) {
//!     println!("{} {}", wallet.name, wallet.version);
//! }
//!
//! let wallet = BrowserWallet::enable(&registry, "eternl").await?;
//! let signed = wallet.sign_tx(&unsigned_tx, false).await?;
//! let tx_hash = wallet.submit_tx(&signed).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod registry;
mod wallet;

pub use registry::WalletRegistry;
pub use wallet::BrowserWallet;
