//! # Mesh App Wallet
//!
//! Embedded signer for the Mesh Cardano SDK. Keys come from a BIP39 mnemonic, a
//! bech32 root key or a pair of cardano-cli signing keys; they are kept encrypted
//! (PBKDF2 + AES-256-GCM) and only decrypted for the duration of a call.
//!
//! - [`EmbeddedWallet`]: password-gated account derivation (CIP-1852) and signing
//! - [`AppWallet`]: the [`Wallet`](mesh_traits::Wallet) contract on top of an
//!   embedded signer, a [`Fetcher`](mesh_traits::Fetcher) and a
//!   [`Submitter`](mesh_traits::Submitter)
//!
//! ## Example
//!
//! ```ignore
//! use mesh_app::{AppWallet, AppWalletKey, AppWalletOptions};
//! use mesh_traits::Wallet;
//!
//! let words = AppWallet::brew(256)?;
//! let wallet = AppWallet::new(AppWalletOptions::new(fetcher, submitter, AppWalletKey::Mnemonic(words)))?;
//!
//! let address = wallet.get_payment_address(0)?;
//! let signed = wallet.sign_tx(&unsigned_tx, false).await?;
//! let tx_hash = wallet.submit_tx(&signed).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod account;
mod app;
pub mod cose;
mod embedded;
mod keys;
mod vault;

pub use account::{Account, COIN_TYPE, PURPOSE};
pub use app::{AppWallet, AppWalletKey, AppWalletOptions, DEFAULT_PASSWORD, DEFAULT_STRENGTH};
pub use cose::CoseSign1;
pub use embedded::EmbeddedWallet;
pub use keys::{generate_mnemonic, AccountKey, PLACEHOLDER_STAKE_KEY};
pub use vault::EncryptedKey;
