//! # Mesh Common
//!
//! The Cardano data model shared by every Mesh wallet backend, and the codecs between
//! it and the ledger's CBOR encodings.
//!
//! ## Modules
//!
//! - [`asset`] - `(unit, quantity)` assets and the multi-asset [`Value`]
//! - [`data`] - Plutus [`Data`] and its canonical encoding
//! - [`metadata`] - transaction [`Metadata`]
//! - [`script`] - Plutus / native scripts and script hashes
//! - [`utxo`] and [`recipient`] - unspent outputs and the outputs built for payments
//! - [`action`] - redeemers
//! - [`witness`] and [`transaction`] - witness sets, signature merge, transactions
//! - [`address`] - bech32 / base58 addresses
//! - [`collateral`] - collateral selection
//! - [`config`] - network constants, protocol parameters and wallet configuration
//!
//! ## Example
//!
//! ```
//! use mesh_common::{from_value, to_value, Asset};
//!
//! let unit = format!("{}{}", "7eae28af2208be856f7a119668ae52a49b73725e326dc16579dcc373", hex::encode("Mesh"));
//! let assets = vec![Asset::lovelace(5_000_000), Asset::new(unit, 1)];
//!
//! let value = to_value(&assets).unwrap();
//! assert_eq!(from_value(&value), assets);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod address;
pub mod asset;
pub mod cbor;
pub mod collateral;
pub mod config;
pub mod data;
pub mod hash;
pub mod metadata;
pub mod recipient;
pub mod script;
pub mod transaction;
pub mod utxo;
pub mod witness;

pub use action::{from_tx_redeemer, to_tx_redeemer, Action, Budget, RedeemerTag};
pub use address::{Address, AddressKind};
pub use asset::{
    assets_extended, fingerprint, from_value, lovelace, merge_assets, policy_id_assets, policy_ids,
    to_value, Asset, AssetExtended, MultiAsset, Value,
};
pub use collateral::select_collateral;
pub use config::{Protocol, WalletConfig, LOVELACE, MAINNET_NETWORK_ID, TESTNET_NETWORK_ID};
pub use data::{from_plutus_data, hash_data, to_plutus_data, Data, PlutusData};
pub use metadata::{from_tx_metadatum, to_tx_metadatum, Metadata, MetadataMap};
pub use recipient::{to_tx_build_output, Recipient, RecipientDatum};
pub use script::{
    from_native_script_cbor, from_script, to_native_script_cbor, to_script, NativeScript,
    PlutusScript, PlutusVersion, Script,
};
pub use transaction::{Transaction, TransactionBody};
pub use utxo::{
    from_tx_unspent_output, from_tx_unspent_output_hex, to_tx_unspent_output, DatumOption,
    TransactionInput, TransactionOutput, TxUnspentOutput, UTxO, UtxoInput, UtxoOutput,
};
pub use witness::{merge_signatures, VKeyWitness, WitnessSet};

pub use mesh_error::{CodecError, MeshError};
