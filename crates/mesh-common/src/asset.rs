//! Assets and the ledger's multi-asset value.
//!
//! Application code works with flat `(unit, quantity)` pairs; the wire form nests
//! quantities under policy id and asset name, with lovelace kept apart.

use std::collections::BTreeMap;

use bech32::{Bech32, Hrp};
use mesh_error::CodecError;
use minicbor::data::Type;
use minicbor::Decoder;
use serde::{Deserialize, Serialize};

use crate::cbor::{self, VecEncoder};
use crate::config::{LOVELACE, POLICY_ID_LENGTH};
use crate::hash::{blake2b_160, Hash28};

/// Policy id → asset name → quantity
pub type MultiAsset = BTreeMap<Hash28, BTreeMap<Vec<u8>, u64>>;

/// A single `(unit, quantity)` entry of a balance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// `lovelace`, or hex policy id followed by hex asset name
    pub unit: String,
    /// Amount, serialized as a decimal string
    #[serde(with = "quantity")]
    pub quantity: u64,
}

impl Asset {
    /// Creates an asset entry
    pub fn new(unit: impl Into<String>, quantity: u64) -> Self {
        Self { unit: unit.into(), quantity }
    }

    /// Lovelace entry
    pub fn lovelace(quantity: u64) -> Self {
        Self::new(LOVELACE, quantity)
    }

    /// Returns true for the base currency
    pub fn is_lovelace(&self) -> bool {
        self.unit == LOVELACE
    }
}

/// A native asset with its unit split apart and its CIP-14 fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetExtended {
    /// Full unit
    pub unit: String,
    /// Hex policy id
    pub policy_id: String,
    /// Asset name, decoded as UTF-8 where possible
    pub asset_name: String,
    /// CIP-14 fingerprint
    pub fingerprint: String,
    /// Amount
    #[serde(with = "quantity")]
    pub quantity: u64,
}

/// The ledger's value: a lovelace amount and optional native assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    /// Lovelace
    pub coin: u64,
    /// Native assets
    pub multiasset: MultiAsset,
}

impl Value {
    /// Pure-lovelace value
    pub fn coin(coin: u64) -> Self {
        Self { coin, multiasset: MultiAsset::new() }
    }

    /// Returns true if the value carries no native assets
    pub fn is_pure_lovelace(&self) -> bool {
        self.multiasset.values().all(|assets| assets.values().all(|q| *q == 0))
    }

    /// Decodes `coin / [coin, multiasset]`
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        match d.datatype()? {
            Type::Array | Type::ArrayIndef => {
                let len = d.array()?;
                let coin = d.u64()?;
                let entries = cbor::decode_map(
                    d,
                    cbor::decode_fixed::<28>,
                    |d| cbor::decode_map(d, |d| Ok(d.bytes()?.to_vec()), cbor::decode_u64),
                )?;
                cbor::end_array(d, len, 2)?;
                let mut multiasset = MultiAsset::new();
                for (policy, assets) in entries {
                    let slot = multiasset.entry(policy).or_default();
                    for (name, quantity) in assets {
                        let q = slot.entry(name).or_default();
                        *q = q.saturating_add(quantity);
                    }
                }
                Ok(Self { coin, multiasset })
            }
            _ => Ok(Self::coin(d.u64()?)),
        }
    }

    /// Encodes as a bare coin when there are no native assets
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        if self.multiasset.is_empty() {
            e.u64(self.coin)?;
            return Ok(());
        }
        e.array(2)?.u64(self.coin)?;
        e.map(self.multiasset.len() as u64)?;
        for (policy, assets) in &self.multiasset {
            e.bytes(policy)?.map(assets.len() as u64)?;
            for (name, quantity) in assets {
                e.bytes(name)?.u64(*quantity)?;
            }
        }
        Ok(())
    }

    /// Decodes a complete CBOR value
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CodecError> {
        cbor::decode_all(bytes, Self::decode)
    }

    /// Decodes a hex CBOR value
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        Self::from_cbor(&cbor::decode_hex(s)?)
    }

    /// CBOR bytes
    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        cbor::encode_to_vec(|e| self.encode(e))
    }

    /// CBOR hex
    pub fn to_hex(&self) -> Result<String, CodecError> {
        Ok(hex::encode(self.to_cbor()?))
    }
}

/// Flattens a value into assets, lovelace first.
pub fn from_value(value: &Value) -> Vec<Asset> {
    let mut assets = vec![Asset::lovelace(value.coin)];
    for (policy, names) in &value.multiasset {
        let policy = hex::encode(policy);
        for (name, quantity) in names {
            assets.push(Asset::new(format!("{policy}{}", hex::encode(name)), *quantity));
        }
    }
    assets
}

/// Builds a value from assets. Repeated units are summed.
pub fn to_value(assets: &[Asset]) -> Result<Value, CodecError> {
    let mut value = Value::default();
    for asset in assets {
        match parse_unit(&asset.unit)? {
            None => value.coin = value.coin.saturating_add(asset.quantity),
            Some((policy, name)) => {
                let q = value.multiasset.entry(policy).or_default().entry(name).or_default();
                *q = q.saturating_add(asset.quantity);
            }
        }
    }
    Ok(value)
}

/// Splits a unit into policy id and asset name; `None` for lovelace.
pub fn parse_unit(unit: &str) -> Result<Option<(Hash28, Vec<u8>)>, CodecError> {
    if unit == LOVELACE {
        return Ok(None);
    }
    if unit.len() < POLICY_ID_LENGTH || unit.len() > POLICY_ID_LENGTH + 64 || !unit.is_ascii() {
        return Err(CodecError::InvalidUnit(unit.to_string()));
    }
    let (policy, name) = unit.split_at(POLICY_ID_LENGTH);
    let policy = hex::decode(policy)
        .ok()
        .and_then(|p| Hash28::try_from(p.as_slice()).ok())
        .ok_or_else(|| CodecError::InvalidUnit(unit.to_string()))?;
    let name = hex::decode(name).map_err(|_| CodecError::InvalidUnit(unit.to_string()))?;
    Ok(Some((policy, name)))
}

/// CIP-14 asset fingerprint of a hex policy id and hex asset name.
pub fn fingerprint(policy_id: &str, asset_name: &str) -> Result<String, CodecError> {
    let mut preimage = hex::decode(policy_id)?;
    preimage.extend(hex::decode(asset_name)?);
    let hrp = Hrp::parse("asset").map_err(|e| CodecError::InvalidUnit(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, &blake2b_160(&preimage))
        .map_err(|e| CodecError::InvalidUnit(e.to_string()))
}

/// Native assets of a balance, with fingerprints.
pub fn assets_extended(balance: &[Asset]) -> Result<Vec<AssetExtended>, CodecError> {
    balance
        .iter()
        .filter(|asset| !asset.is_lovelace())
        .map(|asset| {
            if parse_unit(&asset.unit)?.is_none() {
                return Err(CodecError::InvalidUnit(asset.unit.clone()));
            }
            let (policy_id, name) = asset.unit.split_at(POLICY_ID_LENGTH);
            let name_bytes = hex::decode(name)?;
            Ok(AssetExtended {
                unit: asset.unit.clone(),
                policy_id: policy_id.to_string(),
                asset_name: String::from_utf8_lossy(&name_bytes).into_owned(),
                fingerprint: fingerprint(policy_id, name)?,
                quantity: asset.quantity,
            })
        })
        .collect()
}

/// Lovelace held by a balance; zero when absent.
pub fn lovelace(balance: &[Asset]) -> u64 {
    balance
        .iter()
        .filter(|asset| asset.is_lovelace())
        .fold(0u64, |acc, asset| acc.saturating_add(asset.quantity))
}

/// Distinct policy ids of a balance, in first-seen order.
pub fn policy_ids(balance: &[Asset]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for asset in balance.iter().filter(|asset| !asset.is_lovelace()) {
        let id = asset.unit.get(..POLICY_ID_LENGTH).unwrap_or(&asset.unit);
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Native assets of a balance under `policy_id`.
pub fn policy_id_assets(
    balance: &[Asset],
    policy_id: &str,
) -> Result<Vec<AssetExtended>, CodecError> {
    Ok(assets_extended(balance)?
        .into_iter()
        .filter(|asset| asset.policy_id == policy_id)
        .collect())
}

/// Sums balances unit by unit, keeping first-seen order.
pub fn merge_assets<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> Vec<Asset> {
    let mut merged: Vec<Asset> = Vec::new();
    for asset in assets {
        match merged.iter_mut().find(|known| known.unit == asset.unit) {
            Some(known) => known.quantity = known.quantity.saturating_add(asset.quantity),
            None => merged.push(asset.clone()),
        }
    }
    merged
}

pub(crate) mod quantity {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(quantity: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&quantity.to_string())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
