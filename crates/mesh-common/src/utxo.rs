//! Unspent outputs: the ledger's `[input, output]` pair and its application form.

use mesh_error::CodecError;
use minicbor::data::{Tag, Type};
use minicbor::Decoder;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::address::Address;
use crate::asset::{self, Asset, Value};
use crate::cbor::{self, VecEncoder, TAG_ENCODED_CBOR};
use crate::data::PlutusData;
use crate::hash::Hash32;
use crate::script::Script;

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionInput {
    /// Id of the producing transaction
    pub transaction_id: Hash32,
    /// Output index within that transaction
    pub index: u64,
}

impl TransactionInput {
    /// Decodes `[transaction_id, index]`
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = d.array()?;
        let transaction_id = cbor::decode_fixed::<32>(d)?;
        let index = d.u64()?;
        cbor::end_array(d, len, 2)?;
        Ok(Self { transaction_id, index })
    }

    /// Encodes `[transaction_id, index]`
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        e.array(2)?.bytes(&self.transaction_id)?.u64(self.index)?;
        Ok(())
    }
}

/// Datum attached to an output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatumOption {
    /// Only the hash is on chain
    Hash(Hash32),
    /// The datum itself is on chain
    Data(PlutusData),
}

impl DatumOption {
    /// Datum hash; for inline data, over the exact datum bytes
    pub fn hash(&self) -> Hash32 {
        match self {
            DatumOption::Hash(hash) => *hash,
            DatumOption::Data(data) => data.hash(),
        }
    }

    fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = d.array()?;
        let datum = match d.u8()? {
            0 => DatumOption::Hash(cbor::decode_fixed::<32>(d)?),
            1 => DatumOption::Data(PlutusData::from_cbor(decode_embedded(d)?)?),
            other => return Err(CodecError::Cbor(format!("unknown datum option {other}"))),
        };
        cbor::end_array(d, len, 2)?;
        Ok(datum)
    }

    fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        match self {
            DatumOption::Hash(hash) => {
                e.array(2)?.u8(0)?.bytes(hash)?;
            }
            DatumOption::Data(data) => {
                e.array(2)?.u8(1)?.tag(Tag::new(TAG_ENCODED_CBOR))?.bytes(data.as_bytes())?;
            }
        }
        Ok(())
    }
}

fn decode_embedded(d: &mut Decoder<'_>) -> Result<Vec<u8>, CodecError> {
    let tag = d.tag()?;
    if tag != Tag::new(TAG_ENCODED_CBOR) {
        return Err(CodecError::Cbor(format!("expected tag 24, found {}", tag.as_u64())));
    }
    cbor::decode_bytes(d)
}

/// A transaction output in its ledger form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Destination
    pub address: Address,
    /// Locked value
    pub value: Value,
    /// Optional datum
    pub datum: Option<DatumOption>,
    /// Optional reference script
    pub script_ref: Option<Script>,
}

impl TransactionOutput {
    /// Output without datum or script
    pub fn new(address: Address, value: Value) -> Self {
        Self { address, value, datum: None, script_ref: None }
    }

    /// Decodes both the legacy array form and the post-Alonzo map form
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        match d.datatype()? {
            Type::Array | Type::ArrayIndef => {
                let len = d.array()?;
                let address = Address::from_bytes(d.bytes()?.to_vec())?;
                let value = Value::decode(d)?;
                let has_hash = match len {
                    Some(3) => true,
                    Some(2) => false,
                    None => d.datatype()? != Type::Break,
                    Some(n) => return Err(CodecError::Cbor(format!("legacy output of {n} items"))),
                };
                let datum = if has_hash {
                    Some(DatumOption::Hash(cbor::decode_fixed::<32>(d)?))
                } else {
                    None
                };
                if len.is_none() {
                    cbor::expect_break(d)?;
                }
                Ok(Self { address, value, datum, script_ref: None })
            }
            Type::Map | Type::MapIndef => {
                let (mut address, mut value) = (None, None);
                let (mut datum, mut script_ref) = (None, None);
                let len = d.map()?;
                let mut remaining = len;
                loop {
                    match remaining {
                        Some(0) => break,
                        Some(ref mut n) => *n -= 1,
                        None if d.datatype()? == Type::Break => {
                            d.skip()?;
                            break;
                        }
                        None => {}
                    }
                    match d.u8()? {
                        0 => address = Some(Address::from_bytes(d.bytes()?.to_vec())?),
                        1 => value = Some(Value::decode(d)?),
                        2 => datum = Some(DatumOption::decode(d)?),
                        3 => {
                            let bytes = decode_embedded(d)?;
                            script_ref = Some(cbor::decode_all(&bytes, Script::decode)?);
                        }
                        other => {
                            return Err(CodecError::Cbor(format!("unknown output field {other}")))
                        }
                    }
                }
                Ok(Self {
                    address: address
                        .ok_or_else(|| CodecError::Cbor("output without address".to_string()))?,
                    value: value
                        .ok_or_else(|| CodecError::Cbor("output without value".to_string()))?,
                    datum,
                    script_ref,
                })
            }
            other => Err(CodecError::Cbor(format!("expected output, found {other:?}"))),
        }
    }

    /// Encodes in the post-Alonzo map form
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        let fields = 2 + self.datum.is_some() as u64 + self.script_ref.is_some() as u64;
        e.map(fields)?;
        e.u8(0)?.bytes(self.address.as_bytes())?;
        e.u8(1)?;
        self.value.encode(e)?;
        if let Some(datum) = &self.datum {
            e.u8(2)?;
            datum.encode(e)?;
        }
        if let Some(script) = &self.script_ref {
            e.u8(3)?.tag(Tag::new(TAG_ENCODED_CBOR))?.bytes(&script.to_cbor()?)?;
        }
        Ok(())
    }

    /// CBOR bytes
    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        cbor::encode_to_vec(|e| self.encode(e))
    }

    /// Decodes hex CBOR
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        cbor::decode_all(&cbor::decode_hex(s)?, Self::decode)
    }
}

/// An unspent output together with its reference, as returned by CIP-30 wallets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxUnspentOutput {
    /// Where the output lives
    pub input: TransactionInput,
    /// What it holds
    pub output: TransactionOutput,
}

impl TxUnspentOutput {
    /// Decodes `[input, output]`
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = d.array()?;
        let input = TransactionInput::decode(d)?;
        let output = TransactionOutput::decode(d)?;
        cbor::end_array(d, len, 2)?;
        Ok(Self { input, output })
    }

    /// Encodes `[input, output]`
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        e.array(2)?;
        self.input.encode(e)?;
        self.output.encode(e)
    }

    /// Decodes CBOR bytes
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CodecError> {
        cbor::decode_all(bytes, Self::decode)
    }

    /// Decodes hex CBOR
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

/// Output reference of a [`UTxO`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoInput {
    /// Index within the producing transaction
    pub output_index: u32,
    /// Hex id of the producing transaction
    pub tx_hash: String,
}

/// Resolved output of a [`UTxO`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoOutput {
    /// Human readable address
    pub address: String,
    /// Balance, lovelace first
    pub amount: Vec<Asset>,
    /// Hex datum hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
    /// Hex CBOR of an inline datum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plutus_data: Option<String>,
    /// Hex CBOR of a reference script (`[language, script]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_ref: Option<String>,
}

/// Application-level unspent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UTxO {
    /// Output reference
    pub input: UtxoInput,
    /// Resolved output
    pub output: UtxoOutput,
}

impl UTxO {
    /// Lovelace held by the output
    pub fn lovelace(&self) -> u64 {
        asset::lovelace(&self.output.amount)
    }

    /// True when the output holds only lovelace
    pub fn is_pure_lovelace(&self) -> bool {
        self.output.amount.iter().all(|a| a.is_lovelace() || a.quantity == 0)
    }

    /// True when the output has neither datum nor reference script
    pub fn is_plain(&self) -> bool {
        self.output.data_hash.is_none()
            && self.output.plutus_data.is_none()
            && self.output.script_ref.is_none()
    }
}

/// Converts a ledger unspent output into its application form.
///
/// Inline data yields both `plutusData` and a `dataHash` recomputed over the datum bytes.
pub fn from_tx_unspent_output(utxo: &TxUnspentOutput) -> Result<UTxO, CodecError> {
    let resolved = &utxo.output;
    let (data_hash, plutus_data) = match &resolved.datum {
        Some(DatumOption::Data(data)) => (Some(hex::encode(data.hash())), Some(data.to_hex())),
        Some(DatumOption::Hash(hash)) => (Some(hex::encode(hash)), None),
        None => (None, None),
    };
    let script_ref = resolved.script_ref.as_ref().map(Script::to_hex).transpose()?;
    let output_index = u32::try_from(utxo.input.index)
        .map_err(|_| CodecError::Cbor(format!("output index {} too large", utxo.input.index)))?;

    Ok(UTxO {
        input: UtxoInput {
            output_index,
            tx_hash: hex::encode(utxo.input.transaction_id),
        },
        output: UtxoOutput {
            address: resolved.address.to_bech32()?,
            amount: asset::from_value(&resolved.value),
            data_hash,
            plutus_data,
            script_ref,
        },
    })
}

/// Decodes hex CBOR and converts it, as `getUtxos` results arrive.
pub fn from_tx_unspent_output_hex(s: &str) -> Result<UTxO, CodecError> {
    from_tx_unspent_output(&TxUnspentOutput::from_hex(s)?)
}

/// Converts an application unspent output into its ledger form.
///
/// `plutusData` takes precedence over `dataHash`. A supplied hash that disagrees with
/// the datum is ignored in favour of the recomputed one.
pub fn to_tx_unspent_output(utxo: &UTxO) -> Result<TxUnspentOutput, CodecError> {
    let transaction_id: Hash32 = hex::decode(&utxo.input.tx_hash)?
        .try_into()
        .map_err(|_| CodecError::Cbor("transaction hash must be 32 bytes".to_string()))?;

    let datum = match (&utxo.output.plutus_data, &utxo.output.data_hash) {
        (Some(data), supplied) => {
            let data = PlutusData::from_hex(data)?;
            if let Some(supplied) = supplied {
                let computed = hex::encode(data.hash());
                if !supplied.eq_ignore_ascii_case(&computed) {
                    warn!(
                        tx_hash = %utxo.input.tx_hash,
                        output_index = utxo.input.output_index,
                        %supplied,
                        %computed,
                        "dataHash does not match plutusData, using the recomputed hash"
                    );
                }
            }
            Some(DatumOption::Data(data))
        }
        (None, Some(hash)) => Some(DatumOption::Hash(
            hex::decode(hash)?
                .try_into()
                .map_err(|_| CodecError::Cbor("datum hash must be 32 bytes".to_string()))?,
        )),
        (None, None) => None,
    };

    let script_ref = utxo.output.script_ref.as_deref().map(Script::from_hex).transpose()?;

    Ok(TxUnspentOutput {
        input: TransactionInput {
            transaction_id,
            index: utxo.input.output_index.into(),
        },
        output: TransactionOutput {
            address: Address::parse(&utxo.output.address)?,
            value: asset::to_value(&utxo.output.amount)?,
            datum,
            script_ref,
        },
    })
}
