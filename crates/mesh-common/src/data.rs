//! Plutus Data: the recursive datum / redeemer value and its ledger encoding.
//!
//! Encoding follows the canonical form produced by the ledger's own serializer:
//!
//! - non-empty lists and constructor fields use indefinite-length arrays,
//!   empty ones a definite `[]`;
//! - byte strings longer than 64 bytes are split into 64-byte chunks;
//! - integers outside the CBOR major type 0/1 range are tag 2 / tag 3 bignums;
//! - constructors use tags 121-127 (alternatives 0-6), 1280-1400 (7-127)
//!   and the general form `102([alternative, fields])` beyond that.

use std::collections::BTreeSet;

use mesh_error::CodecError;
use minicbor::data::{Int, Tag, Type};
use minicbor::Decoder;
use num_bigint::{BigInt, Sign};

use crate::cbor::{self, VecEncoder};
use crate::hash::{blake2b_256, Hash32};

const TAG_POS_BIGNUM: u64 = 2;
const TAG_NEG_BIGNUM: u64 = 3;
const TAG_CONSTR_GENERAL: u64 = 102;
const TAG_CONSTR_COMPACT: u64 = 121;
const TAG_CONSTR_EXTENDED: u64 = 1280;

/// Nesting limit for encoding and decoding, shared with native scripts
pub const MAX_DEPTH: usize = 256;

/// Application-level Plutus Data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Data {
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Arbitrary precision integer
    Integer(BigInt),
    /// Ordered list
    List(Vec<Data>),
    /// Key/value pairs, in encoding order; keys are unique and the codec
    /// rejects a map that repeats one
    Map(Vec<(Data, Data)>),
    /// Constructor application
    Constructor {
        /// Constructor index
        alternative: u64,
        /// Constructor arguments
        fields: Vec<Data>,
    },
}

impl Data {
    /// Bytes variant
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Data::Bytes(bytes.into())
    }

    /// Integer variant
    pub fn integer(n: impl Into<BigInt>) -> Self {
        Data::Integer(n.into())
    }

    /// Constructor variant
    pub fn constr(alternative: u64, fields: Vec<Data>) -> Self {
        Data::Constructor { alternative, fields }
    }

    /// Decodes one Plutus Data item
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        decode_nested(d, 0)
    }

    /// Encodes in canonical form.
    ///
    /// Fails on values the decoder would refuse: nesting deeper than [`MAX_DEPTH`]
    /// or a map with repeated keys.
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        self.encode_nested(e, 0)
    }

    fn encode_nested(&self, e: &mut VecEncoder, depth: usize) -> Result<(), CodecError> {
        check_depth(depth)?;
        match self {
            Data::Bytes(bytes) => cbor::encode_bounded_bytes(e, bytes),
            Data::Integer(n) => encode_integer(e, n),
            Data::List(items) => encode_list(e, items, depth + 1),
            Data::Map(entries) => {
                check_unique_keys(entries)?;
                e.map(entries.len() as u64)?;
                for (k, v) in entries {
                    k.encode_nested(e, depth + 1)?;
                    v.encode_nested(e, depth + 1)?;
                }
                Ok(())
            }
            Data::Constructor { alternative, fields } => {
                match *alternative {
                    alt @ 0..=6 => {
                        e.tag(Tag::new(TAG_CONSTR_COMPACT + alt))?;
                    }
                    alt @ 7..=127 => {
                        e.tag(Tag::new(TAG_CONSTR_EXTENDED + alt - 7))?;
                    }
                    alt => {
                        e.tag(Tag::new(TAG_CONSTR_GENERAL))?.array(2)?.u64(alt)?;
                    }
                }
                encode_list(e, fields, depth + 1)
            }
        }
    }

    /// Decodes a complete CBOR document
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CodecError> {
        cbor::decode_all(bytes, Self::decode)
    }

    /// Decodes a hex CBOR document
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        Self::from_cbor(&cbor::decode_hex(s)?)
    }

    /// Canonical CBOR bytes
    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        cbor::encode_to_vec(|e| self.encode(e))
    }

    /// Canonical CBOR hex
    pub fn to_hex(&self) -> Result<String, CodecError> {
        Ok(hex::encode(self.to_cbor()?))
    }
}

impl From<i64> for Data {
    fn from(n: i64) -> Self {
        Data::Integer(n.into())
    }
}

impl From<u64> for Data {
    fn from(n: u64) -> Self {
        Data::Integer(n.into())
    }
}

impl From<Vec<Data>> for Data {
    fn from(items: Vec<Data>) -> Self {
        Data::List(items)
    }
}

fn check_depth(depth: usize) -> Result<(), CodecError> {
    if depth > MAX_DEPTH {
        return Err(CodecError::Cbor(format!("Plutus Data nested deeper than {MAX_DEPTH}")));
    }
    Ok(())
}

fn check_unique_keys(entries: &[(Data, Data)]) -> Result<(), CodecError> {
    let mut seen = BTreeSet::new();
    match entries.iter().find(|(k, _)| !seen.insert(k)) {
        Some((k, _)) => Err(CodecError::Cbor(format!("duplicate Plutus Data map key {k:?}"))),
        None => Ok(()),
    }
}

fn decode_nested(d: &mut Decoder<'_>, depth: usize) -> Result<Data, CodecError> {
    check_depth(depth)?;
    let nested = |d: &mut Decoder<'_>| decode_nested(d, depth + 1);

    match d.datatype()? {
        Type::Bytes | Type::BytesIndef => Ok(Data::Bytes(cbor::decode_bytes(d)?)),
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => Ok(Data::Integer(BigInt::from(i128::from(d.int()?)))),
        Type::Array | Type::ArrayIndef => Ok(Data::List(cbor::decode_array(d, nested)?)),
        Type::Map | Type::MapIndef => {
            let entries = cbor::decode_map(d, nested, nested)?;
            check_unique_keys(&entries)?;
            Ok(Data::Map(entries))
        }
        Type::Tag => match d.tag()?.as_u64() {
            TAG_POS_BIGNUM => Ok(Data::Integer(BigInt::from_bytes_be(
                Sign::Plus,
                &cbor::decode_bytes(d)?,
            ))),
            TAG_NEG_BIGNUM => {
                let magnitude = BigInt::from_bytes_be(Sign::Plus, &cbor::decode_bytes(d)?);
                Ok(Data::Integer(BigInt::from(-1) - magnitude))
            }
            tag @ 121..=127 => Ok(Data::Constructor {
                alternative: tag - TAG_CONSTR_COMPACT,
                fields: decode_fields(d, nested)?,
            }),
            tag @ 1280..=1400 => Ok(Data::Constructor {
                alternative: tag - TAG_CONSTR_EXTENDED + 7,
                fields: decode_fields(d, nested)?,
            }),
            TAG_CONSTR_GENERAL => {
                let len = d.array()?;
                let alternative = d.u64()?;
                let fields = decode_fields(d, nested)?;
                cbor::end_array(d, len, 2)?;
                Ok(Data::Constructor { alternative, fields })
            }
            other => Err(CodecError::UnsupportedDataKind(format!("tag {other}"))),
        },
        other => Err(CodecError::UnsupportedDataKind(format!("{other:?}"))),
    }
}

fn decode_fields<'b>(
    d: &mut Decoder<'b>,
    nested: impl FnMut(&mut Decoder<'b>) -> Result<Data, CodecError>,
) -> Result<Vec<Data>, CodecError> {
    match d.datatype()? {
        Type::Array | Type::ArrayIndef => cbor::decode_array(d, nested),
        other => Err(CodecError::UnsupportedDataKind(format!(
            "constructor fields must be an array, found {other:?}"
        ))),
    }
}

fn encode_list(e: &mut VecEncoder, items: &[Data], depth: usize) -> Result<(), CodecError> {
    if items.is_empty() {
        e.array(0)?;
        return Ok(());
    }
    e.begin_array()?;
    for item in items {
        item.encode_nested(e, depth)?;
    }
    e.end()?;
    Ok(())
}

fn encode_integer(e: &mut VecEncoder, n: &BigInt) -> Result<(), CodecError> {
    let small = i128::try_from(n).ok().and_then(|i| Int::try_from(i).ok());
    if let Some(int) = small {
        e.int(int)?;
        return Ok(());
    }
    let (tag, magnitude) = match n.sign() {
        Sign::Minus => (TAG_NEG_BIGNUM, BigInt::from(-1) - n),
        _ => (TAG_POS_BIGNUM, n.clone()),
    };
    e.tag(Tag::new(tag))?;
    cbor::encode_bounded_bytes(e, &magnitude.to_bytes_be().1)
}

/// Plutus Data in its wire form, as handed over by chain tooling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlutusData {
    bytes: Vec<u8>,
}

impl PlutusData {
    /// Wraps CBOR bytes after checking they hold one well-formed Data item
    pub fn from_cbor(bytes: Vec<u8>) -> Result<Self, CodecError> {
        Data::from_cbor(&bytes)?;
        Ok(Self { bytes })
    }

    /// Wraps hex CBOR
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        Self::from_cbor(cbor::decode_hex(s)?)
    }

    /// The exact bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex of the exact bytes
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Datum hash: Blake2b-256 over the exact bytes
    pub fn hash(&self) -> Hash32 {
        blake2b_256(&self.bytes)
    }
}

/// Converts wire Plutus Data into the application value.
pub fn from_plutus_data(plutus_data: &PlutusData) -> Result<Data, CodecError> {
    Data::from_cbor(plutus_data.as_bytes())
}

/// Converts an application value into canonical wire Plutus Data.
pub fn to_plutus_data(data: &Data) -> Result<PlutusData, CodecError> {
    Ok(PlutusData { bytes: data.to_cbor()? })
}

/// Datum hash of an application value, over its canonical encoding.
pub fn hash_data(data: &Data) -> Result<Hash32, CodecError> {
    Ok(blake2b_256(&data.to_cbor()?))
}
