//! Transaction metadata: text, integers, lists and maps under numeric labels.

use std::collections::BTreeMap;

use mesh_error::CodecError;
use minicbor::data::{Int, Type};
use minicbor::Decoder;

use crate::cbor::{self, VecEncoder};
use crate::data::Data;

/// Label → metadatum, the shape of a transaction's metadata map
pub type MetadataMap = BTreeMap<u64, Metadata>;

/// Application-level transaction metadatum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metadata {
    /// UTF-8 text
    Text(String),
    /// Integer in the CBOR range `-2^64 ..= 2^64 - 1`
    Integer(i128),
    /// Ordered list
    List(Vec<Metadata>),
    /// Key/value pairs, in encoding order
    Map(Vec<(Metadata, Metadata)>),
}

impl Metadata {
    /// Decodes one metadatum
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        decode_nested(d, 0)
    }

    /// Encodes one metadatum
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        match self {
            Metadata::Text(text) => {
                e.str(text)?;
            }
            Metadata::Integer(n) => {
                let int = Int::try_from(*n).map_err(|_| {
                    CodecError::UnsupportedMetadatum(format!("integer {n} out of range"))
                })?;
                e.int(int)?;
            }
            Metadata::List(items) => {
                e.array(items.len() as u64)?;
                for item in items {
                    item.encode(e)?;
                }
            }
            Metadata::Map(entries) => {
                e.map(entries.len() as u64)?;
                for (k, v) in entries {
                    k.encode(e)?;
                    v.encode(e)?;
                }
            }
        }
        Ok(())
    }

    /// Decodes a complete CBOR document
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CodecError> {
        cbor::decode_all(bytes, Self::decode)
    }

    /// CBOR bytes
    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        cbor::encode_to_vec(|e| self.encode(e))
    }
}

impl From<&str> for Metadata {
    fn from(text: &str) -> Self {
        Metadata::Text(text.to_string())
    }
}

impl From<String> for Metadata {
    fn from(text: String) -> Self {
        Metadata::Text(text)
    }
}

impl From<i64> for Metadata {
    fn from(n: i64) -> Self {
        Metadata::Integer(n.into())
    }
}

impl TryFrom<&Data> for Metadata {
    type Error = CodecError;

    /// Fails on the first bytes or constructor value, rather than dropping it.
    fn try_from(data: &Data) -> Result<Self, Self::Error> {
        match data {
            Data::Integer(n) => i128::try_from(n)
                .ok()
                .filter(|n| Int::try_from(*n).is_ok())
                .map(Metadata::Integer)
                .ok_or_else(|| CodecError::UnsupportedMetadatum(format!("integer {n} out of range"))),
            Data::List(items) => Ok(Metadata::List(
                items.iter().map(Metadata::try_from).collect::<Result<_, _>>()?,
            )),
            Data::Map(entries) => Ok(Metadata::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((Metadata::try_from(k)?, Metadata::try_from(v)?)))
                    .collect::<Result<_, CodecError>>()?,
            )),
            Data::Bytes(_) => Err(CodecError::UnsupportedMetadatum("bytes".to_string())),
            Data::Constructor { alternative, .. } => Err(CodecError::UnsupportedMetadatum(
                format!("constructor {alternative}"),
            )),
        }
    }
}

fn decode_nested(d: &mut Decoder<'_>, depth: usize) -> Result<Metadata, CodecError> {
    if depth > crate::data::MAX_DEPTH {
        return Err(CodecError::Cbor("metadatum nested too deeply".to_string()));
    }
    let nested = |d: &mut Decoder<'_>| decode_nested(d, depth + 1);

    match d.datatype()? {
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => Ok(Metadata::Integer(i128::from(d.int()?))),
        Type::String | Type::StringIndef => Ok(Metadata::Text(cbor::decode_text(d)?)),
        Type::Array | Type::ArrayIndef => Ok(Metadata::List(cbor::decode_array(d, nested)?)),
        Type::Map | Type::MapIndef => Ok(Metadata::Map(cbor::decode_map(d, nested, nested)?)),
        other => Err(CodecError::UnsupportedMetadatum(format!("{other:?}"))),
    }
}

/// Converts a wire metadatum into the application value.
pub fn from_tx_metadatum(bytes: &[u8]) -> Result<Metadata, CodecError> {
    Metadata::from_cbor(bytes)
}

/// Converts an application value into a wire metadatum.
pub fn to_tx_metadatum(metadata: &Metadata) -> Result<Vec<u8>, CodecError> {
    metadata.to_cbor()
}

/// Encodes a label → metadatum map, as carried in auxiliary data.
pub fn encode_metadata_map(e: &mut VecEncoder, map: &MetadataMap) -> Result<(), CodecError> {
    e.map(map.len() as u64)?;
    for (label, metadatum) in map {
        e.u64(*label)?;
        metadatum.encode(e)?;
    }
    Ok(())
}

/// Decodes a label → metadatum map.
pub fn decode_metadata_map(d: &mut Decoder<'_>) -> Result<MetadataMap, CodecError> {
    Ok(cbor::decode_map(d, cbor::decode_u64, Metadata::decode)?
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("00", Metadata::Integer(0); "zero")]
    #[test_case("387f", Metadata::Integer(-128); "negative")]
    #[test_case("1bffffffffffffffff", Metadata::Integer(u64::MAX as i128); "max")]
    #[test_case("3bffffffffffffffff", Metadata::Integer(-(1i128 << 64)); "min")]
    #[test_case("646d657368", Metadata::from("mesh"); "text")]
    #[test_case("7f626d65627368ff", Metadata::from("mesh"); "chunked text")]
    #[test_case("820102", Metadata::List(vec![Metadata::Integer(1), Metadata::Integer(2)]); "list")]
    #[test_case("a1616b01", Metadata::Map(vec![("k".into(), Metadata::Integer(1))]); "map")]
    fn test_decode_fixture(hex: &str, expected: Metadata) {
        let bytes = hex::decode(hex).unwrap();
        assert_eq!(from_tx_metadatum(&bytes).unwrap(), expected);
    }

    #[test_case("43666f6f"; "bytes")]
    #[test_case("d87980"; "tagged")]
    #[test_case("f5"; "boolean")]
    fn test_unsupported_wire_metadatum(hex: &str) {
        let bytes = hex::decode(hex).unwrap();
        assert!(matches!(
            from_tx_metadatum(&bytes),
            Err(CodecError::UnsupportedMetadatum(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let metadata = Metadata::Map(vec![
            ("name".into(), "Mesh".into()),
            ("tags".into(), Metadata::List(vec!["a".into(), Metadata::Integer(-7)])),
        ]);
        let bytes = to_tx_metadatum(&metadata).unwrap();
        assert_eq!(from_tx_metadatum(&bytes).unwrap(), metadata);
    }

    #[test]
    fn test_out_of_range_integer_rejected() {
        let err = to_tx_metadatum(&Metadata::Integer(i128::MAX)).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedMetadatum(_)));
    }

    #[test]
    fn test_constructor_fails_fast() {
        let data = Data::List(vec![Data::from(1i64), Data::constr(0, vec![Data::from(2i64)])]);
        assert!(matches!(
            Metadata::try_from(&data),
            Err(CodecError::UnsupportedMetadatum(_))
        ));

        let data = Data::Map(vec![(Data::from(1i64), Data::List(vec![]))]);
        assert_eq!(
            Metadata::try_from(&data).unwrap(),
            Metadata::Map(vec![(Metadata::Integer(1), Metadata::List(vec![]))])
        );
    }

    #[test]
    fn test_metadata_map_label_order() {
        let mut map = MetadataMap::new();
        map.insert(721, "nft".into());
        map.insert(674, Metadata::Map(vec![("msg".into(), "hi".into())]));

        let bytes = cbor::encode_to_vec(|e| encode_metadata_map(e, &map)).unwrap();
        assert_eq!(&bytes[..4], &[0xa2, 0x19, 0x02, 0xa2]);
        let decoded = cbor::decode_all(&bytes, decode_metadata_map).unwrap();
        assert_eq!(decoded, map);
    }
}
