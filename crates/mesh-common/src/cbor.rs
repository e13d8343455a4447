//! Small helpers on top of `minicbor` shared by the wire codecs.

use mesh_error::CodecError;
use minicbor::data::{Tag, Type};
use minicbor::{Decoder, Encoder};

/// Tag wrapping an embedded CBOR item (`#6.24(bytes .cbor a)`)
pub const TAG_ENCODED_CBOR: u64 = 24;

/// Optional tag marking a set (Conway)
pub const TAG_SET: u64 = 258;

/// Ledger limit on a single bytes chunk inside Plutus Data
pub const BYTES_CHUNK_SIZE: usize = 64;

/// Encoder writing into a growable buffer
pub type VecEncoder = Encoder<Vec<u8>>;

/// Hex decode, mapping errors into the codec taxonomy.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, CodecError> {
    Ok(hex::decode(s.trim())?)
}

/// Decode a complete CBOR document, rejecting trailing bytes.
pub fn decode_all<'b, T>(
    bytes: &'b [u8],
    f: impl FnOnce(&mut Decoder<'b>) -> Result<T, CodecError>,
) -> Result<T, CodecError> {
    let mut d = Decoder::new(bytes);
    let value = f(&mut d)?;
    if d.position() != bytes.len() {
        return Err(CodecError::Cbor(format!(
            "{} trailing byte(s) after item",
            bytes.len() - d.position()
        )));
    }
    Ok(value)
}

/// Encode into a fresh buffer.
pub fn encode_to_vec(
    f: impl FnOnce(&mut VecEncoder) -> Result<(), CodecError>,
) -> Result<Vec<u8>, CodecError> {
    let mut e = Encoder::new(Vec::new());
    f(&mut e)?;
    Ok(e.into_writer())
}

/// Skip the next item, returning the exact bytes it occupied.
pub fn raw_item<'b>(d: &mut Decoder<'b>) -> Result<&'b [u8], CodecError> {
    let input = d.input();
    let start = d.position();
    d.skip()?;
    Ok(&input[start..d.position()])
}

/// Append an already-encoded item verbatim.
pub fn write_raw(e: &mut VecEncoder, raw: &[u8]) {
    e.writer_mut().extend_from_slice(raw);
}

/// Consume an optional set tag in front of an array.
pub fn skip_set_tag(d: &mut Decoder<'_>) -> Result<bool, CodecError> {
    if d.datatype()? == Type::Tag {
        let mut probe = d.probe();
        if probe.tag()? == Tag::new(TAG_SET) {
            d.tag()?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Decode every element of an array, definite or indefinite.
pub fn decode_array<'b, T>(
    d: &mut Decoder<'b>,
    mut f: impl FnMut(&mut Decoder<'b>) -> Result<T, CodecError>,
) -> Result<Vec<T>, CodecError> {
    let mut items = Vec::new();
    match d.array()? {
        Some(len) => {
            for _ in 0..len {
                items.push(f(d)?);
            }
        }
        None => {
            while d.datatype()? != Type::Break {
                items.push(f(d)?);
            }
            d.skip()?;
        }
    }
    Ok(items)
}

/// Decode every entry of a map, definite or indefinite, keeping wire order.
pub fn decode_map<'b, K, V>(
    d: &mut Decoder<'b>,
    mut key: impl FnMut(&mut Decoder<'b>) -> Result<K, CodecError>,
    mut value: impl FnMut(&mut Decoder<'b>) -> Result<V, CodecError>,
) -> Result<Vec<(K, V)>, CodecError> {
    let mut entries = Vec::new();
    match d.map()? {
        Some(len) => {
            for _ in 0..len {
                let k = key(d)?;
                entries.push((k, value(d)?));
            }
        }
        None => {
            while d.datatype()? != Type::Break {
                let k = key(d)?;
                entries.push((k, value(d)?));
            }
            d.skip()?;
        }
    }
    Ok(entries)
}

/// Decode a byte string, concatenating chunks of an indefinite one.
pub fn decode_bytes(d: &mut Decoder<'_>) -> Result<Vec<u8>, CodecError> {
    match d.datatype()? {
        Type::Bytes => Ok(d.bytes()?.to_vec()),
        Type::BytesIndef => {
            let mut out = Vec::new();
            for chunk in d.bytes_iter()? {
                out.extend_from_slice(chunk?);
            }
            Ok(out)
        }
        other => Err(CodecError::Cbor(format!("expected bytes, found {other:?}"))),
    }
}

/// Decode a text string, concatenating chunks of an indefinite one.
pub fn decode_text(d: &mut Decoder<'_>) -> Result<String, CodecError> {
    match d.datatype()? {
        Type::String => Ok(d.str()?.to_string()),
        Type::StringIndef => {
            let mut out = String::new();
            for chunk in d.str_iter()? {
                out.push_str(chunk?);
            }
            Ok(out)
        }
        other => Err(CodecError::Cbor(format!("expected text, found {other:?}"))),
    }
}

/// Decode a fixed-size byte string.
pub fn decode_fixed<const N: usize>(d: &mut Decoder<'_>) -> Result<[u8; N], CodecError> {
    let bytes = d.bytes()?;
    bytes.try_into().map_err(|_| {
        CodecError::Cbor(format!("expected {N} bytes, found {}", bytes.len()))
    })
}

/// Encode bytes, splitting into 64-byte chunks when longer than a single chunk.
pub fn encode_bounded_bytes(e: &mut VecEncoder, bytes: &[u8]) -> Result<(), CodecError> {
    if bytes.len() <= BYTES_CHUNK_SIZE {
        e.bytes(bytes)?;
    } else {
        e.begin_bytes()?;
        for chunk in bytes.chunks(BYTES_CHUNK_SIZE) {
            e.bytes(chunk)?;
        }
        e.end()?;
    }
    Ok(())
}

/// Consume the break closing an indefinite container.
pub fn expect_break(d: &mut Decoder<'_>) -> Result<(), CodecError> {
    match d.datatype()? {
        Type::Break => {
            d.skip()?;
            Ok(())
        }
        other => Err(CodecError::Cbor(format!("expected break, found {other:?}"))),
    }
}

/// Closes an array opened with `len`, checking the expected arity.
pub fn end_array(d: &mut Decoder<'_>, len: Option<u64>, expected: u64) -> Result<(), CodecError> {
    match len {
        Some(n) if n == expected => Ok(()),
        Some(n) => Err(CodecError::Cbor(format!("expected array of {expected}, found {n}"))),
        None => expect_break(d),
    }
}

/// Unsigned integer of any CBOR width.
pub fn decode_u64(d: &mut Decoder<'_>) -> Result<u64, CodecError> {
    Ok(d.u64()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_item_spans_whole_item() {
        // [1, [2, 3]] followed by a trailing 0
        let bytes = hex::decode("820182020300").unwrap();
        let mut d = Decoder::new(&bytes);
        let raw = raw_item(&mut d).unwrap();
        assert_eq!(raw, &bytes[..5]);
        assert_eq!(d.position(), 5);
        assert_eq!(d.u8().unwrap(), 0);
    }

    #[test]
    fn test_decode_all_rejects_trailing_bytes() {
        let bytes = hex::decode("0101").unwrap();
        let err = decode_all(&bytes, |d| Ok(d.u8()?)).unwrap_err();
        assert!(matches!(err, CodecError::Cbor(_)));
    }

    #[test]
    fn test_bounded_bytes_chunking() {
        let long = vec![7u8; 100];
        let encoded = encode_to_vec(|e| encode_bounded_bytes(e, &long)).unwrap();
        assert_eq!(encoded[0], 0x5f);
        let decoded = decode_all(&encoded, decode_bytes).unwrap();
        assert_eq!(decoded, long);
    }

    #[test]
    fn test_indefinite_array() {
        let bytes = hex::decode("9f010203ff").unwrap();
        let items = decode_all(&bytes, |d| decode_array(d, decode_u64)).unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_set_tag_is_optional() {
        let tagged = hex::decode("d9010281581c00000000000000000000000000000000000000000000000000000000").unwrap();
        let mut d = Decoder::new(&tagged);
        assert!(skip_set_tag(&mut d).unwrap());
        assert_eq!(d.array().unwrap(), Some(1));

        let untagged = hex::decode("80").unwrap();
        let mut d = Decoder::new(&untagged);
        assert!(!skip_set_tag(&mut d).unwrap());
    }
}
