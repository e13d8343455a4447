//! Transaction witness sets and the signature merge.
//!
//! Only verification-key witnesses are interpreted. Every other witness kind is kept
//! as the exact bytes it arrived with, so merging signatures never disturbs scripts,
//! datums or redeemers already attached by the transaction builder.

use std::collections::HashSet;

use mesh_error::CodecError;
use minicbor::data::Tag;
use minicbor::Decoder;

use crate::cbor::{self, VecEncoder, TAG_SET};

const VKEY_WITNESSES: u64 = 0;

/// A verification key and its signature over the transaction body hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VKeyWitness {
    /// Ed25519 verification key
    pub vkey: [u8; 32],
    /// Ed25519 signature
    pub signature: [u8; 64],
}

impl VKeyWitness {
    /// Creates a witness
    pub fn new(vkey: [u8; 32], signature: [u8; 64]) -> Self {
        Self { vkey, signature }
    }

    /// Decodes `[vkey, signature]`
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = d.array()?;
        let vkey = cbor::decode_fixed::<32>(d)?;
        let signature = cbor::decode_fixed::<64>(d)?;
        cbor::end_array(d, len, 2)?;
        Ok(Self { vkey, signature })
    }

    /// Encodes `[vkey, signature]`
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        e.array(2)?.bytes(&self.vkey)?.bytes(&self.signature)?;
        Ok(())
    }

    /// Canonical encoding, which is also the witness identity
    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        cbor::encode_to_vec(|e| self.encode(e))
    }
}

/// A transaction witness set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WitnessSet {
    /// Verification-key witnesses; `None` when the key is absent
    pub vkey_witnesses: Option<Vec<VKeyWitness>>,
    tagged_set: bool,
    others: Vec<(u64, Vec<u8>)>,
}

impl WitnessSet {
    /// Witness set holding only signatures
    pub fn from_signatures(signatures: Vec<VKeyWitness>) -> Self {
        Self { vkey_witnesses: Some(signatures), ..Self::default() }
    }

    /// Signatures, empty when there are none
    pub fn signatures(&self) -> &[VKeyWitness] {
        self.vkey_witnesses.as_deref().unwrap_or_default()
    }

    /// Decodes a witness set map
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let mut set = WitnessSet::default();
        let entries = cbor::decode_map(d, cbor::decode_u64, |d| Ok(cbor::raw_item(d)?.to_vec()))?;
        for (key, raw) in entries {
            if key == VKEY_WITNESSES {
                if set.vkey_witnesses.is_some() {
                    return Err(CodecError::Cbor(format!("duplicate witness set key {key}")));
                }
                let mut inner = Decoder::new(&raw);
                set.tagged_set = cbor::skip_set_tag(&mut inner)?;
                set.vkey_witnesses = Some(cbor::decode_array(&mut inner, VKeyWitness::decode)?);
            } else if set.others.iter().any(|(known, _)| *known == key) {
                return Err(CodecError::Cbor(format!("duplicate witness set key {key}")));
            } else {
                set.others.push((key, raw));
            }
        }
        set.others.sort_by_key(|(key, _)| *key);
        Ok(set)
    }

    /// Encodes with keys in ascending order
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        let vkeys = self.vkey_witnesses.as_ref();
        e.map(self.others.len() as u64 + vkeys.is_some() as u64)?;
        if let Some(witnesses) = vkeys {
            e.u64(VKEY_WITNESSES)?;
            if self.tagged_set {
                e.tag(Tag::new(TAG_SET))?;
            }
            e.array(witnesses.len() as u64)?;
            for witness in witnesses {
                witness.encode(e)?;
            }
        }
        for (key, raw) in &self.others {
            e.u64(*key)?;
            cbor::write_raw(e, raw);
        }
        Ok(())
    }

    /// Decodes CBOR bytes
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CodecError> {
        cbor::decode_all(bytes, Self::decode)
    }

    /// Decodes hex CBOR, the form CIP-30 `signTx` returns
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

/// Merges new signatures into a witness set.
///
/// Witnesses are identified by their canonical encoding: existing witnesses come first,
/// new ones follow in order, and repeated encodings are kept once. Two different
/// signatures under the same key are both kept. The input set is left untouched.
pub fn merge_signatures(
    witness_set: &WitnessSet,
    new_signatures: &[VKeyWitness],
) -> Result<WitnessSet, CodecError> {
    if witness_set.vkey_witnesses.is_none() && new_signatures.is_empty() {
        return Ok(witness_set.clone());
    }

    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for witness in witness_set.signatures().iter().chain(new_signatures) {
        if seen.insert(witness.to_cbor()?) {
            merged.push(witness.clone());
        }
    }

    Ok(WitnessSet { vkey_witnesses: Some(merged), ..witness_set.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(key: u8, sig: u8) -> VKeyWitness {
        VKeyWitness::new([key; 32], [sig; 64])
    }

    #[test]
    fn test_merge_example() {
        let existing = WitnessSet::from_signatures(vec![sig(1, 1)]);
        let merged = merge_signatures(&existing, &[sig(1, 1), sig(2, 2)]).unwrap();
        assert_eq!(merged.signatures(), &[sig(1, 1), sig(2, 2)]);
    }

    #[test]
    fn test_merge_into_absent_set() {
        let merged = merge_signatures(&WitnessSet::default(), &[sig(3, 3), sig(4, 4)]).unwrap();
        assert_eq!(merged.signatures(), &[sig(3, 3), sig(4, 4)]);

        let untouched = merge_signatures(&WitnessSet::default(), &[]).unwrap();
        assert_eq!(untouched.vkey_witnesses, None);
    }

    #[test]
    fn test_merge_keeps_resigns_under_same_key() {
        let existing = WitnessSet::from_signatures(vec![sig(1, 1)]);
        let merged = merge_signatures(&existing, &[sig(1, 9)]).unwrap();
        assert_eq!(merged.signatures().len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = WitnessSet::from_signatures(vec![sig(1, 1), sig(2, 2)]);
        let new = [sig(2, 2), sig(3, 3), sig(3, 3)];
        let once = merge_signatures(&existing, &new).unwrap();
        let twice = merge_signatures(&once, &new).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.signatures().len(), 3);
        assert_eq!(merge_signatures(&once, &[]).unwrap(), once);
    }

    #[test]
    fn test_merge_does_not_mutate_input() {
        let existing = WitnessSet::from_signatures(vec![sig(1, 1)]);
        let before = existing.clone();
        let _ = merge_signatures(&existing, &[sig(2, 2)]).unwrap();
        assert_eq!(existing, before);
    }

    #[test]
    fn test_other_witnesses_preserved() {
        // {0: [[vkey, sig]], 1: [native script], 4: [data]} with a set tag on key 0
        let mut bytes = vec![0xa3, 0x00, 0xd9, 0x01, 0x02, 0x81, 0x82, 0x58, 0x20];
        bytes.extend([1u8; 32]);
        bytes.extend([0x58, 0x40]);
        bytes.extend([1u8; 64]);
        bytes.extend([0x01, 0x81, 0x82, 0x04, 0x00]);
        bytes.extend([0x04, 0x81, 0xd8, 0x79, 0x80]);

        let set = WitnessSet::from_cbor(&bytes).unwrap();
        assert_eq!(set.signatures(), &[sig(1, 1)]);
        assert_eq!(set.to_cbor().unwrap(), bytes);

        let merged = merge_signatures(&set, &[sig(2, 2)]).unwrap();
        let encoded = merged.to_cbor().unwrap();
        assert!(encoded.ends_with(&[0x01, 0x81, 0x82, 0x04, 0x00, 0x04, 0x81, 0xd8, 0x79, 0x80]));
        assert_eq!(WitnessSet::from_cbor(&encoded).unwrap().signatures().len(), 2);
    }

    #[test]
    fn test_malformed_witness_propagates() {
        assert!(WitnessSet::from_hex("a10081820102").is_err());
    }

    #[test]
    fn test_repeated_vkey_witness_key_rejected() {
        // {0: [[vkey, sig]], 0: []}
        let mut bytes = vec![0xa2, 0x00, 0x81, 0x82, 0x58, 0x20];
        bytes.extend([1u8; 32]);
        bytes.extend([0x58, 0x40]);
        bytes.extend([1u8; 64]);
        bytes.extend([0x00, 0x80]);

        assert!(matches!(WitnessSet::from_cbor(&bytes), Err(CodecError::Cbor(_))));
    }
}
