//! CIP-8 message signing.
//!
//! `signData` answers with a `COSE_Sign1` structure whose protected header names the
//! signing address, plus the `COSE_Key` of the verification key, both hex CBOR.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use mesh_common::cbor;
use mesh_common::Address;
use mesh_error::CodecError;
use mesh_traits::DataSignature;
use minicbor::data::Type;
use minicbor::Decoder;

use crate::keys::AccountKey;

/// COSE algorithm id for EdDSA
const ALG_EDDSA: i64 = -8;
/// COSE key type OKP
const KTY_OKP: u64 = 1;
/// COSE curve Ed25519
const CRV_ED25519: u64 = 6;

/// Signs `payload` with `key` on behalf of `address`.
pub fn sign_data(key: &AccountKey, address: &Address, payload: &[u8]) -> Result<DataSignature, CodecError> {
    let protected = protected_header(address)?;
    let signature = key.sign(&sig_structure(&protected, payload)?);

    let sign1 = cbor::encode_to_vec(|e| {
        e.array(4)?.bytes(&protected)?;
        e.map(1)?.str("hashed")?.bool(false)?;
        e.bytes(payload)?.bytes(&signature)?;
        Ok(())
    })?;

    Ok(DataSignature {
        signature: hex::encode(sign1),
        key: hex::encode(cose_key(&key.public_key())?),
    })
}

fn protected_header(address: &Address) -> Result<Vec<u8>, CodecError> {
    cbor::encode_to_vec(|e| {
        e.map(2)?;
        e.u8(1)?.i64(ALG_EDDSA)?;
        e.str("address")?.bytes(address.as_bytes())?;
        Ok(())
    })
}

fn sig_structure(protected: &[u8], payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    cbor::encode_to_vec(|e| {
        e.array(4)?.str("Signature1")?.bytes(protected)?.bytes(&[])?.bytes(payload)?;
        Ok(())
    })
}

fn cose_key(public_key: &[u8; 32]) -> Result<Vec<u8>, CodecError> {
    cbor::encode_to_vec(|e| {
        e.map(4)?;
        e.u8(1)?.u64(KTY_OKP)?;
        e.u8(3)?.i64(ALG_EDDSA)?;
        e.i8(-1)?.u64(CRV_ED25519)?;
        e.i8(-2)?.bytes(public_key)?;
        Ok(())
    })
}

/// A decoded `COSE_Sign1`, as returned in [`DataSignature::signature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoseSign1 {
    protected: Vec<u8>,
    address: Option<Vec<u8>>,
    payload: Vec<u8>,
    signature: [u8; 64],
}

impl CoseSign1 {
    /// Parses the hex CBOR form
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let bytes = cbor::decode_hex(s)?;
        cbor::decode_all(&bytes, |d| {
            d.array()?;
            let protected = d.bytes()?.to_vec();
            d.skip()?;
            let payload = d.bytes()?.to_vec();
            let signature = cbor::decode_fixed::<64>(d)?;
            let address = header_address(&protected)?;
            Ok(Self { protected, address, payload, signature })
        })
    }

    /// Address bytes from the protected header
    pub fn address(&self) -> Option<&[u8]> {
        self.address.as_deref()
    }

    /// Signed payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Checks the signature against the key carried in a `COSE_Key` hex string.
    pub fn verify(&self, cose_key_hex: &str) -> Result<bool, CodecError> {
        let public_key = cose_key_public_key(cose_key_hex)?;
        let verifying = VerifyingKey::from_bytes(&public_key)
            .map_err(|e| CodecError::InvalidKey(e.to_string()))?;
        let message = sig_structure(&self.protected, &self.payload)?;
        Ok(verifying.verify(&message, &Signature::from_bytes(&self.signature)).is_ok())
    }
}

fn header_address(protected: &[u8]) -> Result<Option<Vec<u8>>, CodecError> {
    let mut d = Decoder::new(protected);
    let mut address = None;
    let len = d
        .map()?
        .ok_or_else(|| CodecError::Cbor("indefinite protected header".to_string()))?;
    for _ in 0..len {
        match d.datatype()? {
            Type::String => {
                let label = d.str()?;
                if label == "address" {
                    address = Some(d.bytes()?.to_vec());
                } else {
                    d.skip()?;
                }
            }
            _ => {
                d.skip()?;
                d.skip()?;
            }
        }
    }
    Ok(address)
}

/// Verification key carried under label `-2` of a `COSE_Key`.
pub fn cose_key_public_key(cose_key_hex: &str) -> Result<[u8; 32], CodecError> {
    let bytes = cbor::decode_hex(cose_key_hex)?;
    let mut d = Decoder::new(&bytes);
    let len = d.map()?.ok_or_else(|| CodecError::Cbor("indefinite COSE_Key".to_string()))?;
    for _ in 0..len {
        let label = match d.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 | Type::I8 | Type::I16 | Type::I32 | Type::I64 => {
                Some(d.i64()?)
            }
            _ => {
                d.skip()?;
                None
            }
        };
        if label == Some(-2) {
            return cbor::decode_fixed::<32>(&mut d);
        }
        d.skip()?;
    }
    Err(CodecError::InvalidKey("COSE_Key has no public key".to_string()))
}
