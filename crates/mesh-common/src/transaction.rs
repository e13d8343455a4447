//! Transactions, decoded only as far as signing needs.
//!
//! The body and auxiliary data are carried as the exact bytes they arrived with, so the
//! transaction id is stable across witness updates.

use mesh_error::CodecError;
use minicbor::data::Type;
use minicbor::Decoder;

use crate::address::Address;
use crate::cbor::{self, VecEncoder};
use crate::hash::{blake2b_256, Hash28, Hash32};
use crate::utxo::TransactionInput;
use crate::witness::WitnessSet;

/// A complete transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    body: Vec<u8>,
    /// Witnesses
    pub witness_set: WitnessSet,
    is_valid: Option<bool>,
    auxiliary_data: Vec<u8>,
}

impl Transaction {
    /// Decodes `[body, witness_set, is_valid?, auxiliary_data / null]`
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = d.array()?;
        let body = cbor::raw_item(d)?.to_vec();
        let witness_set = WitnessSet::decode(d)?;
        let is_valid = match len {
            Some(4) => Some(d.bool()?),
            Some(3) => None,
            None if d.datatype()? == Type::Bool => Some(d.bool()?),
            None => None,
            Some(n) => return Err(CodecError::Cbor(format!("transaction of {n} items"))),
        };
        let auxiliary_data = cbor::raw_item(d)?.to_vec();
        if len.is_none() {
            cbor::expect_break(d)?;
        }
        Ok(Self { body, witness_set, is_valid, auxiliary_data })
    }

    /// Encodes with the original body and auxiliary data bytes
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        e.array(3 + self.is_valid.is_some() as u64)?;
        cbor::write_raw(e, &self.body);
        self.witness_set.encode(e)?;
        if let Some(is_valid) = self.is_valid {
            e.bool(is_valid)?;
        }
        cbor::write_raw(e, &self.auxiliary_data);
        Ok(())
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

    /// Transaction id: Blake2b-256 of the body bytes
    pub fn id(&self) -> Hash32 {
        blake2b_256(&self.body)
    }

    /// Exact body bytes
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// The parts of the body that decide who must sign
    pub fn body(&self) -> Result<TransactionBody, CodecError> {
        cbor::decode_all(&self.body, TransactionBody::decode)
    }

    /// Same transaction with another witness set
    pub fn with_witness_set(&self, witness_set: WitnessSet) -> Self {
        Self { witness_set, ..self.clone() }
    }
}

/// Signing-relevant view of a transaction body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionBody {
    /// Spent inputs
    pub inputs: Vec<TransactionInput>,
    /// Collateral inputs
    pub collateral: Vec<TransactionInput>,
    /// Fee in lovelace
    pub fee: u64,
    /// Reward withdrawals
    pub withdrawals: Vec<(Address, u64)>,
    /// Stake key hashes whose certificates need a witness
    pub certificate_signers: Vec<Hash28>,
    /// Extra signers the scripts expect
    pub required_signers: Vec<Hash28>,
}

impl TransactionBody {
    /// Decodes the fields of interest, skipping the rest
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let mut body = TransactionBody::default();
        let entries = cbor::decode_map(d, cbor::decode_u64, |d| Ok(cbor::raw_item(d)?.to_vec()))?;
        for (key, raw) in entries {
            let mut d = Decoder::new(&raw);
            match key {
                0 => body.inputs = decode_inputs(&mut d)?,
                2 => body.fee = d.u64()?,
                4 => {
                    cbor::skip_set_tag(&mut d)?;
                    for cert in cbor::decode_array(&mut d, |d| Ok(cbor::raw_item(d)?.to_vec()))? {
                        if let Some(hash) = certificate_signer(&cert)? {
                            body.certificate_signers.push(hash);
                        }
                    }
                }
                5 => {
                    body.withdrawals = cbor::decode_map(
                        &mut d,
                        |d| Address::from_bytes(d.bytes()?.to_vec()),
                        cbor::decode_u64,
                    )?
                }
                13 => body.collateral = decode_inputs(&mut d)?,
                14 => {
                    cbor::skip_set_tag(&mut d)?;
                    body.required_signers = cbor::decode_array(&mut d, cbor::decode_fixed::<28>)?;
                }
                _ => {}
            }
        }
        Ok(body)
    }
}

fn decode_inputs(d: &mut Decoder<'_>) -> Result<Vec<TransactionInput>, CodecError> {
    cbor::skip_set_tag(d)?;
    cbor::decode_array(d, TransactionInput::decode)
}

/// Stake key hash a certificate needs a witness from, if any.
///
/// Delegation, deregistration and the Conway stake certificates all carry the stake
/// credential right after the certificate kind.
fn certificate_signer(raw: &[u8]) -> Result<Option<Hash28>, CodecError> {
    let mut d = Decoder::new(raw);
    d.array()?;
    match d.u64()? {
        1 | 2 | 7..=13 => {
            d.array()?;
            match d.u8()? {
                0 => Ok(Some(cbor::decode_fixed::<28>(&mut d)?)),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TESTNET_NETWORK_ID;
    use crate::witness::{merge_signatures, VKeyWitness};

    fn body_bytes() -> Vec<u8> {
        cbor::encode_to_vec(|e| {
            e.map(6)?;
            e.u8(0)?.tag(minicbor::data::Tag::new(258))?.array(1)?;
            e.array(2)?.bytes(&[0xaa; 32])?.u8(0)?;
            e.u8(1)?.array(0)?;
            e.u8(2)?.u64(170_000)?;
            e.u8(4)?.array(1)?;
            e.array(3)?.u8(2)?.array(2)?.u8(0)?.bytes(&[0x55; 28])?.bytes(&[0x99; 28])?;
            e.u8(5)?.map(1)?;
            e.bytes(Address::reward(&[0x55; 28], TESTNET_NETWORK_ID).as_bytes())?.u64(10)?;
            e.u8(14)?.array(1)?.bytes(&[0x77; 28])?;
            Ok(())
        })
        .unwrap()
    }

    fn transaction_bytes() -> Vec<u8> {
        let mut bytes = vec![0x84];
        bytes.extend(body_bytes());
        bytes.extend([0xa0, 0xf5, 0xf6]);
        bytes
    }

    #[test]
    fn test_round_trip_is_byte_exact() {
        let bytes = transaction_bytes();
        let tx = Transaction::from_cbor(&bytes).unwrap();
        assert_eq!(tx.to_cbor().unwrap(), bytes);
        assert_eq!(tx.id(), blake2b_256(&body_bytes()));
    }

    #[test]
    fn test_body_summary() {
        let tx = Transaction::from_cbor(&transaction_bytes()).unwrap();
        let body = tx.body().unwrap();
        assert_eq!(body.inputs.len(), 1);
        assert_eq!(body.inputs[0].transaction_id, [0xaa; 32]);
        assert_eq!(body.fee, 170_000);
        assert_eq!(body.withdrawals.len(), 1);
        assert_eq!(body.withdrawals[0].0.stake_key_hash(), Some([0x55; 28]));
        assert_eq!(body.certificate_signers, vec![[0x55; 28]]);
        assert_eq!(body.required_signers, vec![[0x77; 28]]);
        assert!(body.collateral.is_empty());
    }

    #[test]
    fn test_witness_update_keeps_id() {
        let tx = Transaction::from_cbor(&transaction_bytes()).unwrap();
        let witness = VKeyWitness::new([1; 32], [2; 64]);
        let merged = merge_signatures(&tx.witness_set, &[witness.clone()]).unwrap();
        let signed = tx.with_witness_set(merged);

        let decoded = Transaction::from_hex(&signed.to_hex().unwrap()).unwrap();
        assert_eq!(decoded.id(), tx.id());
        assert_eq!(decoded.witness_set.signatures(), &[witness]);
    }

    #[test]
    fn test_mary_era_layout() {
        let mut bytes = vec![0x83];
        bytes.extend(body_bytes());
        bytes.extend([0xa0, 0xf6]);
        let tx = Transaction::from_cbor(&bytes).unwrap();
        assert_eq!(tx.to_cbor().unwrap(), bytes);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(Transaction::from_hex("8200").is_err());
        assert!(Transaction::from_hex("not hex").is_err());
    }
}
