//! Shelley and Byron addresses: raw bytes on the wire, bech32 / base58 for humans.

use std::fmt;

use base58::{FromBase58, ToBase58};
use bech32::{Bech32, Hrp};
use crc::{Crc, CRC_32_ISO_HDLC};
use mesh_error::CodecError;
use minicbor::Decoder;

use crate::cbor::TAG_ENCODED_CBOR;
use crate::config::MAINNET_NETWORK_ID;
use crate::hash::Hash28;

/// Address kinds, read from the header nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Payment + staking credential
    Base,
    /// Payment credential + stake pointer
    Pointer,
    /// Payment credential only
    Enterprise,
    /// Legacy bootstrap address
    Byron,
    /// Staking credential only
    Reward,
}

/// A Cardano address in its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    bytes: Vec<u8>,
}

impl Address {
    /// Wraps raw address bytes, checking the header and the payload layout
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CodecError> {
        let header = *bytes.first().ok_or_else(|| CodecError::InvalidAddress {
            address: String::new(),
            reason: "empty address".to_string(),
        })?;
        let checked = match header >> 4 {
            0..=3 => check_length(&bytes, 57),
            6 | 7 | 14 | 15 => check_length(&bytes, 29),
            4 | 5 => check_pointer(&bytes),
            8 => check_byron(&bytes),
            _ => Err(format!("unknown header {header:#04x}")),
        };
        checked.map_err(|reason| CodecError::InvalidAddress { address: hex::encode(&bytes), reason })?;
        Ok(Self { bytes })
    }

    /// Parses hex-encoded address bytes, the form used by CIP-30 wallets
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        Self::from_bytes(hex::decode(s)?)
    }

    /// Parses a bech32 (Shelley) or base58 (Byron) address
    pub fn parse(address: &str) -> Result<Self, CodecError> {
        let invalid = |reason: String| CodecError::InvalidAddress {
            address: address.to_string(),
            reason,
        };

        if address.starts_with("addr") || address.starts_with("stake") {
            let (hrp, data) = bech32::decode(address).map_err(|e| invalid(e.to_string()))?;
            let parsed = Self::from_bytes(data).map_err(|e| invalid(e.to_string()))?;
            if hrp.as_str() != parsed.hrp() {
                return Err(invalid(format!(
                    "prefix '{}' does not match header, expected '{}'",
                    hrp.as_str(),
                    parsed.hrp()
                )));
            }
            return Ok(parsed);
        }

        let bytes = address
            .from_base58()
            .map_err(|e| invalid(format!("invalid base58: {e:?}")))?;
        let parsed = Self::from_bytes(bytes).map_err(|e| invalid(e.to_string()))?;
        if parsed.kind() != AddressKind::Byron {
            return Err(invalid("base58 is only used for Byron addresses".to_string()));
        }
        Ok(parsed)
    }

    /// Enterprise address for a payment key hash
    pub fn enterprise(payment: &Hash28, network_id: u8) -> Self {
        let mut bytes = Vec::with_capacity(29);
        bytes.push(0x60 | (network_id & 0x0f));
        bytes.extend_from_slice(payment);
        Self { bytes }
    }

    /// Base address for a payment key hash and a stake key hash
    pub fn base(payment: &Hash28, stake: &Hash28, network_id: u8) -> Self {
        let mut bytes = Vec::with_capacity(57);
        bytes.push(network_id & 0x0f);
        bytes.extend_from_slice(payment);
        bytes.extend_from_slice(stake);
        Self { bytes }
    }

    /// Reward address for a stake key hash
    pub fn reward(stake: &Hash28, network_id: u8) -> Self {
        let mut bytes = Vec::with_capacity(29);
        bytes.push(0xe0 | (network_id & 0x0f));
        bytes.extend_from_slice(stake);
        Self { bytes }
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex of the raw bytes
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Kind of address
    pub fn kind(&self) -> AddressKind {
        match self.header() >> 4 {
            0..=3 => AddressKind::Base,
            4 | 5 => AddressKind::Pointer,
            6 | 7 => AddressKind::Enterprise,
            8 => AddressKind::Byron,
            _ => AddressKind::Reward,
        }
    }

    /// Network id from the header; Byron addresses report mainnet
    pub fn network_id(&self) -> u8 {
        match self.kind() {
            AddressKind::Byron => MAINNET_NETWORK_ID,
            _ => self.header() & 0x0f,
        }
    }

    /// Payment key hash, when the payment credential is a key
    pub fn payment_key_hash(&self) -> Option<Hash28> {
        match self.kind() {
            AddressKind::Base | AddressKind::Pointer | AddressKind::Enterprise
                if self.header() & 0x10 == 0 =>
            {
                self.bytes.get(1..29).and_then(|h| h.try_into().ok())
            }
            _ => None,
        }
    }

    /// Stake key hash, when the staking credential is a key
    pub fn stake_key_hash(&self) -> Option<Hash28> {
        match self.kind() {
            AddressKind::Base if self.header() & 0x20 == 0 => {
                self.bytes.get(29..57).and_then(|h| h.try_into().ok())
            }
            AddressKind::Reward if self.header() & 0x10 == 0 => {
                self.bytes.get(1..29).and_then(|h| h.try_into().ok())
            }
            _ => None,
        }
    }

    /// Human readable encoding: bech32 for Shelley, base58 for Byron
    pub fn to_bech32(&self) -> Result<String, CodecError> {
        if self.kind() == AddressKind::Byron {
            return Ok(self.bytes.to_base58());
        }
        let invalid = |reason: String| CodecError::InvalidAddress {
            address: self.to_hex(),
            reason,
        };
        let hrp = Hrp::parse(self.hrp()).map_err(|e| invalid(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &self.bytes).map_err(|e| invalid(e.to_string()))
    }

    fn header(&self) -> u8 {
        self.bytes.first().copied().unwrap_or_default()
    }

    fn hrp(&self) -> &'static str {
        let mainnet = self.network_id() == MAINNET_NETWORK_ID;
        match (self.kind(), mainnet) {
            (AddressKind::Reward, true) => "stake",
            (AddressKind::Reward, false) => "stake_test",
            (_, true) => "addr",
            (_, false) => "addr_test",
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(s) => f.write_str(&s),
            Err(_) => f.write_str(&self.to_hex()),
        }
    }
}

impl std::str::FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

const BYRON_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

fn check_length(bytes: &[u8], expected: usize) -> Result<(), String> {
    if bytes.len() != expected {
        return Err(format!("expected {expected} bytes, found {}", bytes.len()));
    }
    Ok(())
}

/// Header, payment credential, then slot, tx index and cert index as base-128 naturals.
fn check_pointer(bytes: &[u8]) -> Result<(), String> {
    let mut rest = bytes.get(29..).ok_or_else(|| "pointer address too short".to_string())?;
    for field in ["slot", "transaction index", "certificate index"] {
        let mut value: u64 = 0;
        loop {
            let (&byte, tail) =
                rest.split_first().ok_or_else(|| format!("truncated pointer {field}"))?;
            rest = tail;
            value = value
                .checked_mul(128)
                .map(|v| v | u64::from(byte & 0x7f))
                .ok_or_else(|| format!("pointer {field} overflows"))?;
            if byte & 0x80 == 0 {
                break;
            }
        }
    }
    if !rest.is_empty() {
        return Err(format!("{} trailing bytes after pointer", rest.len()));
    }
    Ok(())
}

/// `[#6.24(bytes), crc32(bytes)]`
fn check_byron(bytes: &[u8]) -> Result<(), String> {
    let mut d = Decoder::new(bytes);
    let (payload, crc) = byron_envelope(&mut d)
        .map_err(|e| format!("malformed Byron address: {e}"))?
        .ok_or_else(|| "malformed Byron address envelope".to_string())?;
    if d.position() != bytes.len() {
        return Err("trailing bytes after Byron address".to_string());
    }
    let actual = BYRON_CRC.checksum(payload);
    if actual != crc {
        return Err(format!("Byron checksum mismatch: expected {crc:#010x}, found {actual:#010x}"));
    }
    Ok(())
}

fn byron_envelope<'b>(
    d: &mut Decoder<'b>,
) -> Result<Option<(&'b [u8], u32)>, minicbor::decode::Error> {
    if d.array()? != Some(2) || d.tag()?.as_u64() != TAG_ENCODED_CBOR {
        return Ok(None);
    }
    Ok(Some((d.bytes()?, d.u32()?)))
}
