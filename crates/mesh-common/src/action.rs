//! Redeemers: the Data and execution budget handed to a script at a given purpose.

use mesh_error::CodecError;
use minicbor::Decoder;
use serde::{Deserialize, Serialize};

use crate::cbor::{self, VecEncoder};
use crate::data::Data;

/// What the redeemer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedeemerTag {
    /// Spending a script-locked input
    Spend,
    /// Minting under a script policy
    Mint,
    /// Certificate authorised by a script
    Cert,
    /// Withdrawal from a script stake address
    Reward,
}

impl RedeemerTag {
    fn to_u8(self) -> u8 {
        match self {
            RedeemerTag::Spend => 0,
            RedeemerTag::Mint => 1,
            RedeemerTag::Cert => 2,
            RedeemerTag::Reward => 3,
        }
    }

    fn from_u8(tag: u8) -> Result<Self, CodecError> {
        match tag {
            0 => Ok(RedeemerTag::Spend),
            1 => Ok(RedeemerTag::Mint),
            2 => Ok(RedeemerTag::Cert),
            3 => Ok(RedeemerTag::Reward),
            other => Err(CodecError::Cbor(format!("unsupported redeemer tag {other}"))),
        }
    }
}

/// Execution units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Budget {
    /// Memory units
    pub mem: u64,
    /// CPU steps
    pub steps: u64,
}

/// A redeemer as authored by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Redeemer value
    pub data: Data,
    /// Index of the input / policy / certificate / withdrawal it applies to
    pub index: u32,
    /// Execution budget
    pub budget: Budget,
    /// Purpose
    pub tag: RedeemerTag,
}

impl Action {
    /// Encodes `[tag, index, data, [mem, steps]]`
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        e.array(4)?.u8(self.tag.to_u8())?.u32(self.index)?;
        self.data.encode(e)?;
        e.array(2)?.u64(self.budget.mem)?.u64(self.budget.steps)?;
        Ok(())
    }

    /// Decodes `[tag, index, data, [mem, steps]]`
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = d.array()?;
        let tag = RedeemerTag::from_u8(d.u8()?)?;
        let index = d.u32()?;
        let data = Data::decode(d)?;
        let units = d.array()?;
        let budget = Budget { mem: d.u64()?, steps: d.u64()? };
        cbor::end_array(d, units, 2)?;
        cbor::end_array(d, len, 4)?;
        Ok(Self { data, index, budget, tag })
    }
}

/// Encodes an action as a ledger redeemer.
pub fn to_tx_redeemer(action: &Action) -> Result<Vec<u8>, CodecError> {
    cbor::encode_to_vec(|e| action.encode(e))
}

/// Decodes a ledger redeemer.
pub fn from_tx_redeemer(bytes: &[u8]) -> Result<Action, CodecError> {
    cbor::decode_all(bytes, Action::decode)
}
