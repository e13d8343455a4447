//! Payment recipients and the outputs built for them.

use mesh_error::CodecError;

use crate::address::Address;
use crate::asset::{self, Asset};
use crate::data::{hash_data, to_plutus_data, Data};
use crate::script::{to_script, PlutusScript};
use crate::utxo::{DatumOption, TransactionOutput};

/// Datum to lock alongside a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientDatum {
    /// The datum
    pub value: Data,
    /// Embed the datum in the output instead of its hash
    pub inline: bool,
}

/// Where, and under which conditions, to send assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A bare address
    Address(String),
    /// An address with an optional datum and reference script
    Detailed {
        /// Destination
        address: String,
        /// Datum to attach
        datum: Option<RecipientDatum>,
        /// Script to publish as a reference script
        script: Option<PlutusScript>,
    },
}

impl Recipient {
    /// Destination address
    pub fn address(&self) -> &str {
        match self {
            Recipient::Address(address) | Recipient::Detailed { address, .. } => address,
        }
    }
}

impl From<&str> for Recipient {
    fn from(address: &str) -> Self {
        Recipient::Address(address.to_string())
    }
}

impl From<String> for Recipient {
    fn from(address: String) -> Self {
        Recipient::Address(address)
    }
}

/// Builds the ledger output paying `assets` to `recipient`.
///
/// A non-inline datum contributes only its hash; attaching the datum itself to the
/// transaction is left to the caller.
pub fn to_tx_build_output(
    recipient: &Recipient,
    assets: &[Asset],
) -> Result<TransactionOutput, CodecError> {
    let mut output = TransactionOutput::new(
        Address::parse(recipient.address())?,
        asset::to_value(assets)?,
    );

    if let Recipient::Detailed { datum, script, .. } = recipient {
        output.datum = datum
            .as_ref()
            .map(|datum| -> Result<DatumOption, CodecError> {
                if datum.inline {
                    Ok(DatumOption::Data(to_plutus_data(&datum.value)?))
                } else {
                    Ok(DatumOption::Hash(hash_data(&datum.value)?))
                }
            })
            .transpose()?;
        output.script_ref = script.as_ref().map(to_script).transpose()?;
    }

    Ok(output)
}
