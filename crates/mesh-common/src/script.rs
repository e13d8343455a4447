//! Plutus and native scripts, script references and script hashes.

use mesh_error::CodecError;
use minicbor::Decoder;
use serde::{Deserialize, Serialize};

use crate::cbor::{self, VecEncoder};
use crate::data::MAX_DEPTH;
use crate::hash::{blake2b_224, Hash28};

/// Plutus language versions supported by application scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlutusVersion {
    /// Alonzo
    V1,
    /// Babbage
    V2,
}

/// An application-authored Plutus script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlutusScript {
    /// Language version
    pub version: PlutusVersion,
    /// Hex of the script bytes as they appear in witnesses and references
    pub code: String,
}

impl PlutusScript {
    /// Creates a script from hex code
    pub fn new(version: PlutusVersion, code: impl Into<String>) -> Self {
        Self { version, code: code.into() }
    }

    /// Script hash (and policy id when minting)
    pub fn hash(&self) -> Result<Hash28, CodecError> {
        to_script(self)?.hash()
    }
}

/// A multi-signature / timelock script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NativeScript {
    /// Requires a signature from `key_hash`
    #[serde(rename_all = "camelCase")]
    Sig {
        /// Hex payment key hash
        key_hash: String,
    },
    /// Every sub-script must hold
    All {
        /// Sub-scripts
        scripts: Vec<NativeScript>,
    },
    /// At least one sub-script must hold
    Any {
        /// Sub-scripts
        scripts: Vec<NativeScript>,
    },
    /// At least `required` sub-scripts must hold
    AtLeast {
        /// Threshold
        required: u64,
        /// Sub-scripts
        scripts: Vec<NativeScript>,
    },
    /// Valid strictly before `slot` (invalid hereafter)
    Before {
        /// Slot number
        #[serde(with = "crate::asset::quantity")]
        slot: u64,
    },
    /// Valid from `slot` onwards (invalid before)
    After {
        /// Slot number
        #[serde(with = "crate::asset::quantity")]
        slot: u64,
    },
}

impl NativeScript {
    /// Decodes one native script, nested at most [`MAX_DEPTH`] levels
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        decode_nested(d, 0)
    }

    /// Encodes one native script, nested at most [`MAX_DEPTH`] levels
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        self.encode_nested(e, 0)
    }

    fn encode_nested(&self, e: &mut VecEncoder, depth: usize) -> Result<(), CodecError> {
        check_depth(depth)?;
        match self {
            NativeScript::Sig { key_hash } => {
                let hash = decode_key_hash(key_hash)?;
                e.array(2)?.u8(0)?.bytes(&hash)?;
            }
            NativeScript::All { scripts } => {
                e.array(2)?.u8(1)?;
                encode_scripts(e, scripts, depth + 1)?;
            }
            NativeScript::Any { scripts } => {
                e.array(2)?.u8(2)?;
                encode_scripts(e, scripts, depth + 1)?;
            }
            NativeScript::AtLeast { required, scripts } => {
                e.array(3)?.u8(3)?.u64(*required)?;
                encode_scripts(e, scripts, depth + 1)?;
            }
            NativeScript::After { slot } => {
                e.array(2)?.u8(4)?.u64(*slot)?;
            }
            NativeScript::Before { slot } => {
                e.array(2)?.u8(5)?.u64(*slot)?;
            }
        }
        Ok(())
    }

    /// CBOR bytes
    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        cbor::encode_to_vec(|e| self.encode(e))
    }

    /// Script hash, i.e. the policy id of a minting policy
    pub fn hash(&self) -> Result<Hash28, CodecError> {
        Script::Native(self.clone()).hash()
    }
}

fn decode_key_hash(key_hash: &str) -> Result<Hash28, CodecError> {
    hex::decode(key_hash)
        .ok()
        .and_then(|bytes| Hash28::try_from(bytes.as_slice()).ok())
        .ok_or_else(|| CodecError::InvalidScript(format!("invalid key hash '{key_hash}'")))
}

fn check_depth(depth: usize) -> Result<(), CodecError> {
    if depth > MAX_DEPTH {
        return Err(CodecError::InvalidScript(format!(
            "native script nested deeper than {MAX_DEPTH}"
        )));
    }
    Ok(())
}

fn decode_nested(d: &mut Decoder<'_>, depth: usize) -> Result<NativeScript, CodecError> {
    check_depth(depth)?;
    let nested = |d: &mut Decoder<'_>| decode_nested(d, depth + 1);

    let len = d.array()?;
    let (script, arity) = match d.u8()? {
        0 => {
            let hash = cbor::decode_fixed::<28>(d)?;
            (NativeScript::Sig { key_hash: hex::encode(hash) }, 2)
        }
        1 => (NativeScript::All { scripts: cbor::decode_array(d, nested)? }, 2),
        2 => (NativeScript::Any { scripts: cbor::decode_array(d, nested)? }, 2),
        3 => {
            let required = d.u64()?;
            let scripts = cbor::decode_array(d, nested)?;
            (NativeScript::AtLeast { required, scripts }, 3)
        }
        4 => (NativeScript::After { slot: d.u64()? }, 2),
        5 => (NativeScript::Before { slot: d.u64()? }, 2),
        other => {
            return Err(CodecError::InvalidScript(format!("unknown native script tag {other}")))
        }
    };
    cbor::end_array(d, len, arity)?;
    Ok(script)
}

fn encode_scripts(
    e: &mut VecEncoder,
    scripts: &[NativeScript],
    depth: usize,
) -> Result<(), CodecError> {
    e.array(scripts.len() as u64)?;
    for script in scripts {
        script.encode_nested(e, depth)?;
    }
    Ok(())
}

/// Decodes hex CBOR into a native script.
pub fn from_native_script_cbor(s: &str) -> Result<NativeScript, CodecError> {
    cbor::decode_all(&cbor::decode_hex(s)?, NativeScript::decode)
}

/// Encodes a native script as hex CBOR.
pub fn to_native_script_cbor(script: &NativeScript) -> Result<String, CodecError> {
    Ok(hex::encode(script.to_cbor()?))
}

/// Any script the ledger can reference from an output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Script {
    /// Native script
    Native(NativeScript),
    /// Plutus V1 script bytes
    PlutusV1(Vec<u8>),
    /// Plutus V2 script bytes
    PlutusV2(Vec<u8>),
    /// Plutus V3 script bytes
    PlutusV3(Vec<u8>),
}

impl Script {
    /// Language tag, also the hash prefix
    pub fn language(&self) -> u8 {
        match self {
            Script::Native(_) => 0,
            Script::PlutusV1(_) => 1,
            Script::PlutusV2(_) => 2,
            Script::PlutusV3(_) => 3,
        }
    }

    /// Decodes `[language, script]`
    pub fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = d.array()?;
        let script = match d.u8()? {
            0 => Script::Native(NativeScript::decode(d)?),
            1 => Script::PlutusV1(cbor::decode_bytes(d)?),
            2 => Script::PlutusV2(cbor::decode_bytes(d)?),
            3 => Script::PlutusV3(cbor::decode_bytes(d)?),
            other => return Err(CodecError::InvalidScript(format!("unknown language {other}"))),
        };
        cbor::end_array(d, len, 2)?;
        Ok(script)
    }

    /// Encodes `[language, script]`
    pub fn encode(&self, e: &mut VecEncoder) -> Result<(), CodecError> {
        e.array(2)?.u8(self.language())?;
        match self {
            Script::Native(script) => script.encode(e)?,
            Script::PlutusV1(bytes) | Script::PlutusV2(bytes) | Script::PlutusV3(bytes) => {
                e.bytes(bytes)?;
            }
        }
        Ok(())
    }

    /// Decodes hex CBOR of `[language, script]`
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        cbor::decode_all(&cbor::decode_hex(s)?, Self::decode)
    }

    /// CBOR bytes of `[language, script]`
    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        cbor::encode_to_vec(|e| self.encode(e))
    }

    /// CBOR hex of `[language, script]`
    pub fn to_hex(&self) -> Result<String, CodecError> {
        Ok(hex::encode(self.to_cbor()?))
    }

    /// Blake2b-224 of the language prefix followed by the script bytes
    pub fn hash(&self) -> Result<Hash28, CodecError> {
        let mut preimage = vec![self.language()];
        match self {
            Script::Native(script) => preimage.extend(script.to_cbor()?),
            Script::PlutusV1(bytes) | Script::PlutusV2(bytes) | Script::PlutusV3(bytes) => {
                preimage.extend_from_slice(bytes)
            }
        }
        Ok(blake2b_224(&preimage))
    }
}

/// Reads an application Plutus script out of a ledger script.
pub fn from_script(script: &Script) -> Result<PlutusScript, CodecError> {
    match script {
        Script::PlutusV1(bytes) => Ok(PlutusScript::new(PlutusVersion::V1, hex::encode(bytes))),
        Script::PlutusV2(bytes) => Ok(PlutusScript::new(PlutusVersion::V2, hex::encode(bytes))),
        other => Err(CodecError::InvalidScript(format!(
            "language {} is not a supported Plutus version",
            other.language()
        ))),
    }
}

/// Builds a ledger script from an application Plutus script.
pub fn to_script(script: &PlutusScript) -> Result<Script, CodecError> {
    let bytes = cbor::decode_hex(&script.code)?;
    Ok(match script.version {
        PlutusVersion::V1 => Script::PlutusV1(bytes),
        PlutusVersion::V2 => Script::PlutusV2(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HASH: &str = "1c12f03c1ef2e935acc35ec2e6f96c650fd3bfba3e96550504d53361";

    #[test]
    fn test_native_script_round_trip() {
        let script = NativeScript::All {
            scripts: vec![
                NativeScript::Sig { key_hash: KEY_HASH.to_string() },
                NativeScript::Before { slot: 99_999_999 },
                NativeScript::AtLeast {
                    required: 1,
                    scripts: vec![NativeScript::After { slot: 10 }],
                },
            ],
        };
        let encoded = to_native_script_cbor(&script).unwrap();
        assert_eq!(from_native_script_cbor(&encoded).unwrap(), script);
    }

    #[test]
    fn test_native_sig_encoding() {
        let script = NativeScript::Sig { key_hash: KEY_HASH.to_string() };
        assert_eq!(
            to_native_script_cbor(&script).unwrap(),
            format!("8200581c{KEY_HASH}")
        );
    }

    #[test]
    fn test_native_script_json_shape() {
        let json = r#"{"type":"all","scripts":[{"type":"sig","keyHash":"1c12f03c1ef2e935acc35ec2e6f96c650fd3bfba3e96550504d53361"},{"type":"before","slot":"99999999"}]}"#;
        let script: NativeScript = serde_json::from_str(json).unwrap();
        assert!(matches!(script, NativeScript::All { ref scripts } if scripts.len() == 2));
        assert_eq!(serde_json::to_string(&script).unwrap(), json);
    }

    #[test]
    fn test_invalid_key_hash() {
        let script = NativeScript::Sig { key_hash: "abcd".to_string() };
        assert!(matches!(script.to_cbor(), Err(CodecError::InvalidScript(_))));
    }

    #[test]
    fn test_script_hash_prefix() {
        let code = "4e4d01000033222220051200120011";
        let plutus = PlutusScript::new(PlutusVersion::V1, code);
        let mut preimage = vec![1u8];
        preimage.extend(hex::decode(code).unwrap());
        assert_eq!(plutus.hash().unwrap(), blake2b_224(&preimage));

        let v2 = PlutusScript::new(PlutusVersion::V2, code);
        assert_ne!(v2.hash().unwrap(), plutus.hash().unwrap());
    }

    #[test]
    fn test_script_ref_round_trip() {
        let plutus = PlutusScript::new(PlutusVersion::V2, "4e4d01000033222220051200120011");
        let script = to_script(&plutus).unwrap();
        let hex = script.to_hex().unwrap();
        assert!(hex.starts_with("8202"));
        let decoded = Script::from_hex(&hex).unwrap();
        assert_eq!(from_script(&decoded).unwrap(), plutus);
    }

    #[test]
    fn test_v3_is_not_an_application_script() {
        assert!(from_script(&Script::PlutusV3(vec![1, 2, 3])).is_err());
    }

    fn nest_all(levels: usize) -> NativeScript {
        (0..levels).fold(NativeScript::After { slot: 0 }, |inner, _| NativeScript::All {
            scripts: vec![inner],
        })
    }

    #[test]
    fn test_nesting_limit_round_trip() {
        let script = nest_all(MAX_DEPTH);
        let encoded = to_native_script_cbor(&script).unwrap();
        assert_eq!(from_native_script_cbor(&encoded).unwrap(), script);

        assert!(matches!(nest_all(MAX_DEPTH + 1).to_cbor(), Err(CodecError::InvalidScript(_))));
    }

    #[test]
    fn test_deeply_nested_script_ref_rejected() {
        let levels = 200_000;
        let hex = format!("8200{}820400", "820181".repeat(levels));
        assert!(matches!(Script::from_hex(&hex), Err(CodecError::InvalidScript(_))));

        let just_over = format!("{}820400", "820181".repeat(MAX_DEPTH + 1));
        assert!(from_native_script_cbor(&just_over).is_err());
        let at_limit = format!("{}820400", "820181".repeat(MAX_DEPTH));
        assert_eq!(from_native_script_cbor(&at_limit).unwrap(), nest_all(MAX_DEPTH));
    }
}
