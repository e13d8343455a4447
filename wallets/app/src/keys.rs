//! Key material accepted by the embedded signer, and the signing handles derived from it.

use bech32::Hrp;
use bip39::{Language, Mnemonic};
use ed25519_bip32::{DerivationScheme, XPrv, XPRV_SIZE};
use ed25519_dalek::{Signer, SigningKey};
use hmac::Hmac;
use mesh_common::hash::{key_hash, Hash28};
use mesh_error::{CodecError, MeshError, Result};
use pbkdf2::pbkdf2;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Rounds of the Icarus master key derivation
const ICARUS_ROUNDS: u32 = 4096;

/// Stake key used when a CLI wallet has none
pub const PLACEHOLDER_STAKE_KEY: [u8; 32] = [0xf0; 32];

/// Plaintext held inside an encrypted key blob.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(tag = "type", rename_all = "camelCase")]
pub(crate) enum KeyMaterial {
    /// Space separated BIP39 words
    Mnemonic { phrase: String },
    /// Hex of a 96-byte BIP32-Ed25519 root key
    Root { xprv: String },
    /// Hex of two 32-byte Ed25519 signing keys
    Cli { payment: String, stake: String },
}

impl KeyMaterial {
    /// Validates a word list and normalizes its spacing
    pub(crate) fn mnemonic(words: &[String]) -> Result<Self> {
        let phrase = Zeroizing::new(words.join(" "));
        let mnemonic = parse_mnemonic(&phrase)?;
        Ok(KeyMaterial::Mnemonic { phrase: mnemonic.to_string() })
    }

    /// Accepts a bech32 `xprv` / `root_xsk` string
    pub(crate) fn root(bech32: &str) -> Result<Self> {
        let (hrp, bytes) = bech32::decode(bech32)
            .map_err(|e| CodecError::InvalidKey(format!("root key: {e}")))?;
        let bytes = Zeroizing::new(bytes);
        if hrp != Hrp::parse_unchecked("xprv") && hrp != Hrp::parse_unchecked("root_xsk") {
            return Err(CodecError::InvalidKey(format!("unexpected root key prefix '{hrp}'")).into());
        }
        xprv_from_slice(&bytes)?;
        Ok(KeyMaterial::Root { xprv: hex::encode(bytes.as_slice()) })
    }

    /// Accepts CLI `cborHex` signing keys, or raw 32-byte hex
    pub(crate) fn cli(payment: &str, stake: Option<&str>) -> Result<Self> {
        let payment = cli_key_bytes(payment)?;
        let stake = match stake {
            Some(stake) => cli_key_bytes(stake)?,
            None => Zeroizing::new(PLACEHOLDER_STAKE_KEY),
        };
        Ok(KeyMaterial::Cli {
            payment: hex::encode(payment.as_slice()),
            stake: hex::encode(stake.as_slice()),
        })
    }

    pub(crate) fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        serde_json::to_vec(self)
            .map(Zeroizing::new)
            .map_err(|e| MeshError::KeyDerivation(e.to_string()))
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| MeshError::KeyDerivation(e.to_string()))
    }

    /// BIP32-Ed25519 root, if the material is hierarchical
    pub(crate) fn root_key(&self) -> Result<Option<XPrv>> {
        match self {
            KeyMaterial::Mnemonic { phrase } => {
                let entropy = Zeroizing::new(parse_mnemonic(phrase)?.to_entropy());
                Ok(Some(icarus_root(&entropy)?))
            }
            KeyMaterial::Root { xprv } => {
                let bytes = Zeroizing::new(hex::decode(xprv).map_err(CodecError::from)?);
                Ok(Some(xprv_from_slice(&bytes)?))
            }
            KeyMaterial::Cli { .. } => Ok(None),
        }
    }

    /// Payment and stake keys of a CLI wallet
    pub(crate) fn signing_keys(&self) -> Result<Option<(AccountKey, AccountKey)>> {
        match self {
            KeyMaterial::Cli { payment, stake } => Ok(Some((
                AccountKey::Plain(signing_key_from_hex(payment)?),
                AccountKey::Plain(signing_key_from_hex(stake)?),
            ))),
            _ => Ok(None),
        }
    }
}

/// A decrypted signing key. Dropping it wipes the secret.
pub enum AccountKey {
    /// Key derived along a BIP32-Ed25519 path
    Extended(XPrv),
    /// Plain Ed25519 key
    Plain(SigningKey),
}

impl AccountKey {
    /// Ed25519 verification key
    pub fn public_key(&self) -> [u8; 32] {
        match self {
            AccountKey::Extended(xprv) => xprv.public().public_key(),
            AccountKey::Plain(key) => key.verifying_key().to_bytes(),
        }
    }

    /// Blake2b-224 of the verification key
    pub fn key_hash(&self) -> Hash28 {
        key_hash(&self.public_key())
    }

    /// Ed25519 signature over `message`
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let mut out = [0u8; 64];
        match self {
            AccountKey::Extended(xprv) => {
                let signature = xprv.sign::<Vec<u8>>(message);
                out.copy_from_slice(&signature.to_bytes()[..]);
            }
            AccountKey::Plain(key) => out.copy_from_slice(&key.sign(message).to_bytes()),
        }
        out
    }

    pub(crate) fn derive(&self, path: &[u32]) -> Result<AccountKey> {
        match self {
            AccountKey::Extended(xprv) => {
                let derived = path
                    .iter()
                    .fold(xprv.clone(), |key, index| key.derive(DerivationScheme::V2, *index));
                Ok(AccountKey::Extended(derived))
            }
            AccountKey::Plain(_) => {
                Err(MeshError::KeyDerivation("plain keys cannot be derived".to_string()))
            }
        }
    }
}

impl std::fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountKey")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

/// Generates a mnemonic of `strength` bits of entropy.
pub fn generate_mnemonic(strength: usize) -> Result<Vec<String>> {
    if !matches!(strength, 128 | 160 | 192 | 224 | 256) {
        return Err(MeshError::KeyDerivation(format!(
            "mnemonic strength must be one of 128, 160, 192, 224, 256; got {strength}"
        )));
    }
    let mut entropy = Zeroizing::new(vec![0u8; strength / 8]);
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, entropy.as_mut_slice());
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| MeshError::KeyDerivation(e.to_string()))?;
    let phrase = Zeroizing::new(mnemonic.to_string());
    Ok(phrase.split_whitespace().map(str::to_string).collect())
}

fn parse_mnemonic(phrase: &str) -> Result<Mnemonic> {
    Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| CodecError::InvalidKey(format!("mnemonic: {e}")).into())
}

/// Icarus master key: PBKDF2-HMAC-SHA512 over the entropy with an empty passphrase.
fn icarus_root(entropy: &[u8]) -> Result<XPrv> {
    let mut seed = Zeroizing::new([0u8; XPRV_SIZE]);
    pbkdf2::<Hmac<Sha512>>(b"", entropy, ICARUS_ROUNDS, seed.as_mut_slice())
        .map_err(|e| MeshError::KeyDerivation(e.to_string()))?;
    Ok(XPrv::normalize_bytes_force3rd(*seed))
}

fn xprv_from_slice(bytes: &[u8]) -> Result<XPrv> {
    let bytes: [u8; XPRV_SIZE] = bytes.try_into().map_err(|_| {
        CodecError::InvalidKey(format!("root key must be {XPRV_SIZE} bytes, got {}", bytes.len()))
    })?;
    let bytes = Zeroizing::new(bytes);
    XPrv::from_bytes_verified(*bytes)
        .map_err(|e| CodecError::InvalidKey(format!("root key: {e}")).into())
}

/// `5820 <32 bytes>` as written by cardano-cli, or the bare 32 bytes.
fn cli_key_bytes(key: &str) -> Result<Zeroizing<[u8; 32]>> {
    let bytes = Zeroizing::new(hex::decode(key).map_err(CodecError::from)?);
    let secret = match bytes.len() {
        34 => &bytes[2..],
        32 => &bytes[..],
        n => {
            return Err(CodecError::InvalidKey(format!("signing key must be 32 bytes, got {n}")).into())
        }
    };
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(secret);
    Ok(out)
}

fn signing_key_from_hex(key: &str) -> Result<SigningKey> {
    Ok(SigningKey::from_bytes(&*cli_key_bytes(key)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::Bech32;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    use mesh_testing::EdgeCaseMnemonics;

    #[test]
    fn test_mnemonic_normalized() {
        let messy = format!("  {}  ", EdgeCaseMnemonics::STANDARD_12.replace(' ', "  "));
        let material = KeyMaterial::mnemonic(&EdgeCaseMnemonics::words(&messy)).unwrap();
        match &material {
            KeyMaterial::Mnemonic { phrase } => assert_eq!(phrase, EdgeCaseMnemonics::STANDARD_12),
            _ => panic!("expected mnemonic"),
        }
    }

    #[test]
    fn test_invalid_mnemonic() {
        for phrase in EdgeCaseMnemonics::invalid() {
            assert!(KeyMaterial::mnemonic(&EdgeCaseMnemonics::words(phrase)).is_err(), "{phrase}");
        }
    }

    #[test]
    fn test_root_key_matches_mnemonic() {
        let material = KeyMaterial::mnemonic(&EdgeCaseMnemonics::words(EdgeCaseMnemonics::STANDARD_24)).unwrap();
        let root = material.root_key().unwrap().unwrap();

        let encoded = bech32::encode::<Bech32>(Hrp::parse("xprv").unwrap(), root.as_ref()).unwrap();
        let from_bech32 = KeyMaterial::root(&encoded).unwrap().root_key().unwrap().unwrap();
        assert_eq!(from_bech32.public().public_key(), root.public().public_key());
    }

    #[test]
    fn test_root_key_rejects_wrong_prefix() {
        let encoded = bech32::encode::<Bech32>(Hrp::parse("xpub").unwrap(), &[0u8; 96]).unwrap();
        assert!(KeyMaterial::root(&encoded).is_err());
        let short = bech32::encode::<Bech32>(Hrp::parse("xprv").unwrap(), &[0u8; 64]).unwrap();
        assert!(KeyMaterial::root(&short).is_err());
    }

    #[test]
    fn test_cli_keys() {
        let payment = format!("5820{}", "11".repeat(32));
        let material = KeyMaterial::cli(&payment, None).unwrap();
        let (payment_key, stake_key) = material.signing_keys().unwrap().unwrap();

        let expected = SigningKey::from_bytes(&[0x11; 32]).verifying_key().to_bytes();
        assert_eq!(payment_key.public_key(), expected);
        let placeholder = SigningKey::from_bytes(&PLACEHOLDER_STAKE_KEY).verifying_key().to_bytes();
        assert_eq!(stake_key.public_key(), placeholder);
        assert!(material.root_key().unwrap().is_none());

        assert!(KeyMaterial::cli("abcd", None).is_err());
    }

    #[test]
    fn test_cli_placeholder_form_accepted() {
        let stake = "f0".repeat(34);
        let material = KeyMaterial::cli(&"22".repeat(32), Some(&stake)).unwrap();
        let (_, stake_key) = material.signing_keys().unwrap().unwrap();
        let placeholder = SigningKey::from_bytes(&PLACEHOLDER_STAKE_KEY).verifying_key().to_bytes();
        assert_eq!(stake_key.public_key(), placeholder);
    }

    #[test]
    fn test_material_serde_round_trip() {
        let material = KeyMaterial::cli(&"22".repeat(32), None).unwrap();
        let bytes = material.to_bytes().unwrap();
        let parsed = KeyMaterial::from_bytes(&bytes).unwrap();
        assert!(matches!(parsed, KeyMaterial::Cli { .. }));
        assert!(String::from_utf8_lossy(&bytes).contains("\"type\":\"cli\""));
    }

    #[test]
    fn test_extended_key_signs() {
        let material = KeyMaterial::mnemonic(&EdgeCaseMnemonics::words(EdgeCaseMnemonics::STANDARD_12)).unwrap();
        let key = AccountKey::Extended(material.root_key().unwrap().unwrap())
            .derive(&[0x8000_0000 | 1852, 0x8000_0000 | 1815, 0x8000_0000, 0, 0])
            .unwrap();

        let signature = key.sign(b"mesh");
        let verifying = VerifyingKey::from_bytes(&key.public_key()).unwrap();
        assert!(verifying.verify(b"mesh", &Signature::from_bytes(&signature)).is_ok());
    }

    #[test]
    fn test_plain_key_cannot_derive() {
        let key = AccountKey::Plain(SigningKey::from_bytes(&[7; 32]));
        assert!(key.derive(&[0]).is_err());
    }

    #[test]
    fn test_generate_mnemonic_strengths() {
        for (strength, count) in [(128, 12), (160, 15), (192, 18), (224, 21), (256, 24)] {
            let words = generate_mnemonic(strength).unwrap();
            assert_eq!(words.len(), count);
            assert!(KeyMaterial::mnemonic(&words).is_ok());
        }
        assert!(generate_mnemonic(100).is_err());
    }
}
