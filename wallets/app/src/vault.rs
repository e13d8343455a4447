//! Password-based encryption of key material.
//!
//! Layout of a sealed blob: `iterations (u32 BE) | salt (16) | nonce (12) | ciphertext`,
//! where the ciphertext carries the AES-GCM tag. The key is PBKDF2-HMAC-SHA256 of the
//! password over the salt.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hmac::Hmac;
use mesh_error::{CodecError, MeshError, Result};
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;
const HEADER_SIZE: usize = 4 + SALT_SIZE + NONCE_SIZE;

/// Ciphertext of a wallet's key material.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedKey {
    iterations: u32,
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
    ciphertext: Vec<u8>,
}

impl EncryptedKey {
    /// Encrypts `plaintext` under `password` with a fresh salt and nonce.
    pub fn seal(plaintext: &[u8], password: &str, iterations: u32) -> Result<Self> {
        let mut salt = [0u8; SALT_SIZE];
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);

        let key = derive_key(password, &salt, iterations)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| MeshError::KeyDerivation("encryption failed".to_string()))?;

        Ok(Self { iterations, salt, nonce, ciphertext })
    }

    /// Decrypts, failing with [`MeshError::DecryptionFailed`] on a wrong password or
    /// tampered ciphertext.
    pub fn open(&self, password: &str) -> Result<Zeroizing<Vec<u8>>> {
        let key = derive_key(password, &self.salt, self.iterations)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
        cipher
            .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_slice())
            .map(Zeroizing::new)
            .map_err(|_| MeshError::DecryptionFailed)
    }

    /// PBKDF2 iteration count used for this blob
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Serialized blob
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.iterations.to_be_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parses a serialized blob
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        if bytes.len() <= HEADER_SIZE {
            return Err(CodecError::InvalidKey("encrypted key too short".to_string()));
        }
        let (iterations, rest) = bytes.split_at(4);
        let (salt, rest) = rest.split_at(SALT_SIZE);
        let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

        let mut iteration_bytes = [0u8; 4];
        iteration_bytes.copy_from_slice(iterations);
        let mut out = Self {
            iterations: u32::from_be_bytes(iteration_bytes),
            salt: [0u8; SALT_SIZE],
            nonce: [0u8; NONCE_SIZE],
            ciphertext: ciphertext.to_vec(),
        };
        out.salt.copy_from_slice(salt);
        out.nonce.copy_from_slice(nonce);
        Ok(out)
    }

    /// Hex of [`to_bytes`](Self::to_bytes)
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses the hex form
    pub fn from_hex(s: &str) -> std::result::Result<Self, CodecError> {
        Self::from_bytes(&hex::decode(s)?)
    }
}

impl std::fmt::Debug for EncryptedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedKey")
            .field("iterations", &self.iterations)
            .field("len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, iterations, key.as_mut_slice())
        .map_err(|e| MeshError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITERATIONS: u32 = 1_000;

    #[test]
    fn test_seal_open() {
        let sealed = EncryptedKey::seal(b"secret words", "password", ITERATIONS).unwrap();
        assert_eq!(sealed.open("password").unwrap().as_slice(), b"secret words");
        assert!(!sealed.to_bytes().windows(12).any(|w| w == b"secret words"));
    }

    #[test]
    fn test_wrong_password() {
        let sealed = EncryptedKey::seal(b"secret", "password", ITERATIONS).unwrap();
        assert!(matches!(sealed.open("Password"), Err(MeshError::DecryptionFailed)));
    }

    #[test]
    fn test_tampered_ciphertext() {
        let mut bytes = EncryptedKey::seal(b"secret", "password", ITERATIONS).unwrap().to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = EncryptedKey::from_bytes(&bytes).unwrap();
        assert!(matches!(tampered.open("password"), Err(MeshError::DecryptionFailed)));
    }

    #[test]
    fn test_fresh_salt_and_nonce() {
        let a = EncryptedKey::seal(b"secret", "password", ITERATIONS).unwrap();
        let b = EncryptedKey::seal(b"secret", "password", ITERATIONS).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_round_trip() {
        let sealed = EncryptedKey::seal(b"secret", "password", ITERATIONS).unwrap();
        let parsed = EncryptedKey::from_hex(&sealed.to_hex()).unwrap();
        assert_eq!(parsed.iterations(), ITERATIONS);
        assert_eq!(parsed.open("password").unwrap().as_slice(), b"secret");
        assert!(EncryptedKey::from_bytes(&[0u8; 8]).is_err());
    }
}
