//! Blake2b digests used by the ledger.

use blake2::digest::consts::{U20, U28, U32};
use blake2::{Blake2b, Digest};

/// 28-byte hash: key hashes, script hashes, policy ids
pub type Hash28 = [u8; 28];

/// 32-byte hash: transaction ids, datum hashes
pub type Hash32 = [u8; 32];

/// Blake2b-224 of `data`
pub fn blake2b_224(data: &[u8]) -> Hash28 {
    let mut hash = [0u8; 28];
    hash.copy_from_slice(&Blake2b::<U28>::digest(data));
    hash
}

/// Blake2b-256 of `data`
pub fn blake2b_256(data: &[u8]) -> Hash32 {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Blake2b::<U32>::digest(data));
    hash
}

/// Blake2b-160 of `data`
pub fn blake2b_160(data: &[u8]) -> [u8; 20] {
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&Blake2b::<U20>::digest(data));
    hash
}

/// Hash of a verification key, as found in addresses and required signers
pub fn key_hash(public_key: &[u8]) -> Hash28 {
    blake2b_224(public_key)
}
