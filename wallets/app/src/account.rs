//! CIP-1852 accounts.

use mesh_common::Address;
use mesh_error::{MeshError, Result};

use crate::keys::{AccountKey, KeyMaterial};

const HARDENED: u32 = 0x8000_0000;

/// `1852'`, the CIP-1852 purpose
pub const PURPOSE: u32 = HARDENED | 1852;

/// `1815'`, the Cardano coin type
pub const COIN_TYPE: u32 = HARDENED | 1815;

const EXTERNAL_CHAIN: u32 = 0;
const STAKING_CHAIN: u32 = 2;

/// Addresses and decrypted keys of one account.
///
/// The keys are wiped when the account is dropped, so keep it no longer than the
/// operation that needed it.
#[derive(Debug)]
pub struct Account {
    /// Payment-only address (`addr` / `addr_test`)
    pub enterprise_address: String,
    /// Payment and stake address
    pub base_address: String,
    /// Stake address (`stake` / `stake_test`)
    pub reward_address: String,
    payment_key: AccountKey,
    stake_key: AccountKey,
}

impl Account {
    pub(crate) fn derive(material: &KeyMaterial, index: u32, network_id: u8) -> Result<Self> {
        let (payment_key, stake_key) = match material.signing_keys()? {
            Some(keys) => keys,
            None => {
                let root = material
                    .root_key()?
                    .map(AccountKey::Extended)
                    .ok_or_else(|| MeshError::KeyDerivation("no root key".to_string()))?;
                let account = root.derive(&[PURPOSE, COIN_TYPE, HARDENED | index])?;
                (account.derive(&[EXTERNAL_CHAIN, 0])?, account.derive(&[STAKING_CHAIN, 0])?)
            }
        };

        let payment_hash = payment_key.key_hash();
        let stake_hash = stake_key.key_hash();
        Ok(Self {
            enterprise_address: Address::enterprise(&payment_hash, network_id).to_bech32()?,
            base_address: Address::base(&payment_hash, &stake_hash, network_id).to_bech32()?,
            reward_address: Address::reward(&stake_hash, network_id).to_bech32()?,
            payment_key,
            stake_key,
        })
    }

    /// Key behind the payment credential
    pub fn payment_key(&self) -> &AccountKey {
        &self.payment_key
    }

    /// Key behind the stake credential
    pub fn stake_key(&self) -> &AccountKey {
        &self.stake_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_common::AddressKind;
    use mesh_testing::EdgeCaseMnemonics;

    fn material() -> KeyMaterial {
        KeyMaterial::mnemonic(&EdgeCaseMnemonics::words(EdgeCaseMnemonics::STANDARD_24)).unwrap()
    }

    #[test]
    fn test_address_kinds() {
        let account = Account::derive(&material(), 0, 0).unwrap();
        assert!(account.enterprise_address.starts_with("addr_test1"));
        assert!(account.reward_address.starts_with("stake_test1"));

        let base = Address::parse(&account.base_address).unwrap();
        assert_eq!(base.kind(), AddressKind::Base);
        assert_eq!(base.payment_key_hash(), Some(account.payment_key().key_hash()));
        assert_eq!(base.stake_key_hash(), Some(account.stake_key().key_hash()));

        let enterprise = Address::parse(&account.enterprise_address).unwrap();
        assert_eq!(enterprise.payment_key_hash(), base.payment_key_hash());
    }

    #[test]
    fn test_accounts_differ() {
        let first = Account::derive(&material(), 0, 1).unwrap();
        let second = Account::derive(&material(), 1, 1).unwrap();
        assert!(first.enterprise_address.starts_with("addr1"));
        assert_ne!(first.enterprise_address, second.enterprise_address);
        assert_ne!(first.payment_key().public_key(), first.stake_key().public_key());
    }

    #[test]
    fn test_cli_account_ignores_path() {
        let material = KeyMaterial::cli(&"33".repeat(32), None).unwrap();
        let account = Account::derive(&material, 0, 0).unwrap();
        let reward = Address::parse(&account.reward_address).unwrap();
        assert_eq!(reward.kind(), AddressKind::Reward);
        assert_eq!(reward.stake_key_hash(), Some(account.stake_key().key_hash()));
    }
}
