//! The embedded signer.
//!
//! Key material is encrypted as soon as it is handed over. Every operation that
//! needs a key decrypts it, derives what it needs and drops the plaintext before
//! returning, on error paths included.

use std::collections::HashSet;

use mesh_common::hash::{Hash28, Hash32};
use mesh_common::{Address, AddressKind, Transaction, TransactionInput, UTxO, VKeyWitness, WalletConfig};
use mesh_error::{CodecError, MeshError, Result};
use mesh_traits::DataSignature;
use tracing::debug;

use crate::account::Account;
use crate::cose;
use crate::keys::{self, KeyMaterial};
use crate::vault::EncryptedKey;

/// Password-protected key store able to derive accounts and sign with them.
#[derive(Debug, Clone)]
pub struct EmbeddedWallet {
    network_id: u8,
    account_limit: u32,
    encrypted: EncryptedKey,
    hierarchical: bool,
}

impl EmbeddedWallet {
    /// Encrypts a BIP39 word list
    pub fn encrypt_mnemonic(words: &[String], password: &str, config: &WalletConfig) -> Result<Self> {
        Self::seal(KeyMaterial::mnemonic(words)?, password, config)
    }

    /// Encrypts a bech32 root key (`xprv...`)
    pub fn encrypt_private_key(bech32: &str, password: &str, config: &WalletConfig) -> Result<Self> {
        Self::seal(KeyMaterial::root(bech32)?, password, config)
    }

    /// Encrypts a pair of CLI signing keys; without a stake key a fixed placeholder is used
    pub fn encrypt_signing_keys(
        payment: &str,
        stake: Option<&str>,
        password: &str,
        config: &WalletConfig,
    ) -> Result<Self> {
        Self::seal(KeyMaterial::cli(payment, stake)?, password, config)
    }

    fn seal(material: KeyMaterial, password: &str, config: &WalletConfig) -> Result<Self> {
        let hierarchical = !matches!(material, KeyMaterial::Cli { .. });
        let plaintext = material.to_bytes()?;
        Ok(Self {
            network_id: config.network_id,
            account_limit: config.account_limit,
            encrypted: EncryptedKey::seal(&plaintext, password, config.kdf_iterations)?,
            hierarchical,
        })
    }

    /// Network the addresses are derived for
    pub fn network_id(&self) -> u8 {
        self.network_id
    }

    /// Exclusive bound on account indexes
    pub fn account_limit(&self) -> u32 {
        if self.hierarchical {
            self.account_limit.min(mesh_common::config::HARDENED_ACCOUNT_LIMIT)
        } else {
            1
        }
    }

    /// The encrypted key blob
    pub fn encrypted_key(&self) -> &EncryptedKey {
        &self.encrypted
    }

    /// Decrypts and derives the account at `index`.
    pub fn get_account(&self, index: u32, password: &str) -> Result<Account> {
        let limit = self.account_limit();
        if index >= limit {
            return Err(MeshError::AccountOutOfRange { index, limit });
        }
        let plaintext = self.encrypted.open(password)?;
        let material = KeyMaterial::from_bytes(&plaintext)?;
        Account::derive(&material, index, self.network_id)
    }

    /// CIP-8 signature over the UTF-8 `payload` by the key behind `address`.
    ///
    /// `address` must be one of the account's own addresses.
    pub fn sign_data(&self, index: u32, password: &str, address: &str, payload: &str) -> Result<DataSignature> {
        let account = self.get_account(index, password)?;
        let signer = Address::parse(address)?;

        let key = if signer.payment_key_hash() == Some(account.payment_key().key_hash()) {
            account.payment_key()
        } else if signer.kind() == AddressKind::Reward
            && signer.stake_key_hash() == Some(account.stake_key().key_hash())
        {
            account.stake_key()
        } else {
            return Err(MeshError::rejected(
                "signData",
                format!("address {address} does not belong to account {index}"),
            ));
        };

        debug!(account = index, payload_len = payload.len(), "signing data");
        Ok(cose::sign_data(key, &signer, payload.as_bytes())?)
    }

    /// Witnesses the account can contribute to `unsigned_tx`.
    ///
    /// `utxos` are the account's own outputs; spending or pledging one of them calls
    /// for the payment key. The stake key signs withdrawals and certificates for its
    /// credential. Either key signs when listed as a required signer. Unless
    /// `partial_sign` is set, the account must be able to cover every required signer.
    pub fn sign_tx(
        &self,
        index: u32,
        password: &str,
        utxos: &[UTxO],
        unsigned_tx: &str,
        partial_sign: bool,
    ) -> Result<Vec<VKeyWitness>> {
        let tx = Transaction::from_hex(unsigned_tx)?;
        let body = tx.body()?;
        let account = self.get_account(index, password)?;

        let payment_hash = account.payment_key().key_hash();
        let stake_hash = account.stake_key().key_hash();
        let owned = owned_inputs(utxos)?;

        let spends_owned = body.inputs.iter().chain(&body.collateral).any(|input| owned.contains(input));
        let needs_payment = spends_owned || body.required_signers.contains(&payment_hash);
        let needs_stake = body.withdrawals.iter().any(|(address, _)| address.stake_key_hash() == Some(stake_hash))
            || body.certificate_signers.contains(&stake_hash)
            || body.required_signers.contains(&stake_hash);

        let tx_id = tx.id();
        let mut witnesses = Vec::new();
        if needs_payment {
            let key = account.payment_key();
            witnesses.push(VKeyWitness::new(key.public_key(), key.sign(&tx_id)));
        }
        if needs_stake {
            let key = account.stake_key();
            witnesses.push(VKeyWitness::new(key.public_key(), key.sign(&tx_id)));
        }

        if !partial_sign {
            let missing = missing_signers(&body.required_signers, &[payment_hash, stake_hash]);
            if witnesses.is_empty() || !missing.is_empty() {
                return Err(MeshError::rejected(
                    "signTx",
                    format!(
                        "account {index} cannot complete the transaction ({} required signer(s) missing); use partial signing",
                        missing.len()
                    ),
                ));
            }
        }

        debug!(
            account = index,
            payment = needs_payment,
            stake = needs_stake,
            witnesses = witnesses.len(),
            partial_sign,
            "signed transaction"
        );
        Ok(witnesses)
    }

    /// Generates a new mnemonic with `strength` bits of entropy.
    pub fn generate_mnemonic(strength: usize) -> Result<Vec<String>> {
        keys::generate_mnemonic(strength)
    }
}

fn owned_inputs(utxos: &[UTxO]) -> std::result::Result<HashSet<TransactionInput>, CodecError> {
    utxos
        .iter()
        .map(|utxo| -> std::result::Result<TransactionInput, CodecError> {
            let transaction_id: Hash32 = hex::decode(&utxo.input.tx_hash)?
                .try_into()
                .map_err(|_| CodecError::Cbor("transaction hash must be 32 bytes".to_string()))?;
            Ok(TransactionInput { transaction_id, index: u64::from(utxo.input.output_index) })
        })
        .collect()
}

fn missing_signers(required: &[Hash28], own: &[Hash28]) -> Vec<Hash28> {
    required.iter().filter(|hash| !own.contains(*hash)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_testing::{utxo, EdgeCaseMnemonics, TxFixture, TEST_PASSWORD};

    fn config() -> WalletConfig {
        WalletConfig::testnet().with_kdf_iterations(1_000)
    }

    fn wallet() -> EmbeddedWallet {
        let words = EdgeCaseMnemonics::words(EdgeCaseMnemonics::STANDARD_24);
        EmbeddedWallet::encrypt_mnemonic(&words, TEST_PASSWORD, &config()).unwrap()
    }

    #[test]
    fn test_account_is_deterministic() {
        let wallet = wallet();
        let first = wallet.get_account(0, TEST_PASSWORD).unwrap();
        let again = wallet.get_account(0, TEST_PASSWORD).unwrap();
        assert_eq!(first.enterprise_address, again.enterprise_address);

        let other = EmbeddedWallet::encrypt_mnemonic(
            &EdgeCaseMnemonics::words(EdgeCaseMnemonics::STANDARD_24),
            "another password",
            &config(),
        )
        .unwrap();
        assert_eq!(other.get_account(0, "another password").unwrap().enterprise_address, first.enterprise_address);
    }

    #[test]
    fn test_wrong_password() {
        let err = wallet().get_account(0, "wrong").unwrap_err();
        assert!(matches!(err, MeshError::DecryptionFailed));
    }

    #[test]
    fn test_account_out_of_range() {
        let wallet = EmbeddedWallet::encrypt_mnemonic(
            &EdgeCaseMnemonics::words(EdgeCaseMnemonics::STANDARD_12),
            TEST_PASSWORD,
            &config().with_account_limit(2),
        )
        .unwrap();
        assert!(wallet.get_account(1, TEST_PASSWORD).is_ok());
        assert!(matches!(
            wallet.get_account(2, TEST_PASSWORD),
            Err(MeshError::AccountOutOfRange { index: 2, limit: 2 })
        ));
    }

    #[test]
    fn test_cli_wallet_single_account() {
        let wallet = EmbeddedWallet::encrypt_signing_keys(&"44".repeat(32), None, TEST_PASSWORD, &config()).unwrap();
        assert_eq!(wallet.account_limit(), 1);
        assert!(matches!(
            wallet.get_account(1, TEST_PASSWORD),
            Err(MeshError::AccountOutOfRange { index: 1, limit: 1 })
        ));
    }

    #[test]
    fn test_sign_tx_spending_owned_utxo() {
        let wallet = wallet();
        let account = wallet.get_account(0, TEST_PASSWORD).unwrap();
        let owned = utxo(1, 0, &account.enterprise_address, 5_000_000);
        let tx = TxFixture::new().spending(&owned).fee(170_000);

        let witnesses = wallet.sign_tx(0, TEST_PASSWORD, &[owned], &tx.to_hex(), false).unwrap();
        assert_eq!(witnesses.len(), 1);
        assert_eq!(witnesses[0].vkey, account.payment_key().public_key());
    }

    #[test]
    fn test_sign_tx_withdrawal_uses_stake_key() {
        let wallet = wallet();
        let account = wallet.get_account(0, TEST_PASSWORD).unwrap();
        let owned = utxo(1, 0, &account.enterprise_address, 5_000_000);
        let reward = Address::parse(&account.reward_address).unwrap();
        let tx = TxFixture::new().spending(&owned).withdrawal(reward, 1_000_000);

        let witnesses = wallet.sign_tx(0, TEST_PASSWORD, &[owned], &tx.to_hex(), false).unwrap();
        let vkeys: Vec<_> = witnesses.iter().map(|w| w.vkey).collect();
        assert_eq!(vkeys, vec![account.payment_key().public_key(), account.stake_key().public_key()]);
    }

    #[test]
    fn test_sign_tx_nothing_to_sign() {
        let wallet = wallet();
        let tx = TxFixture::new().input([7; 32], 0).to_hex();

        let err = wallet.sign_tx(0, TEST_PASSWORD, &[], &tx, false).unwrap_err();
        assert!(matches!(err, MeshError::BackendRejection { ref operation, .. } if operation == "signTx"));
        assert!(wallet.sign_tx(0, TEST_PASSWORD, &[], &tx, true).unwrap().is_empty());
    }

    #[test]
    fn test_sign_tx_foreign_required_signer() {
        let wallet = wallet();
        let account = wallet.get_account(0, TEST_PASSWORD).unwrap();
        let owned = utxo(1, 0, &account.enterprise_address, 5_000_000);
        let tx = TxFixture::new().spending(&owned).required_signer([0x99; 28]).to_hex();

        assert!(wallet.sign_tx(0, TEST_PASSWORD, &[owned.clone()], &tx, false).is_err());
        let partial = wallet.sign_tx(0, TEST_PASSWORD, &[owned], &tx, true).unwrap();
        assert_eq!(partial.len(), 1);
    }

    #[test]
    fn test_sign_data_unknown_address() {
        let wallet = wallet();
        let foreign = mesh_testing::enterprise_bech32(9, 0);
        let err = wallet.sign_data(0, TEST_PASSWORD, &foreign, "hello").unwrap_err();
        assert!(matches!(err, MeshError::BackendRejection { .. }));
    }

    #[test]
    fn test_sign_data_reward_address_uses_stake_key() {
        let wallet = wallet();
        let account = wallet.get_account(0, TEST_PASSWORD).unwrap();
        let signed = wallet.sign_data(0, TEST_PASSWORD, &account.reward_address, "hello").unwrap();
        assert_eq!(cose::cose_key_public_key(&signed.key).unwrap(), account.stake_key().public_key());
    }
}
