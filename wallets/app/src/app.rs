use std::sync::Arc;

use async_trait::async_trait;
use mesh_common::{
    merge_assets, merge_signatures, select_collateral, to_tx_unspent_output, Address, Asset,
    Transaction, TxUnspentOutput, UTxO, WalletConfig,
};
use mesh_error::{MeshError, OperationContext, Result};
use mesh_traits::{DataSignature, Fetcher, Submitter, Wallet};
use tracing::debug;

use crate::embedded::EmbeddedWallet;

/// Password the application wallet keeps its key material under.
pub const DEFAULT_PASSWORD: &str = "MARI0TIME";

/// Default entropy of [`AppWallet::brew`]
pub const DEFAULT_STRENGTH: usize = 256;

/// Key material an [`AppWallet`] can be created from.
#[derive(Clone)]
pub enum AppWalletKey {
    /// BIP39 words
    Mnemonic(Vec<String>),
    /// Bech32 root key
    Root(String),
    /// cardano-cli signing keys (`cborHex`)
    Cli {
        /// Payment signing key
        payment: String,
        /// Stake signing key
        stake: Option<String>,
    },
}

impl std::fmt::Debug for AppWalletKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            AppWalletKey::Mnemonic(_) => "Mnemonic",
            AppWalletKey::Root(_) => "Root",
            AppWalletKey::Cli { .. } => "Cli",
        };
        f.debug_tuple("AppWalletKey").field(&kind).finish()
    }
}

/// Everything an [`AppWallet`] needs.
#[derive(Clone)]
pub struct AppWalletOptions {
    /// Network and limits
    pub config: WalletConfig,
    /// Source of the wallet's UTxOs
    pub fetcher: Arc<dyn Fetcher>,
    /// Where signed transactions go
    pub submitter: Arc<dyn Submitter>,
    /// Key material
    pub key: AppWalletKey,
}

impl AppWalletOptions {
    /// Options with the default mainnet configuration
    pub fn new(fetcher: Arc<dyn Fetcher>, submitter: Arc<dyn Submitter>, key: AppWalletKey) -> Self {
        Self { config: WalletConfig::default(), fetcher, submitter, key }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: WalletConfig) -> Self {
        self.config = config;
        self
    }
}

/// Wallet for applications that sign on their own behalf: minting scripts,
/// multi-signature flows, back ends.
///
/// Account `0` answers the [`Wallet`] contract; the `*_with` methods take any account.
#[derive(Clone)]
pub struct AppWallet {
    config: WalletConfig,
    fetcher: Arc<dyn Fetcher>,
    submitter: Arc<dyn Submitter>,
    wallet: EmbeddedWallet,
}

impl AppWallet {
    /// Encrypts the key material and wires up the collaborators.
    pub fn new(options: AppWalletOptions) -> Result<Self> {
        let config = &options.config;
        let wallet = match &options.key {
            AppWalletKey::Mnemonic(words) => EmbeddedWallet::encrypt_mnemonic(words, DEFAULT_PASSWORD, config),
            AppWalletKey::Root(bech32) => EmbeddedWallet::encrypt_private_key(bech32, DEFAULT_PASSWORD, config),
            AppWalletKey::Cli { payment, stake } => {
                EmbeddedWallet::encrypt_signing_keys(payment, stake.as_deref(), DEFAULT_PASSWORD, config)
            }
        }?;
        debug!(key = ?options.key, network_id = config.network_id, "app wallet created");

        Ok(Self {
            config: options.config,
            fetcher: options.fetcher,
            submitter: options.submitter,
            wallet,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// The underlying signer
    pub fn embedded(&self) -> &EmbeddedWallet {
        &self.wallet
    }

    /// Enterprise address of account `account_index`
    pub fn get_payment_address(&self, account_index: u32) -> Result<String> {
        let account = self.wallet.get_account(account_index, DEFAULT_PASSWORD)?;
        Ok(account.enterprise_address.clone())
    }

    /// Reward address of account `account_index`
    pub fn get_reward_address(&self, account_index: u32) -> Result<String> {
        let account = self.wallet.get_account(account_index, DEFAULT_PASSWORD)?;
        Ok(account.reward_address.clone())
    }

    /// Enterprise address of account `account_index`, in ledger form
    pub fn get_used_address(&self, account_index: u32) -> Result<Address> {
        Ok(Address::parse(&self.get_payment_address(account_index)?)?)
    }

    /// UTxOs of account `account_index`, in ledger form
    pub async fn get_used_utxos(&self, account_index: u32) -> Result<Vec<TxUnspentOutput>> {
        let utxos = self.fetch_utxos(account_index).await?;
        utxos
            .iter()
            .map(|utxo| to_tx_unspent_output(utxo).map_err(MeshError::from))
            .collect()
    }

    /// Signs `payload` with the key behind `address`, one of account `account_index`'s addresses.
    pub fn sign_data_with(&self, address: &str, payload: &str, account_index: u32) -> Result<DataSignature> {
        self.wallet
            .sign_data(account_index, DEFAULT_PASSWORD, address, payload)
            .during("signData")
    }

    /// Adds account `account_index`'s witnesses to `unsigned_tx`.
    pub async fn sign_tx_with(&self, unsigned_tx: &str, partial_sign: bool, account_index: u32) -> Result<String> {
        self.sign_tx_inner(unsigned_tx, partial_sign, account_index).await.during("signTx")
    }

    async fn sign_tx_inner(&self, unsigned_tx: &str, partial_sign: bool, account_index: u32) -> Result<String> {
        let tx = Transaction::from_hex(unsigned_tx)?;
        let utxos = self.fetch_utxos(account_index).await?;
        let signatures = self
            .wallet
            .sign_tx(account_index, DEFAULT_PASSWORD, &utxos, unsigned_tx, partial_sign)?;
        let merged = merge_signatures(&tx.witness_set, &signatures)?;
        debug!(
            account = account_index,
            existing = tx.witness_set.signatures().len(),
            merged = merged.signatures().len(),
            "merged embedded witnesses"
        );
        Ok(tx.with_witness_set(merged).to_hex()?)
    }

    /// Generates a mnemonic of `strength` bits; 256 gives 24 words.
    pub fn brew(strength: usize) -> Result<Vec<String>> {
        EmbeddedWallet::generate_mnemonic(strength)
    }

    async fn fetch_utxos(&self, account_index: u32) -> Result<Vec<UTxO>> {
        let address = self.get_payment_address(account_index)?;
        self.fetcher.fetch_address_utxos(&address).await
    }
}

impl std::fmt::Debug for AppWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppWallet")
            .field("config", &self.config)
            .field("wallet", &self.wallet)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Wallet for AppWallet {
    async fn get_network_id(&self) -> Result<u8> {
        Ok(self.config.network_id)
    }

    async fn get_change_address(&self) -> Result<String> {
        self.get_payment_address(0).during("getChangeAddress")
    }

    async fn get_reward_addresses(&self) -> Result<Vec<String>> {
        Ok(vec![self.get_reward_address(0).during("getRewardAddresses")?])
    }

    async fn get_unused_addresses(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn get_used_addresses(&self) -> Result<Vec<String>> {
        Ok(vec![self.get_payment_address(0).during("getUsedAddresses")?])
    }

    async fn get_balance(&self) -> Result<Vec<Asset>> {
        let utxos = self.fetch_utxos(0).await.during("getBalance")?;
        Ok(merge_assets(utxos.iter().flat_map(|utxo| &utxo.output.amount)))
    }

    async fn get_utxos(&self) -> Result<Vec<UTxO>> {
        self.fetch_utxos(0).await.during("getUtxos")
    }

    async fn get_collateral(&self, limit: Option<usize>) -> Result<Vec<UTxO>> {
        let limit = limit.unwrap_or(self.config.max_collateral_inputs);
        let utxos = self.fetch_utxos(0).await.during("getCollateral")?;
        let candidates: Vec<UTxO> = utxos
            .into_iter()
            .filter(|utxo| utxo.is_pure_lovelace() && utxo.is_plain())
            .collect();
        select_collateral(&candidates, limit, self.config.min_collateral_lovelace).during("getCollateral")
    }

    async fn sign_data(&self, address: &str, payload: &str) -> Result<DataSignature> {
        self.sign_data_with(address, payload, 0)
    }

    async fn sign_tx(&self, unsigned_tx: &str, partial_sign: bool) -> Result<String> {
        self.sign_tx_with(unsigned_tx, partial_sign, 0).await
    }

    async fn submit_tx(&self, tx: &str) -> Result<String> {
        self.submitter.submit_tx(tx).await.during("submitTx")
    }
}
