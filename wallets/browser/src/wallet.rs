use std::sync::Arc;

use async_trait::async_trait;
use mesh_common::{
    from_tx_unspent_output, from_value, merge_signatures, select_collateral, Address, Asset,
    Transaction, TxUnspentOutput, UTxO, Value, WalletConfig, WitnessSet,
};
use mesh_error::{CodecError, MeshError, OperationContext, Result};
use mesh_traits::cip30::WalletApi;
use mesh_traits::{DataSignature, InstalledWallet, Wallet};
use tracing::debug;

use crate::registry::WalletRegistry;

/// Wallet backed by a CIP-30 browser extension.
///
/// Every call goes through the extension; this type only converts between the
/// extension's hex CBOR and the application model, and merges the witnesses it returns.
#[derive(Clone)]
pub struct BrowserWallet {
    api: Arc<dyn WalletApi>,
    config: WalletConfig,
}

impl BrowserWallet {
    /// Lists the supported extensions present in `registry`.
    pub fn get_installed_wallets(registry: &WalletRegistry) -> Vec<InstalledWallet> {
        registry.installed()
    }

    /// Connects to the extension named `wallet_name` (case-insensitive).
    pub async fn enable(registry: &WalletRegistry, wallet_name: &str) -> Result<Self> {
        Self::enable_with_config(registry, wallet_name, WalletConfig::default()).await
    }

    /// Connects to the extension named `wallet_name` with a custom configuration.
    pub async fn enable_with_config(
        registry: &WalletRegistry,
        wallet_name: &str,
        config: WalletConfig,
    ) -> Result<Self> {
        let injected = registry
            .find(wallet_name)
            .ok_or_else(|| MeshError::WalletNotFound(wallet_name.to_string()))
            .during("enable")?;
        let api = injected.enable().await.during("enable")?;
        debug!(wallet = injected.name(), "wallet enabled");
        Ok(Self::from_api(api, config))
    }

    /// Wraps an already enabled extension.
    pub fn from_api(api: Arc<dyn WalletApi>, config: WalletConfig) -> Self {
        Self { api, config }
    }

    /// Configuration in use
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// First used address, in ledger form
    pub async fn get_used_address(&self) -> Result<Address> {
        let used = self.api.get_used_addresses().await.during("getUsedAddresses")?;
        let first = used
            .first()
            .ok_or_else(|| MeshError::rejected("getUsedAddresses", "wallet reported no used address"))?;
        Ok(decode_address(first)?)
    }

    /// UTxOs in ledger form
    pub async fn get_used_utxos(&self) -> Result<Vec<TxUnspentOutput>> {
        let utxos = self.api.get_utxos().await.during("getUtxos")?.unwrap_or_default();
        utxos
            .iter()
            .map(|utxo| TxUnspentOutput::from_hex(utxo).map_err(MeshError::from))
            .collect::<Result<_>>()
            .during("getUtxos")
    }

    /// Collateral in ledger form, at most `limit` entries
    pub async fn get_used_collateral(&self, limit: Option<usize>) -> Result<Vec<TxUnspentOutput>> {
        let limit = limit.unwrap_or(self.config.max_collateral_inputs);
        let collateral = self.api.get_collateral().await.during("getCollateral")?.unwrap_or_default();
        let mut decoded = collateral
            .iter()
            .map(|utxo| TxUnspentOutput::from_hex(utxo).map_err(MeshError::from))
            .collect::<Result<Vec<_>>>()
            .during("getCollateral")?;
        decoded.truncate(limit);
        Ok(decoded)
    }

    async fn sign_tx_inner(&self, unsigned_tx: &str, partial_sign: bool) -> Result<String> {
        let tx = Transaction::from_hex(unsigned_tx)?;
        let witness_set = self.api.sign_tx(unsigned_tx, partial_sign).await?;
        let new_signatures = WitnessSet::from_hex(&witness_set)?;
        let merged = merge_signatures(&tx.witness_set, new_signatures.signatures())?;
        debug!(
            existing = tx.witness_set.signatures().len(),
            returned = new_signatures.signatures().len(),
            merged = merged.signatures().len(),
            partial_sign,
            "merged extension witnesses"
        );
        Ok(tx.with_witness_set(merged).to_hex()?)
    }
}

impl std::fmt::Debug for BrowserWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserWallet").field("config", &self.config).finish_non_exhaustive()
    }
}

#[async_trait]
impl Wallet for BrowserWallet {
    async fn get_network_id(&self) -> Result<u8> {
        self.api.get_network_id().await.during("getNetworkId")
    }

    async fn get_change_address(&self) -> Result<String> {
        let address = self.api.get_change_address().await.during("getChangeAddress")?;
        to_bech32(&address).during("getChangeAddress")
    }

    async fn get_reward_addresses(&self) -> Result<Vec<String>> {
        let addresses = self.api.get_reward_addresses().await.during("getRewardAddresses")?;
        addresses.iter().map(|a| to_bech32(a)).collect::<Result<_>>().during("getRewardAddresses")
    }

    async fn get_unused_addresses(&self) -> Result<Vec<String>> {
        let addresses = self.api.get_unused_addresses().await.during("getUnusedAddresses")?;
        addresses.iter().map(|a| to_bech32(a)).collect::<Result<_>>().during("getUnusedAddresses")
    }

    async fn get_used_addresses(&self) -> Result<Vec<String>> {
        let addresses = self.api.get_used_addresses().await.during("getUsedAddresses")?;
        addresses.iter().map(|a| to_bech32(a)).collect::<Result<_>>().during("getUsedAddresses")
    }

    async fn get_balance(&self) -> Result<Vec<Asset>> {
        let balance = self.api.get_balance().await.during("getBalance")?;
        let value = Value::from_hex(&balance).during("getBalance")?;
        Ok(from_value(&value))
    }

    async fn get_utxos(&self) -> Result<Vec<UTxO>> {
        let utxos = self.get_used_utxos().await?;
        utxos
            .iter()
            .map(|utxo| from_tx_unspent_output(utxo).map_err(MeshError::from))
            .collect::<Result<_>>()
            .during("getUtxos")
    }

    async fn get_collateral(&self, limit: Option<usize>) -> Result<Vec<UTxO>> {
        let limit = limit.unwrap_or(self.config.max_collateral_inputs);
        // Decode everything first so a minimum can draw on the whole reported set.
        let reported = self.get_used_collateral(Some(usize::MAX)).await?;
        let candidates = reported
            .iter()
            .map(|utxo| from_tx_unspent_output(utxo).map_err(MeshError::from))
            .collect::<Result<Vec<_>>>()
            .during("getCollateral")?;
        select_collateral(&candidates, limit, self.config.min_collateral_lovelace).during("getCollateral")
    }

    async fn sign_data(&self, address: &str, payload: &str) -> Result<DataSignature> {
        let signer = Address::parse(address).during("signData")?;
        self.api
            .sign_data(&signer.to_hex(), &hex::encode(payload.as_bytes()))
            .await
            .during("signData")
    }

    async fn sign_tx(&self, unsigned_tx: &str, partial_sign: bool) -> Result<String> {
        self.sign_tx_inner(unsigned_tx, partial_sign).await.during("signTx")
    }

    async fn submit_tx(&self, tx: &str) -> Result<String> {
        self.api.submit_tx(tx).await.during("submitTx")
    }
}

/// Extensions return raw address bytes; a few return bech32 already.
fn decode_address(address: &str) -> std::result::Result<Address, CodecError> {
    match Address::from_hex(address) {
        Ok(decoded) => Ok(decoded),
        Err(_) => Address::parse(address),
    }
}

fn to_bech32(address: &str) -> Result<String> {
    Ok(decode_address(address)?.to_bech32()?)
}
