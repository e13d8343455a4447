//! In-memory stand-ins for the extension, the chain fetcher and the submitter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mesh_common::{Transaction, UTxO, VKeyWitness, WitnessSet};
use mesh_error::{MeshError, Result};
use mesh_traits::cip30::{InjectedWallet, WalletApi};
use mesh_traits::{DataSignature, Fetcher, Submitter};

/// Scripted CIP-30 extension.
///
/// Every call is recorded by name; `sign_tx` answers with a witness set holding the
/// configured signatures, `submit_tx` with the id of the submitted transaction.
#[derive(Debug, Clone)]
pub struct MockWalletApi {
    /// Reported network id
    pub network_id: u8,
    /// Hex CBOR value
    pub balance: String,
    /// Hex address bytes
    pub change_address: String,
    /// Hex reward address bytes
    pub reward_addresses: Vec<String>,
    /// Hex address bytes
    pub unused_addresses: Vec<String>,
    /// Hex address bytes
    pub used_addresses: Vec<String>,
    /// Hex CBOR unspent outputs
    pub utxos: Option<Vec<String>>,
    /// Hex CBOR unspent outputs
    pub collateral: Option<Vec<String>>,
    /// Witnesses returned from `sign_tx`
    pub signatures: Vec<VKeyWitness>,
    /// Answer to `sign_data`
    pub data_signature: DataSignature,
    /// Refuse every signing request
    pub declines: bool,
    /// Fail submissions with this reason
    pub submit_failure: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockWalletApi {
    fn default() -> Self {
        Self {
            network_id: 0,
            balance: "00".to_string(),
            change_address: String::new(),
            reward_addresses: Vec::new(),
            unused_addresses: Vec::new(),
            used_addresses: Vec::new(),
            utxos: None,
            collateral: None,
            signatures: Vec::new(),
            data_signature: DataSignature {
                signature: "84".to_string(),
                key: "a0".to_string(),
            },
            declines: false,
            submit_failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockWalletApi {
    /// Extension with an empty wallet on testnet
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `balance` (hex CBOR value)
    pub fn with_balance(mut self, balance: impl Into<String>) -> Self {
        self.balance = balance.into();
        self
    }

    /// Reports `used` as used addresses (hex bytes)
    pub fn with_used_addresses(mut self, used: Vec<String>) -> Self {
        self.used_addresses = used;
        self
    }

    /// Reports `utxos` (hex CBOR)
    pub fn with_utxos(mut self, utxos: Vec<String>) -> Self {
        self.utxos = Some(utxos);
        self
    }

    /// Reports `collateral` (hex CBOR)
    pub fn with_collateral(mut self, collateral: Vec<String>) -> Self {
        self.collateral = Some(collateral);
        self
    }

    /// Answers `sign_tx` with `signatures`
    pub fn with_signatures(mut self, signatures: Vec<VKeyWitness>) -> Self {
        self.signatures = signatures;
        self
    }

    /// Refuses signing, as when the user closes the prompt
    pub fn declining(mut self) -> Self {
        self.declines = true;
        self
    }

    /// Fails every submission with `reason`
    pub fn failing_submit(mut self, reason: impl Into<String>) -> Self {
        self.submit_failure = Some(reason.into());
        self
    }

    /// Names and arguments of every call so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl WalletApi for MockWalletApi {
    async fn get_network_id(&self) -> Result<u8> {
        self.record("getNetworkId".into());
        Ok(self.network_id)
    }

    async fn get_balance(&self) -> Result<String> {
        self.record("getBalance".into());
        Ok(self.balance.clone())
    }

    async fn get_change_address(&self) -> Result<String> {
        self.record("getChangeAddress".into());
        Ok(self.change_address.clone())
    }

    async fn get_reward_addresses(&self) -> Result<Vec<String>> {
        self.record("getRewardAddresses".into());
        Ok(self.reward_addresses.clone())
    }

    async fn get_unused_addresses(&self) -> Result<Vec<String>> {
        self.record("getUnusedAddresses".into());
        Ok(self.unused_addresses.clone())
    }

    async fn get_used_addresses(&self) -> Result<Vec<String>> {
        self.record("getUsedAddresses".into());
        Ok(self.used_addresses.clone())
    }

    async fn get_utxos(&self) -> Result<Option<Vec<String>>> {
        self.record("getUtxos".into());
        Ok(self.utxos.clone())
    }

    async fn get_collateral(&self) -> Result<Option<Vec<String>>> {
        self.record("getCollateral".into());
        Ok(self.collateral.clone())
    }

    async fn sign_data(&self, address: &str, payload: &str) -> Result<DataSignature> {
        self.record(format!("signData:{address}:{payload}"));
        if self.declines {
            return Err(MeshError::rejected("signData", "user declined"));
        }
        Ok(self.data_signature.clone())
    }

    async fn sign_tx(&self, _tx: &str, partial_sign: bool) -> Result<String> {
        self.record(format!("signTx:{partial_sign}"));
        if self.declines {
            return Err(MeshError::rejected("signTx", "user declined"));
        }
        Ok(WitnessSet::from_signatures(self.signatures.clone()).to_hex()?)
    }

    async fn submit_tx(&self, tx: &str) -> Result<String> {
        self.record("submitTx".into());
        if let Some(reason) = &self.submit_failure {
            return Err(MeshError::network("submitTx", reason));
        }
        Ok(hex::encode(Transaction::from_hex(tx)?.id()))
    }
}

/// Registry entry wrapping a [`MockWalletApi`].
#[derive(Debug, Clone)]
pub struct MockInjectedWallet {
    /// Display name
    pub name: String,
    /// Icon data URI
    pub icon: String,
    /// CIP-30 version
    pub api_version: String,
    /// Refuse the connection
    pub declines: bool,
    api: MockWalletApi,
}

impl MockInjectedWallet {
    /// Entry named `name` that enables into `api`
    pub fn new(name: impl Into<String>, api: MockWalletApi) -> Self {
        Self {
            name: name.into(),
            icon: "data:image/svg+xml;base64,PHN2Zy8+".to_string(),
            api_version: "0.1.0".to_string(),
            declines: false,
            api,
        }
    }

    /// Refuses the connection
    pub fn declining(mut self) -> Self {
        self.declines = true;
        self
    }
}

#[async_trait]
impl InjectedWallet for MockInjectedWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }

    async fn enable(&self) -> Result<Arc<dyn WalletApi>> {
        if self.declines {
            return Err(MeshError::rejected("enable", "user declined"));
        }
        Ok(Arc::new(self.api.clone()))
    }
}

/// Fetcher serving UTxOs from memory.
#[derive(Debug, Default)]
pub struct MockFetcher {
    utxos: HashMap<String, Vec<UTxO>>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockFetcher {
    /// Fetcher that knows no UTxOs
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `utxos` for `address`
    pub fn with_utxos(mut self, address: impl Into<String>, utxos: Vec<UTxO>) -> Self {
        self.utxos.entry(address.into()).or_default().extend(utxos);
        self
    }

    /// Fails every query with `reason`
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Number of queries so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_address_utxos(&self, address: &str) -> Result<Vec<UTxO>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            return Err(MeshError::network("fetchAddressUTxOs", reason));
        }
        Ok(self.utxos.get(address).cloned().unwrap_or_default())
    }
}

/// Submitter recording what it was given.
#[derive(Debug, Default)]
pub struct MockSubmitter {
    submitted: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl MockSubmitter {
    /// Submitter accepting everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every submission with `reason`
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Transactions submitted so far
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().map(|txs| txs.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Submitter for MockSubmitter {
    async fn submit_tx(&self, tx: &str) -> Result<String> {
        if let Some(reason) = &self.failure {
            return Err(MeshError::network("submitTx", reason));
        }
        let id = Transaction::from_hex(tx)?.id();
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(tx.to_string());
        }
        Ok(hex::encode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TxFixture;

    #[tokio::test]
    async fn test_mock_api_records_calls() {
        let api = MockWalletApi::new();
        api.get_balance().await.unwrap();
        api.sign_tx("84", true).await.unwrap();
        assert_eq!(api.calls(), vec!["getBalance".to_string(), "signTx:true".to_string()]);
    }

    #[tokio::test]
    async fn test_declining_injected_wallet() {
        let wallet = MockInjectedWallet::new("Nami", MockWalletApi::new()).declining();
        let err = wallet.enable().await.err().unwrap();
        assert!(matches!(err, MeshError::BackendRejection { .. }));
    }

    #[tokio::test]
    async fn test_mock_submitter_returns_tx_id() {
        let fixture = TxFixture::new().input([3; 32], 0);
        let submitter = MockSubmitter::new();
        let id = submitter.submit_tx(&fixture.to_hex()).await.unwrap();
        assert_eq!(id.len(), 64);
        assert_eq!(submitter.submitted().len(), 1);

        let failing = MockSubmitter::new().failing("timeout");
        assert!(failing.submit_tx(&fixture.to_hex()).await.unwrap_err().is_retryable());
    }
}
