//! Network constants, protocol parameters and wallet configuration.

use serde::{Deserialize, Serialize};

/// Network id reported by mainnet wallets
pub const MAINNET_NETWORK_ID: u8 = 1;

/// Network id reported by every test network (preview, preprod)
pub const TESTNET_NETWORK_ID: u8 = 0;

/// Unit of the base currency
pub const LOVELACE: &str = "lovelace";

/// Length of a hex-encoded policy id
pub const POLICY_ID_LENGTH: usize = 56;

/// Injected wallet keys the browser backend is willing to talk to
pub const SUPPORTED_WALLETS: &[&str] = &[
    "begin",
    "eternl",
    "flint",
    "gerowallet",
    "lace",
    "nami",
    "nufi",
    "typhoncip30",
    "vespr",
    "yoroi",
];

/// Number of hardened child indexes, the account space of a CIP-1852 wallet
pub const HARDENED_ACCOUNT_LIMIT: u32 = 0x8000_0000;

/// Default PBKDF2 rounds protecting embedded key material
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Protocol parameters, as served by chain providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Protocol {
    /// Epoch the parameters apply to
    pub epoch: u64,
    /// Fee per transaction byte
    pub min_fee_a: u64,
    /// Fixed fee per transaction
    pub min_fee_b: u64,
    /// Maximum block body size
    pub max_block_size: u64,
    /// Maximum transaction size
    pub max_tx_size: u64,
    /// Maximum block header size
    pub max_block_header_size: u64,
    /// Stake key registration deposit
    pub key_deposit: u64,
    /// Pool registration deposit
    pub pool_deposit: u64,
    /// Decentralisation parameter
    pub decentralisation: f64,
    /// Minimum fixed pool cost
    pub min_pool_cost: u64,
    /// Price per memory unit
    pub price_mem: f64,
    /// Price per CPU step
    pub price_step: f64,
    /// Memory budget per transaction
    pub max_tx_ex_mem: u64,
    /// Step budget per transaction
    pub max_tx_ex_steps: u64,
    /// Memory budget per block
    pub max_block_ex_mem: u64,
    /// Step budget per block
    pub max_block_ex_steps: u64,
    /// Maximum serialized value size
    pub max_val_size: u64,
    /// Collateral as a percentage of the fee
    pub collateral_percent: u64,
    /// Maximum number of collateral inputs
    pub max_collateral_inputs: usize,
    /// Lovelace per UTxO byte
    #[serde(rename = "coinsPerUTxOSize")]
    pub coins_per_utxo_size: u64,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            epoch: 0,
            min_fee_a: 44,
            min_fee_b: 155_381,
            max_block_size: 98_304,
            max_tx_size: 16_384,
            max_block_header_size: 1_100,
            key_deposit: 2_000_000,
            pool_deposit: 500_000_000,
            decentralisation: 0.0,
            min_pool_cost: 340_000_000,
            price_mem: 0.0577,
            price_step: 0.0000721,
            max_tx_ex_mem: 16_000_000,
            max_tx_ex_steps: 10_000_000_000,
            max_block_ex_mem: 80_000_000,
            max_block_ex_steps: 40_000_000_000,
            max_val_size: 5_000,
            collateral_percent: 150,
            max_collateral_inputs: 3,
            coins_per_utxo_size: 4_310,
        }
    }
}

/// Wallet-level configuration shared by both backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConfig {
    /// Network the wallet derives addresses for
    pub network_id: u8,
    /// Default `limit` for collateral queries
    pub max_collateral_inputs: usize,
    /// Minimum lovelace the collateral set must reach, if any
    pub min_collateral_lovelace: Option<u64>,
    /// Exclusive upper bound on embedded account indexes
    pub account_limit: u32,
    /// PBKDF2 rounds for embedded key encryption
    pub kdf_iterations: u32,
}

impl WalletConfig {
    /// Creates a configuration for `network_id` with default limits
    pub fn new(network_id: u8) -> Self {
        Self {
            network_id,
            max_collateral_inputs: Protocol::default().max_collateral_inputs,
            min_collateral_lovelace: None,
            account_limit: HARDENED_ACCOUNT_LIMIT,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }

    /// Mainnet defaults
    pub fn mainnet() -> Self {
        Self::new(MAINNET_NETWORK_ID)
    }

    /// Testnet defaults
    pub fn testnet() -> Self {
        Self::new(TESTNET_NETWORK_ID)
    }

    /// Sets the default collateral input limit
    pub fn with_max_collateral_inputs(mut self, limit: usize) -> Self {
        self.max_collateral_inputs = limit;
        self
    }

    /// Requires collateral to reach `lovelace`
    pub fn with_min_collateral(mut self, lovelace: u64) -> Self {
        self.min_collateral_lovelace = Some(lovelace);
        self
    }

    /// Sets the account space of the embedded signer
    pub fn with_account_limit(mut self, limit: u32) -> Self {
        self.account_limit = limit;
        self
    }

    /// Sets the PBKDF2 rounds
    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }

    /// Loads a configuration from JSON, defaulting missing fields
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Returns true if the wallet targets mainnet
    pub fn is_mainnet(&self) -> bool {
        self.network_id == MAINNET_NETWORK_ID
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_defaults() {
        let protocol = Protocol::default();
        assert_eq!(protocol.max_collateral_inputs, 3);
        assert_eq!(protocol.min_fee_a, 44);
        assert_eq!(protocol.min_fee_b, 155_381);
    }

    #[test]
    fn test_protocol_json_field_names() {
        let json = serde_json::to_value(Protocol::default()).unwrap();
        assert_eq!(json["minFeeA"], 44);
        assert_eq!(json["coinsPerUTxOSize"], 4_310);
        assert_eq!(json["maxCollateralInputs"], 3);
    }

    #[test]
    fn test_wallet_config_builder() {
        let config = WalletConfig::testnet()
            .with_max_collateral_inputs(1)
            .with_min_collateral(5_000_000)
            .with_account_limit(10)
            .with_kdf_iterations(1_000);

        assert!(!config.is_mainnet());
        assert_eq!(config.max_collateral_inputs, 1);
        assert_eq!(config.min_collateral_lovelace, Some(5_000_000));
        assert_eq!(config.account_limit, 10);
        assert_eq!(config.kdf_iterations, 1_000);
    }

    #[test]
    fn test_wallet_config_from_json_defaults() {
        let config = WalletConfig::from_json(r#"{ "networkId": 0 }"#).unwrap();
        assert_eq!(config.network_id, TESTNET_NETWORK_ID);
        assert_eq!(config.max_collateral_inputs, 3);
        assert_eq!(config.account_limit, HARDENED_ACCOUNT_LIMIT);
        assert_eq!(config.min_collateral_lovelace, None);
    }
}
