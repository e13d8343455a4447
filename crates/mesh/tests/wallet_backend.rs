#![cfg(all(feature = "browser", feature = "app"))]

use std::sync::Arc;

use mesh::prelude::*;
use mesh_common::{Transaction, VKeyWitness};
use mesh_testing::{
    enterprise_address, utxo, EdgeCaseMnemonics, MockFetcher, MockInjectedWallet, MockSubmitter,
    MockWalletApi, TxFixture,
};

fn config() -> WalletConfig {
    WalletConfig::testnet().with_kdf_iterations(1_000)
}

fn app_wallet(fetcher: MockFetcher) -> AppWallet {
    let key = AppWalletKey::Mnemonic(EdgeCaseMnemonics::words(EdgeCaseMnemonics::STANDARD_12));
    let options = AppWalletOptions::new(Arc::new(fetcher), Arc::new(MockSubmitter::new()), key);
    AppWallet::new(options.with_config(config())).unwrap()
}

async fn browser_wallet(api: MockWalletApi) -> BrowserWallet {
    let registry = WalletRegistry::new()
        .with_wallet("lace", Arc::new(MockInjectedWallet::new("Lace", api)));
    BrowserWallet::enable_with_config(&registry, "lace", config()).await.unwrap()
}

async fn describe(wallet: &dyn Wallet) -> (u8, usize) {
    let network = wallet.get_network_id().await.unwrap();
    let used = wallet.get_used_addresses().await.unwrap().len();
    (network, used)
}

// ============================================================================
// Tagged Variant
// ============================================================================

#[tokio::test]
async fn test_backends_share_contract() {
    let browser: WalletBackend = browser_wallet(
        MockWalletApi::new().with_used_addresses(vec![enterprise_address(1, 0).to_hex()]),
    )
    .await
    .into();
    let app: WalletBackend = app_wallet(MockFetcher::new()).into();

    assert_eq!(browser.kind(), "browser");
    assert_eq!(app.kind(), "app");
    for wallet in [&browser, &app] {
        assert_eq!(describe(wallet).await, (0, 1));
        assert!(wallet.get_collateral(Some(2)).await.unwrap().len() <= 2);
    }
}

#[tokio::test]
async fn test_projections_through_backend() {
    let address = app_wallet(MockFetcher::new()).get_payment_address(0).unwrap();
    let fetcher = MockFetcher::new()
        .with_utxos(address.clone(), vec![utxo(1, 0, &address, 4_000_000), utxo(2, 0, &address, 1_000_000)]);
    let wallet: WalletBackend = app_wallet(fetcher).into();

    assert_eq!(wallet.get_lovelace().await.unwrap(), 5_000_000);
    assert!(wallet.get_policy_ids().await.unwrap().is_empty());
    assert!(wallet.get_assets().await.unwrap().is_empty());
}

// ============================================================================
// Multi-party Signing
// ============================================================================

#[tokio::test]
async fn test_browser_and_app_cosign() {
    let address = app_wallet(MockFetcher::new()).get_payment_address(0).unwrap();
    let owned = utxo(5, 0, &address, 10_000_000);
    let app: WalletBackend =
        app_wallet(MockFetcher::new().with_utxos(address.clone(), vec![owned.clone()])).into();

    let extension_witness = VKeyWitness::new([0x0e; 32], [0x0f; 64]);
    let browser: WalletBackend =
        browser_wallet(MockWalletApi::new().with_signatures(vec![extension_witness.clone()]))
            .await
            .into();

    let unsigned = TxFixture::new()
        .spending(&owned)
        .input([0x77; 32], 1)
        .output(enterprise_address(9, 0), 2_000_000)
        .to_hex();

    let app_first = browser
        .sign_tx(&app.sign_tx(&unsigned, true).await.unwrap(), true)
        .await
        .unwrap();
    let browser_first = app
        .sign_tx(&browser.sign_tx(&unsigned, true).await.unwrap(), true)
        .await
        .unwrap();

    let mut a = Transaction::from_hex(&app_first).unwrap().witness_set.signatures().to_vec();
    let mut b = Transaction::from_hex(&browser_first).unwrap().witness_set.signatures().to_vec();
    a.sort_by_key(|w| w.vkey);
    b.sort_by_key(|w| w.vkey);
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
    assert!(a.contains(&extension_witness));

    let unsigned_id = Transaction::from_hex(&unsigned).unwrap().id();
    assert_eq!(Transaction::from_hex(&app_first).unwrap().id(), unsigned_id);
}

#[tokio::test]
async fn test_errors_keep_operation_context() {
    let app: WalletBackend = app_wallet(MockFetcher::new().failing("connection refused")).into();
    let err = app.get_balance().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.operation(), Some("getBalance"));

    let browser: WalletBackend = browser_wallet(MockWalletApi::new().declining()).await.into();
    let err = browser.sign_data(&enterprise_address(1, 0).to_bech32().unwrap(), "hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendRejection);
    assert_eq!(err.operation(), Some("signData"));
}
