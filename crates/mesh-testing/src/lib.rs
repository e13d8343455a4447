//! # Mesh Testing Infrastructure
//!
//! Testing utilities for the Mesh SDK:
//! - Edge case fixtures for mnemonics, amounts and Plutus Data
//! - Property-based testing strategies
//! - Transaction and UTxO builders ([`fixtures`])
//! - In-memory extension, fetcher and submitter ([`mocks`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesh_testing::*;
//!
//! proptest! {
//!     #[test]
//!     fn test_data_round_trip(data in plutus_data()) {
//!         let bytes = data.to_cbor().unwrap();
//!         prop_assert_eq!(Data::from_cbor(&bytes).unwrap(), data);
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod mocks;

use mesh_common::{Asset, Data, UTxO, VKeyWitness};
use num_bigint::BigInt;
use proptest::prelude::*;

pub use fixtures::{enterprise_address, enterprise_bech32, utxo, utxo_cbor_hex, TxFixture, TEST_PASSWORD};
pub use mocks::{MockFetcher, MockInjectedWallet, MockSubmitter, MockWalletApi};

// ============================================================================
// Edge Case Mnemonics
// ============================================================================

/// Edge case mnemonic phrases for testing
pub struct EdgeCaseMnemonics;

impl EdgeCaseMnemonics {
    /// Standard 12-word test mnemonic
    pub const STANDARD_12: &'static str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    /// Standard 15-word test mnemonic, the Daedalus / Yoroi length
    pub const STANDARD_15: &'static str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon address";

    /// Standard 24-word test mnemonic
    pub const STANDARD_24: &'static str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    /// All "zoo" words (valid checksum)
    pub const ALL_ZOO: &'static str = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong";

    /// Returns all valid mnemonics
    pub fn valid() -> Vec<&'static str> {
        vec![Self::STANDARD_12, Self::STANDARD_15, Self::STANDARD_24, Self::ALL_ZOO]
    }

    /// Returns invalid/malformed mnemonics for error handling tests
    pub fn invalid() -> Vec<&'static str> {
        vec![
            "",                           // Empty
            "abandon",                    // Single word
            "abandon abandon abandon",    // Too few words
            "invalid words here",         // Invalid words
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon", // 13 words
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon wrong", // Bad checksum
        ]
    }

    /// Splits a phrase into words
    pub fn words(phrase: &str) -> Vec<String> {
        phrase.split_whitespace().map(str::to_string).collect()
    }
}

// ============================================================================
// Edge Case Amounts
// ============================================================================

/// Edge case lovelace amounts
pub struct EdgeCaseAmounts;

impl EdgeCaseAmounts {
    /// Zero amount
    pub const ZERO: u64 = 0;

    /// One lovelace
    pub const MIN: u64 = 1;

    /// Maximum u64
    pub const MAX_U64: u64 = u64::MAX;

    /// Maximum ada supply in lovelace (45 billion ada)
    pub const MAX_SUPPLY: u64 = 45_000_000_000 * 1_000_000;

    /// Typical minimum UTxO value
    pub const MIN_UTXO: u64 = 1_000_000;

    /// Collateral most wallets set aside
    pub const COLLATERAL: u64 = 5_000_000;

    /// Amounts crossing every CBOR integer width
    pub fn width_boundaries() -> Vec<u64> {
        vec![0, 23, 24, 255, 256, 65_535, 65_536, u32::MAX as u64, u32::MAX as u64 + 1, u64::MAX]
    }
}

// ============================================================================
// Edge Case Plutus Data
// ============================================================================

/// Plutus Data values sitting on encoding boundaries
pub struct EdgeCaseData;

impl EdgeCaseData {
    /// Integers at the edges of the native CBOR range and beyond
    pub fn integers() -> Vec<Data> {
        let two_64: BigInt = BigInt::from(u64::MAX) + 1;
        vec![
            Data::integer(0),
            Data::integer(-1),
            Data::integer(i64::MAX),
            Data::integer(i64::MIN),
            Data::integer(u64::MAX),
            Data::Integer(two_64.clone()),
            Data::Integer(-two_64.clone()),
            Data::Integer(-two_64 - 1),
        ]
    }

    /// Byte strings around the 64-byte chunk limit
    pub fn bytes() -> Vec<Data> {
        vec![
            Data::bytes(Vec::new()),
            Data::bytes(vec![0xab; 64]),
            Data::bytes(vec![0xcd; 65]),
            Data::bytes(vec![0xef; 200]),
        ]
    }

    /// Constructors covering every tag range
    pub fn constructors() -> Vec<Data> {
        [0u64, 6, 7, 127, 128, 1_400]
            .into_iter()
            .map(|alternative| Data::constr(alternative, vec![Data::integer(alternative)]))
            .chain(std::iter::once(Data::constr(0, Vec::new())))
            .collect()
    }

    /// Every edge case above
    pub fn all() -> Vec<Data> {
        let mut all = Self::integers();
        all.extend(Self::bytes());
        all.extend(Self::constructors());
        all.push(Data::List(Vec::new()));
        all.push(Data::Map(Vec::new()));
        all
    }
}

// ============================================================================
// Property-Based Testing Strategies
// ============================================================================

/// Generates Plutus Data trees with unique map keys
pub fn plutus_data() -> impl Strategy<Value = Data> {
    let leaf = prop_oneof![
        prop::collection::vec(any::<u8>(), 0..100).prop_map(Data::Bytes),
        any::<i64>().prop_map(|n| Data::integer(n)),
        any::<i128>().prop_map(|n| Data::Integer(BigInt::from(n))),
        prop::collection::vec(any::<u8>(), 9..40)
            .prop_map(|magnitude| Data::Integer(BigInt::from_signed_bytes_be(&magnitude))),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Data::List),
            prop::collection::btree_map(inner.clone(), inner.clone(), 0..4)
                .prop_map(|entries| Data::Map(entries.into_iter().collect())),
            (constructor_alternative(), prop::collection::vec(inner, 0..5))
                .prop_map(|(alternative, fields)| Data::constr(alternative, fields)),
        ]
    })
}

/// Constructor alternatives across the compact and general tag ranges
pub fn constructor_alternative() -> impl Strategy<Value = u64> {
    prop_oneof![0u64..7, 7u64..128, 128u64..10_000]
}

/// Generates hex policy ids
pub fn policy_id() -> impl Strategy<Value = String> {
    prop::array::uniform28(any::<u8>()).prop_map(|bytes| hex::encode(bytes))
}

/// Generates hex asset names of up to 32 bytes
pub fn asset_name() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<u8>(), 0..=32).prop_map(|bytes| hex::encode(bytes))
}

/// Generates balances with unique units, lovelace first
pub fn assets() -> impl Strategy<Value = Vec<Asset>> {
    (
        0u64..=EdgeCaseAmounts::MAX_SUPPLY,
        prop::collection::btree_map((policy_id(), asset_name()), 1u64..=u64::MAX, 0..6),
    )
        .prop_map(|(lovelace, tokens)| {
            std::iter::once(Asset::lovelace(lovelace))
                .chain(
                    tokens
                        .into_iter()
                        .map(|((policy, name), quantity)| Asset::new(format!("{policy}{name}"), quantity)),
                )
                .collect()
        })
}

/// Generates verification-key witnesses
pub fn vkey_witness() -> impl Strategy<Value = VKeyWitness> {
    (
        prop::array::uniform32(any::<u8>()),
        prop::array::uniform32(any::<u8>()),
        prop::array::uniform32(any::<u8>()),
    )
        .prop_map(|(vkey, r, s)| {
            let mut signature = [0u8; 64];
            signature[..32].copy_from_slice(&r);
            signature[32..].copy_from_slice(&s);
            VKeyWitness::new(vkey, signature)
        })
}

/// Generates signature lists that may repeat entries
pub fn vkey_witnesses() -> impl Strategy<Value = Vec<VKeyWitness>> {
    prop::collection::vec(vkey_witness(), 0..6).prop_flat_map(|pool| {
        let len = pool.len();
        let picks = if len == 0 {
            Just(Vec::new()).boxed()
        } else {
            prop::collection::vec(0..len, 0..8).boxed()
        };
        picks.prop_map(move |picks| picks.into_iter().map(|i| pool[i].clone()).collect())
    })
}

/// Generates pure-lovelace UTxOs at a fixed testnet address
pub fn pure_lovelace_utxos() -> impl Strategy<Value = Vec<UTxO>> {
    prop::collection::vec((any::<u8>(), 0u32..8, 1u64..=100_000_000), 0..12).prop_map(|outputs| {
        let address = enterprise_bech32(1, 0);
        outputs
            .into_iter()
            .map(|(tx, index, lovelace)| utxo(tx, index, &address, lovelace))
            .collect()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_common::{from_value, merge_signatures, select_collateral, to_value, WitnessSet};

    #[test]
    fn test_edge_case_mnemonics() {
        assert_eq!(EdgeCaseMnemonics::words(EdgeCaseMnemonics::STANDARD_24).len(), 24);
        assert!(!EdgeCaseMnemonics::invalid().is_empty());
    }

    #[test]
    fn test_edge_case_data_round_trip() {
        for data in EdgeCaseData::all() {
            let bytes = data.to_cbor().unwrap();
            assert_eq!(Data::from_cbor(&bytes).unwrap(), data, "{}", hex::encode(&bytes));
        }
    }

    #[test]
    fn test_edge_case_amounts() {
        let widths = EdgeCaseAmounts::width_boundaries();
        assert!(widths.windows(2).all(|w| w[0] < w[1]));
        assert!(EdgeCaseAmounts::MAX_SUPPLY < EdgeCaseAmounts::MAX_U64);
    }

    proptest! {
        #[test]
        fn test_data_round_trip(data in plutus_data()) {
            let bytes = data.to_cbor().unwrap();
            let decoded = Data::from_cbor(&bytes).unwrap();
            prop_assert_eq!(&decoded, &data);
            prop_assert_eq!(decoded.to_cbor().unwrap(), bytes);
        }

        #[test]
        fn test_value_round_trip(balance in assets()) {
            let value = to_value(&balance).unwrap();
            let mut back = from_value(&value);
            let mut expected = balance.clone();
            back.sort_by(|a, b| a.unit.cmp(&b.unit));
            expected.sort_by(|a, b| a.unit.cmp(&b.unit));
            prop_assert_eq!(back, expected);
        }

        #[test]
        fn test_merge_idempotent(existing in vkey_witnesses(), new in vkey_witnesses()) {
            let set = WitnessSet::from_signatures(existing);
            let once = merge_signatures(&set, &new).unwrap();
            let twice = merge_signatures(&once, &new).unwrap();
            prop_assert_eq!(&twice, &once);
            for witness in set.signatures().iter().chain(&new) {
                prop_assert!(once.signatures().contains(witness));
            }
        }

        #[test]
        fn test_merge_totality(signatures in prop::collection::vec(vkey_witness(), 0..6)) {
            let set = WitnessSet::from_signatures(signatures.clone());
            prop_assert_eq!(merge_signatures(&set, &[]).unwrap(), set.clone());

            let from_empty = merge_signatures(&WitnessSet::default(), &signatures).unwrap();
            if signatures.is_empty() {
                prop_assert_eq!(from_empty, WitnessSet::default());
            } else {
                prop_assert_eq!(from_empty, set);
            }
        }

        #[test]
        fn test_collateral_bound(candidates in pure_lovelace_utxos(), limit in 0usize..5) {
            let selected = select_collateral(&candidates, limit, None).unwrap();
            prop_assert!(selected.len() <= limit);
        }
    }
}
