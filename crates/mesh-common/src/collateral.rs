//! Collateral selection.

use mesh_error::{MeshError, Result};
use tracing::debug;

use crate::utxo::UTxO;

/// Picks at most `limit` collateral UTxOs.
///
/// Without a minimum, the candidates are kept in order and truncated. With one, the
/// first `limit` candidates are used when they reach it, otherwise the largest
/// `limit` by lovelace; if even those fall short the selection fails rather than
/// returning an under-funded set. No candidates at all yields an empty selection.
pub fn select_collateral(
    candidates: &[UTxO],
    limit: usize,
    min_lovelace: Option<u64>,
) -> Result<Vec<UTxO>> {
    if candidates.is_empty() {
        debug!("no collateral candidates");
        return Ok(Vec::new());
    }

    let in_order: Vec<UTxO> = candidates.iter().take(limit).cloned().collect();
    let Some(required) = min_lovelace else {
        return Ok(in_order);
    };
    if total(&in_order) >= required {
        return Ok(in_order);
    }

    let mut largest = candidates.to_vec();
    largest.sort_by(|a, b| b.lovelace().cmp(&a.lovelace()));
    largest.truncate(limit);

    let available = total(&largest);
    if available < required {
        debug!(required, available, limit, "collateral below required minimum");
        return Err(MeshError::CollateralUnavailable { required, available });
    }
    debug!(selected = largest.len(), available, "collateral selected by size");
    Ok(largest)
}

fn total(utxos: &[UTxO]) -> u64 {
    utxos.iter().fold(0u64, |acc, utxo| acc.saturating_add(utxo.lovelace()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::utxo::{UtxoInput, UtxoOutput};

    fn utxo(index: u32, lovelace: u64) -> UTxO {
        UTxO {
            input: UtxoInput { output_index: index, tx_hash: "00".repeat(32) },
            output: UtxoOutput {
                address: "addr_test1".to_string(),
                amount: vec![Asset::lovelace(lovelace)],
                data_hash: None,
                plutus_data: None,
                script_ref: None,
            },
        }
    }

    #[test]
    fn test_empty_candidates_is_not_an_error() {
        assert!(select_collateral(&[], 3, Some(5_000_000)).unwrap().is_empty());
    }

    #[test]
    fn test_limit_without_minimum() {
        let candidates: Vec<UTxO> = (0..5).map(|i| utxo(i, 1_000_000)).collect();
        let selected = select_collateral(&candidates, 3, None).unwrap();
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].input.output_index, 0);
        assert!(select_collateral(&candidates, 0, None).unwrap().is_empty());
    }

    #[test]
    fn test_prefers_largest_when_prefix_short() {
        let candidates = vec![utxo(0, 1), utxo(1, 2), utxo(2, 5_000_000), utxo(3, 3)];
        let selected = select_collateral(&candidates, 1, Some(5_000_000)).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].input.output_index, 2);
    }

    #[test]
    fn test_keeps_order_when_prefix_suffices() {
        let candidates = vec![utxo(0, 3_000_000), utxo(1, 3_000_000), utxo(2, 9_000_000)];
        let selected = select_collateral(&candidates, 2, Some(5_000_000)).unwrap();
        let indexes: Vec<u32> = selected.iter().map(|u| u.input.output_index).collect();
        assert_eq!(indexes, vec![0, 1]);
    }

    #[test]
    fn test_unavailable() {
        let candidates = vec![utxo(0, 1_000_000), utxo(1, 1_000_000)];
        let err = select_collateral(&candidates, 3, Some(5_000_000)).unwrap_err();
        assert!(matches!(
            err,
            MeshError::CollateralUnavailable { required: 5_000_000, available: 2_000_000 }
        ));
    }
}
