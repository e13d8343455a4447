//! Multi-party signing: partial witness sets arriving in any order merge to the same set.

use mesh_common::cbor;
use mesh_common::{merge_signatures, Transaction, VKeyWitness, WitnessSet};

fn unsigned_transaction() -> Transaction {
    let bytes = cbor::encode_to_vec(|e| {
        e.array(4)?;
        e.map(3)?;
        e.u8(0)?.array(1)?.array(2)?.bytes(&[0x01; 32])?.u8(0)?;
        e.u8(1)?.array(0)?;
        e.u8(2)?.u64(200_000)?;
        e.map(0)?;
        e.bool(true)?;
        e.null()?;
        Ok(())
    })
    .unwrap();
    Transaction::from_cbor(&bytes).unwrap()
}

fn witness(n: u8) -> VKeyWitness {
    VKeyWitness::new([n; 32], [n.wrapping_mul(3); 64])
}

fn sign(tx: &Transaction, returned: &WitnessSet) -> Transaction {
    let merged = merge_signatures(&tx.witness_set, returned.signatures()).unwrap();
    tx.with_witness_set(merged)
}

#[test]
fn test_signers_in_any_order_converge() {
    let tx = unsigned_transaction();
    let alice = WitnessSet::from_signatures(vec![witness(1)]);
    let bob = WitnessSet::from_signatures(vec![witness(2), witness(1)]);

    let ab = sign(&sign(&tx, &alice), &bob);
    let ba = sign(&sign(&tx, &bob), &alice);

    let mut ab_sigs = ab.witness_set.signatures().to_vec();
    let mut ba_sigs = ba.witness_set.signatures().to_vec();
    ab_sigs.sort_by_key(|w| w.vkey);
    ba_sigs.sort_by_key(|w| w.vkey);
    assert_eq!(ab_sigs, ba_sigs);
    assert_eq!(ab_sigs.len(), 2);
    assert_eq!(ab.id(), tx.id());
}

#[test]
fn test_wire_round_trip_after_signing() {
    let tx = unsigned_transaction();
    let returned = WitnessSet::from_hex(
        &WitnessSet::from_signatures(vec![witness(9)]).to_hex().unwrap(),
    )
    .unwrap();

    let signed = sign(&tx, &returned);
    let hex = signed.to_hex().unwrap();
    let reparsed = Transaction::from_hex(&hex).unwrap();

    assert_eq!(reparsed, signed);
    assert_eq!(reparsed.body_bytes(), tx.body_bytes());
    assert_eq!(reparsed.body().unwrap().fee, 200_000);
}
