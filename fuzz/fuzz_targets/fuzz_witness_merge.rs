#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mesh_common::{merge_signatures, Transaction, VKeyWitness};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    transaction: &'a [u8],
    signatures: Vec<([u8; 32], [u8; 32], [u8; 32])>,
}

fuzz_target!(|input: Input<'_>| {
    let Ok(tx) = Transaction::from_cbor(input.transaction) else {
        return;
    };
    let signatures: Vec<VKeyWitness> = input
        .signatures
        .iter()
        .map(|(vkey, r, s)| {
            let mut signature = [0u8; 64];
            signature[..32].copy_from_slice(r);
            signature[32..].copy_from_slice(s);
            VKeyWitness::new(*vkey, signature)
        })
        .collect();

    let Ok(merged) = merge_signatures(&tx.witness_set, &signatures) else {
        return;
    };
    for existing in tx.witness_set.signatures() {
        assert!(merged.signatures().contains(existing));
    }
    let again = merge_signatures(&merged, &signatures).expect("merged set merges again");
    assert_eq!(again, merged);

    // Witnesses never touch the body, so the id is unchanged
    let signed = tx.with_witness_set(merged);
    let reencoded = Transaction::from_cbor(&signed.to_cbor().expect("re-encodes")).expect("decodes");
    assert_eq!(reencoded.id(), tx.id());
});
