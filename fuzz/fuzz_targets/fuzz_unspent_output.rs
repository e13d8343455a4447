#![no_main]

use libfuzzer_sys::fuzz_target;
use mesh_common::{from_tx_unspent_output, to_tx_unspent_output, TxUnspentOutput};

fuzz_target!(|bytes: &[u8]| {
    let Ok(native) = TxUnspentOutput::from_cbor(bytes) else {
        return;
    };
    // Conversion may refuse (e.g. indexes beyond u32) but must not panic
    let Ok(utxo) = from_tx_unspent_output(&native) else {
        return;
    };
    let back = to_tx_unspent_output(&utxo).expect("application form converts back");
    let again = from_tx_unspent_output(&back).expect("converted output converts again");
    assert_eq!(again.output.amount, utxo.output.amount);
    assert_eq!(again.output.address, utxo.output.address);
    assert_eq!(again.output.data_hash, utxo.output.data_hash);
});
