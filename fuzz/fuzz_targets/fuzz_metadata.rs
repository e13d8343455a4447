#![no_main]

use libfuzzer_sys::fuzz_target;
use mesh_common::{from_tx_metadatum, to_tx_metadatum};

fuzz_target!(|bytes: &[u8]| {
    if let Ok(metadata) = from_tx_metadatum(bytes) {
        let encoded = to_tx_metadatum(&metadata).expect("decoded metadata re-encodes");
        assert_eq!(from_tx_metadatum(&encoded).expect("re-encoded metadata decodes"), metadata);
    }
});
