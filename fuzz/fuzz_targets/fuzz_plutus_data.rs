#![no_main]

use libfuzzer_sys::fuzz_target;
use mesh_common::Data;

fuzz_target!(|bytes: &[u8]| {
    // Decoding must never panic; whatever decodes must re-encode to a stable form
    if let Ok(data) = Data::from_cbor(bytes) {
        let encoded = data.to_cbor().expect("decoded data re-encodes");
        let again = Data::from_cbor(&encoded).expect("canonical form decodes");
        assert_eq!(again, data);
        assert_eq!(again.to_cbor().expect("re-encodes"), encoded);
    }
});
