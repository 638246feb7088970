#![no_main]
use libfuzzer_sys::fuzz_target;
use reconcile_core::Ibf;

// Arbitrary bytes are rarely valid IBF wire JSON, so this mostly exercises
// that malformed input is rejected with an error rather than a panic. When
// it does happen to parse, the round trip must be bitwise exact.
fuzz_target!(|data: &[u8]| {
    if let Ok(ibf) = Ibf::from_json(data) {
        let reencoded = ibf.to_json().expect("serializing a valid IBF cannot fail");
        let reparsed = Ibf::from_json(&reencoded).expect("re-parsing our own output cannot fail");
        assert_eq!(ibf, reparsed);
    }
});
