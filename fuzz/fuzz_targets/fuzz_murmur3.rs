#![no_main]
use libfuzzer_sys::fuzz_target;
use reconcile_core::hash::sum128x32;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let seed = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let key = &data[4..];
    let a = sum128x32(key, seed);
    let b = sum128x32(key, seed);
    assert_eq!(a, b, "murmur3 must be deterministic for the same input");
});
