#![no_main]
use libfuzzer_sys::fuzz_target;
use reconcile_core::Ibf;
use std::collections::HashSet;

const KEYSIZE: usize = 16;

fuzz_target!(|data: &[u8]| {
    let mut ibf = Ibf::new(997, KEYSIZE);
    let set: HashSet<Vec<u8>> = data
        .chunks(KEYSIZE)
        .filter(|c| c.len() == KEYSIZE)
        .map(|c| c.to_vec())
        .collect();
    for key in &set {
        ibf.add(key).unwrap();
    }
    let outcome = ibf.decode();
    assert!(
        outcome.complete,
        "a single-sided IBF built from a unique key set should always decode: {set:?}"
    );
});
