//! MinHash (MaxHash) estimator for Jaccard similarity and set-difference size.
//!
//! ```rust
//! use reconcile_core::MinHash;
//!
//! let mut local = MinHash::new(128);
//! let mut remote = MinHash::new(128);
//! for i in 0u32..1000 {
//!     local.add(&i.to_be_bytes());
//! }
//! for i in 25u32..1025 {
//!     remote.add(&i.to_be_bytes());
//! }
//! let estimate = local.estimate_difference(&remote).unwrap();
//! assert!(estimate > 0);
//! ```

use crate::error::{ReconcileError, Result};
use crate::murmur3;

/// Fixed-length MaxHash signature used to estimate `|A ∩ B| / |A ∪ B|`.
///
/// Positions accumulate a running *maximum* (rather than the textbook
/// minimum) so the all-zero construction state is the identity element.
/// Any real hash value only ever raises a coordinate, never lowers one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHash {
    signature: Vec<u32>,
    keycount: usize,
}

impl MinHash {
    /// Creates a signature of `hashcount` zeroed coordinates.
    pub fn new(hashcount: usize) -> Self {
        Self {
            signature: vec![0; hashcount],
            keycount: 0,
        }
    }

    /// Number of hash coordinates in the signature.
    pub fn hashcount(&self) -> usize {
        self.signature.len()
    }

    /// Number of keys added so far.
    pub fn keycount(&self) -> usize {
        self.keycount
    }

    pub(crate) fn signature(&self) -> &[u32] {
        &self.signature
    }

    pub(crate) fn from_parts(signature: Vec<u32>, keycount: usize) -> Self {
        Self { signature, keycount }
    }

    /// Folds `key` into the signature: for each coordinate `i`, raises
    /// `signature[i]` to `max(signature[i], murmur3_128_seeded(key, i)[0])`.
    pub fn add(&mut self, key: &[u8]) {
        for (seed, slot) in self.signature.iter_mut().enumerate() {
            let h = murmur3::sum128x32(key, seed as u32)[0];
            if h > *slot {
                *slot = h;
            }
        }
        self.keycount += 1;
    }

    /// Fraction of coordinates that agree between `self` and `remote`.
    ///
    /// Fails if the two signatures have different lengths.
    pub fn similarity(&self, remote: &MinHash) -> Result<f64> {
        if self.signature.len() != remote.signature.len() {
            return Err(ReconcileError::DimensionMismatch(format!(
                "hashcount {} != {}",
                self.signature.len(),
                remote.signature.len()
            )));
        }
        let total = self.signature.len();
        if total == 0 {
            return Ok(1.0);
        }
        let matches = self
            .signature
            .iter()
            .zip(&remote.signature)
            .filter(|(a, b)| a == b)
            .count();
        Ok(matches as f64 / total as f64)
    }

    /// Estimates `|A △ B|` by inverting the Jaccard formula
    /// `J = |A∩B| / (|A|+|B|-|A∩B|)`.
    pub fn estimate_difference(&self, remote: &MinHash) -> Result<i64> {
        if self.signature.len() != remote.signature.len() {
            return Err(ReconcileError::DimensionMismatch(format!(
                "hashcount {} != {}",
                self.signature.len(),
                remote.signature.len()
            )));
        }
        let total = self.signature.len() as f64;
        let matches = self
            .signature
            .iter()
            .zip(&remote.signature)
            .filter(|(a, b)| a == b)
            .count() as f64;

        let combined = (self.keycount + remote.keycount) as f64;
        if total + matches == 0.0 {
            return Ok(0);
        }
        let estimate = combined * (total - matches) / (total + matches);
        Ok(estimate.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sets_have_zero_estimated_difference() {
        let mut a = MinHash::new(64);
        let mut b = MinHash::new(64);
        for i in 0u32..500 {
            a.add(&i.to_be_bytes());
            b.add(&i.to_be_bytes());
        }
        assert_eq!(a.estimate_difference(&b).unwrap(), 0);
        assert_eq!(a.similarity(&b).unwrap(), 1.0);
    }

    #[test]
    fn disjoint_sets_have_low_similarity() {
        let mut a = MinHash::new(128);
        let mut b = MinHash::new(128);
        for i in 0u32..2000 {
            a.add(&i.to_be_bytes());
        }
        for i in 1_000_000u32..1_002_000 {
            b.add(&i.to_be_bytes());
        }
        assert!(a.similarity(&b).unwrap() < 0.05);
    }

    #[test]
    fn similarity_rejects_mismatched_lengths() {
        let a = MinHash::new(16);
        let b = MinHash::new(32);
        assert!(a.similarity(&b).is_err());
        assert!(a.estimate_difference(&b).is_err());
    }

    #[test]
    fn estimate_error_bound() {
        // |A|=|B|=2000 sharing 1000 => |A△B| = 2000, J = 1000/3000 = 1/3.
        let mut a = MinHash::new(4096);
        let mut b = MinHash::new(4096);
        for i in 0u32..2000 {
            a.add(&i.to_be_bytes());
        }
        for i in 1000u32..3000 {
            b.add(&i.to_be_bytes());
        }
        let estimate = a.estimate_difference(&b).unwrap() as f64;
        let tolerance = 2000.0 / (4096.0_f64).sqrt() + 200.0;
        assert!(
            (estimate - 2000.0).abs() <= tolerance,
            "estimate {estimate} too far from 2000"
        );
    }
}
