//! Invertible Bloom Filter over fixed-width binary keys.
//!
//! ```rust
//! use reconcile_core::Ibf;
//!
//! let mut left = Ibf::new(20, 4);
//! let mut right = Ibf::new(20, 4);
//! left.add(b"aaaa").unwrap();
//! left.add(b"bbbb").unwrap();
//! right.add(b"aaaa").unwrap();
//! right.add(b"cccc").unwrap();
//!
//! left.subtract(&right).unwrap();
//! let outcome = left.decode();
//! assert!(outcome.complete);
//! assert!(outcome.a_only.contains(&b"bbbb".to_vec()));
//! assert!(outcome.b_only.contains(&b"cccc".to_vec()));
//! ```

use crate::error::{ReconcileError, Result};
use crate::murmur3;

/// Number of hash functions used to place a key into the filter.
///
/// The first word of the Murmur3 digest becomes the cell hash check; the
/// remaining three words become bucket indices. Three is the minimum the
/// construction needs to converge probabilistically.
const HASH_COUNT: usize = 3;

/// Result of [`Ibf::decode`].
///
/// Decoding an undersized filter is not an error: `complete == false` just
/// means the returned lists are a partial (possibly empty) lower bound,
/// and the caller should retry with a larger filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Keys present only on the side that contributed positive counts (`A`).
    pub a_only: Vec<Vec<u8>>,
    /// Keys present only on the side that contributed negative counts (`B`).
    pub b_only: Vec<Vec<u8>>,
    /// Whether every cell returned to the all-zero state after decoding.
    pub complete: bool,
}

/// Invertible Bloom Filter: a fixed-size cell array over `keysize`-byte keys.
///
/// Subtracting two IBFs built over key sets `A` and `B` and decoding the
/// result recovers `A \ B` and `B \ A`, provided the filter is sized close
/// to `|A △ B|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ibf {
    size: usize,
    keysize: usize,
    counts: Vec<i64>,
    hashes: Vec<u32>,
    /// `size * keysize` bytes, cell `i`'s keysum at `[i*keysize .. (i+1)*keysize]`.
    data: Vec<u8>,
}

impl Ibf {
    /// Creates an empty filter with `size` cells over `keysize`-byte keys.
    ///
    /// Both parameters are clamped to a minimum of 1, matching the source's
    /// `max(1, ...)` guard: a zero-sized filter cannot place any key.
    pub fn new(size: usize, keysize: usize) -> Self {
        let size = size.max(1);
        let keysize = keysize.max(1);
        Self {
            size,
            keysize,
            counts: vec![0; size],
            hashes: vec![0; size],
            data: vec![0; size * keysize],
        }
    }

    /// Number of cells in this filter.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Configured key width in bytes.
    pub fn keysize(&self) -> usize {
        self.keysize
    }

    pub(crate) fn counts(&self) -> &[i64] {
        &self.counts
    }

    pub(crate) fn hashes(&self) -> &[u32] {
        &self.hashes
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    /// Rebuilds a filter from its raw parts, validating dimensions.
    pub(crate) fn from_parts(
        size: usize,
        keysize: usize,
        hashes: Vec<u32>,
        counts: Vec<i64>,
        data: Vec<u8>,
    ) -> Result<Self> {
        if hashes.len() != size || counts.len() != size || data.len() != size * keysize {
            return Err(ReconcileError::WireLengthMismatch(format!(
                "expected hashes/counts of length {size} and data of length {}, got {}/{}/{}",
                size * keysize,
                hashes.len(),
                counts.len(),
                data.len()
            )));
        }
        Ok(Self {
            size,
            keysize,
            counts,
            hashes,
            data,
        })
    }

    fn keysum(&self, index: usize) -> &[u8] {
        let start = index * self.keysize;
        &self.data[start..start + self.keysize]
    }

    fn keysum_mut(&mut self, index: usize) -> &mut [u8] {
        let start = index * self.keysize;
        &mut self.data[start..start + self.keysize]
    }

    /// Cell hash and the three bucket indices for `key`: the first Murmur3
    /// word is the stored cell hash, the remaining three are indices.
    fn locate(&self, key: &[u8]) -> (u32, [usize; HASH_COUNT]) {
        let (w0, w1) = murmur3::sum128_words(key, 0);
        let a = w0 as u32;
        let b = (w0 >> 32) as u32;
        let c = w1 as u32;
        let d = (w1 >> 32) as u32;
        let indices = [
            (b as u64 % self.size as u64) as usize,
            (c as u64 % self.size as u64) as usize,
            (d as u64 % self.size as u64) as usize,
        ];
        (a, indices)
    }

    fn update(
        &mut self,
        key: &[u8],
        hash: u32,
        indices: &[usize; HASH_COUNT],
        delta: i64,
    ) -> Result<()> {
        if key.len() != self.keysize {
            return Err(ReconcileError::KeySizeMismatch {
                expected: self.keysize,
                actual: key.len(),
            });
        }
        for &index in indices {
            let cell = self.keysum_mut(index);
            for (byte, k) in cell.iter_mut().zip(key) {
                *byte ^= k;
            }
            self.hashes[index] ^= hash;
            self.counts[index] += delta;
        }
        Ok(())
    }

    /// Adds `key` to the filter. Fails if `key.len() != self.keysize()`.
    pub fn add(&mut self, key: &[u8]) -> Result<()> {
        let (hash, indices) = self.locate(key);
        self.update(key, hash, &indices, 1)
    }

    /// Removes `key` from the filter. Fails if `key.len() != self.keysize()`.
    ///
    /// Useful for undoing an `add`, and internally by `decode` to peel off
    /// recovered keys.
    pub fn remove(&mut self, key: &[u8]) -> Result<()> {
        let (hash, indices) = self.locate(key);
        self.update(key, hash, &indices, -1)
    }

    /// Element-wise subtracts `other` from `self` in place.
    ///
    /// Fails if the two filters don't share the same `size` and `keysize`.
    pub fn subtract(&mut self, other: &Ibf) -> Result<()> {
        if self.size != other.size {
            return Err(ReconcileError::DimensionMismatch(format!(
                "size {} != {}",
                self.size, other.size
            )));
        }
        if self.keysize != other.keysize {
            return Err(ReconcileError::DimensionMismatch(format!(
                "keysize {} != {}",
                self.keysize, other.keysize
            )));
        }
        for (byte, other_byte) in self.data.iter_mut().zip(&other.data) {
            *byte ^= other_byte;
        }
        for i in 0..self.size {
            self.hashes[i] ^= other.hashes[i];
            self.counts[i] -= other.counts[i];
        }
        Ok(())
    }

    fn is_pure(&self, index: usize) -> bool {
        let count = self.counts[index];
        if count != 1 && count != -1 {
            return false;
        }
        let (hash, _) = self.locate(self.keysum(index));
        hash == self.hashes[index]
    }

    fn is_empty_cell(&self, index: usize) -> bool {
        self.counts[index] == 0
            && self.hashes[index] == 0
            && self.keysum(index).iter().all(|&b| b == 0)
    }

    /// Destructively decodes the filter, peeling pure cells in LIFO order
    /// until none remain. The recovered key set doesn't depend on that
    /// order, since XOR composition is commutative.
    ///
    /// After a complete decode the filter is all-zero. After an incomplete
    /// decode the filter is left in an unspecified state.
    pub fn decode(&mut self) -> DecodeOutcome {
        let mut a_only = Vec::new();
        let mut b_only = Vec::new();

        let mut worklist: Vec<usize> = (0..self.size).filter(|&i| self.is_pure(i)).collect();

        while let Some(index) = worklist.pop() {
            if !self.is_pure(index) {
                continue;
            }
            let key = self.keysum(index).to_vec();
            let count = self.counts[index];
            let (hash, indices) = self.locate(&key);

            if count > 0 {
                a_only.push(key.clone());
            } else {
                b_only.push(key.clone());
            }

            // Never errors: `key.len() == self.keysize` by construction.
            let _ = self.update(&key, hash, &indices, -count);

            for idx in indices {
                if self.is_pure(idx) {
                    worklist.push(idx);
                }
            }
        }

        let complete = (0..self.size).all(|i| self.is_empty_cell(i));
        tracing::trace!(size = self.size, complete, "ibf decode finished");

        DecodeOutcome {
            a_only,
            b_only,
            complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Vec<u8> {
        vec![byte; 4]
    }

    #[test]
    fn add_remove_is_identity() {
        let mut f = Ibf::new(16, 4);
        let before = f.clone();
        f.add(&key(1)).unwrap();
        f.remove(&key(1)).unwrap();
        assert_eq!(f, before);
    }

    #[test]
    fn add_rejects_wrong_keysize() {
        let mut f = Ibf::new(16, 4);
        assert!(f.add(&[1, 2, 3]).is_err());
    }

    #[test]
    fn subtract_rejects_mismatched_dimensions() {
        let mut a = Ibf::new(16, 4);
        let b = Ibf::new(8, 4);
        assert!(a.subtract(&b).is_err());
    }

    #[test]
    fn insertion_order_is_commutative() {
        let mut a = Ibf::new(32, 4);
        let mut b = Ibf::new(32, 4);
        for k in [1u8, 2, 3, 4, 5] {
            a.add(&key(k)).unwrap();
        }
        for k in [5u8, 3, 1, 4, 2] {
            b.add(&key(k)).unwrap();
        }
        assert_eq!(a, b);
    }

    #[test]
    fn subtract_equals_direct_construction() {
        let xs = [key(1), key(2), key(3)];
        let ys = [key(4), key(5)];

        let mut subtracted = Ibf::new(32, 4);
        for x in &xs {
            subtracted.add(x).unwrap();
        }
        let mut ys_filter = Ibf::new(32, 4);
        for y in &ys {
            ys_filter.add(y).unwrap();
        }
        subtracted.subtract(&ys_filter).unwrap();

        let mut removed = Ibf::new(32, 4);
        for x in &xs {
            removed.add(x).unwrap();
        }
        for y in &ys {
            removed.remove(y).unwrap();
        }

        assert_eq!(subtracted, removed);
    }

    #[test]
    fn empty_diff_decodes_complete() {
        let mut a = Ibf::new(8, 4);
        let mut b = Ibf::new(8, 4);
        for k in 0..10u8 {
            a.add(&key(k)).unwrap();
            b.add(&key(k)).unwrap();
        }
        a.subtract(&b).unwrap();
        let outcome = a.decode();
        assert!(outcome.complete);
        assert!(outcome.a_only.is_empty());
        assert!(outcome.b_only.is_empty());
    }

    #[test]
    fn single_diff_decodes_the_extra_key() {
        let mut a = Ibf::new(8, 4);
        let mut b = Ibf::new(8, 4);
        for k in 0..10u8 {
            a.add(&key(k)).unwrap();
            b.add(&key(k)).unwrap();
        }
        let extra = key(200);
        b.add(&extra).unwrap();

        b.subtract(&a).unwrap();
        let outcome = b.decode();
        assert!(outcome.complete);
        assert_eq!(outcome.a_only, vec![extra]);
        assert!(outcome.b_only.is_empty());
    }

    #[test]
    fn undersized_filter_reports_incomplete() {
        let mut a = Ibf::new(2, 4);
        let mut b = Ibf::new(2, 4);
        for k in 0..60u8 {
            a.add(&key(k)).unwrap();
        }
        for k in 60..120u8 {
            b.add(&key(k)).unwrap();
        }
        a.subtract(&b).unwrap();
        let outcome = a.decode();
        assert!(!outcome.complete);
    }

    #[test]
    fn decoder_soundness() {
        use std::collections::HashSet;
        let a_keys: HashSet<Vec<u8>> = (0u8..50).map(key).collect();
        let shared: HashSet<Vec<u8>> = (0u8..40).map(key).collect();
        let b_extra: HashSet<Vec<u8>> = (200u8..205).map(key).collect();

        let mut a = Ibf::new(100, 4);
        for k in a_keys.union(&shared) {
            a.add(k).unwrap();
        }
        let mut b = Ibf::new(100, 4);
        for k in shared.union(&b_extra) {
            b.add(k).unwrap();
        }

        a.subtract(&b).unwrap();
        let outcome = a.decode();
        assert!(outcome.complete);
        for k in &outcome.a_only {
            assert!(a_keys.contains(k) && !shared.contains(k));
        }
        for k in &outcome.b_only {
            assert!(b_extra.contains(k));
        }
    }
}
