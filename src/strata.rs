//! Strata Estimator: a stack of IBFs partitioned by trailing-zero count,
//! used to estimate `|A △ B|` when the difference is small-to-medium
//! relative to the sets.

use crate::error::{ReconcileError, Result};
use crate::ibf::Ibf;

/// Default per-stratum IBF size, matching the source's `StrataEstimator`
/// default.
pub const DEFAULT_CELLSIZE: usize = 80;

/// Counts trailing zero bits across the first three bytes of `key`
/// (byte 0 least-significant-bit first), clamped to `limit`.
///
/// Shared by [`Strata`] and the Hybrid estimator rather than duplicated.
pub(crate) fn trailing_zeros3(key: &[u8], limit: usize) -> usize {
    let value = (key[0] as u32) | ((key[1] as u32) << 8) | ((key[2] as u32) << 16);
    let tz = if value == 0 {
        24
    } else {
        value.trailing_zeros() as usize
    };
    tz.min(limit)
}

/// A vector of `depth` IBFs, each of common `cellsize` and `keysize`.
///
/// Keys are bucketed by `trailing_zeros3(key, depth - 1)`: since that count
/// thins out geometrically, any difference becomes visible at the lowest
/// stratum that isn't saturated.
#[derive(Debug, Clone)]
pub struct Strata {
    cellsize: usize,
    keysize: usize,
    depth: usize,
    ibfs: Vec<Ibf>,
}

impl Strata {
    /// Builds an empty estimator with `depth` strata of `cellsize` cells
    /// each, over `keysize`-byte keys.
    pub fn new(cellsize: usize, keysize: usize, depth: usize) -> Self {
        let depth = depth.max(1);
        let ibfs = (0..depth)
            .map(|_| Ibf::new(cellsize, keysize))
            .collect::<Vec<_>>();
        Self {
            cellsize,
            keysize,
            depth,
            ibfs,
        }
    }

    /// Builds an empty estimator with the default `cellsize` (80).
    pub fn with_default_cellsize(keysize: usize, depth: usize) -> Self {
        Self::new(DEFAULT_CELLSIZE, keysize, depth)
    }

    /// Number of strata.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Per-stratum IBF size.
    pub fn cellsize(&self) -> usize {
        self.cellsize
    }

    /// Configured key width in bytes.
    pub fn keysize(&self) -> usize {
        self.keysize
    }

    pub(crate) fn ibfs(&self) -> &[Ibf] {
        &self.ibfs
    }

    pub(crate) fn from_parts(cellsize: usize, keysize: usize, ibfs: Vec<Ibf>) -> Self {
        Self {
            cellsize,
            keysize,
            depth: ibfs.len(),
            ibfs,
        }
    }

    /// Adds `key` to its stratum (`trailing_zeros3(key, depth - 1)`).
    ///
    /// Fails if `key.len() != keysize`.
    pub fn add(&mut self, key: &[u8]) -> Result<()> {
        let stratum = trailing_zeros3(key, self.depth - 1);
        self.ibfs[stratum].add(key)
    }

    /// Estimates `|A △ B|` against a `remote` estimator of the same shape.
    ///
    /// Walks strata from highest to lowest, subtracting and decoding each;
    /// once a stratum fails to decode, extrapolates from the strata that
    /// did decode by doubling per unscanned level.
    ///
    /// Fails if `self` and `remote` don't share the same `depth`.
    pub fn estimate_differences(&self, remote: &Strata) -> Result<i64> {
        if self.depth != remote.depth {
            return Err(ReconcileError::DimensionMismatch(format!(
                "depth {} != {}",
                self.depth, remote.depth
            )));
        }

        let mut count: i64 = 0;
        for level in (0..self.depth).rev() {
            let mut diff = self.ibfs[level].clone();
            diff.subtract(&remote.ibfs[level])?;
            let outcome = diff.decode();
            if !outcome.complete {
                let extrapolated = count * (1i64 << (level as u32 + 1));
                tracing::debug!(level, count, extrapolated, "strata decode stalled");
                return Ok(extrapolated);
            }
            count += (outcome.a_only.len() + outcome.b_only.len()) as i64;
            tracing::debug!(level, a = outcome.a_only.len(), b = outcome.b_only.len(), "stratum decoded");
        }
        Ok(count)
    }
}
