//! Hybrid Estimator: MinHash over the low-trailing-zero (majority) strata,
//! IBFs over the high-trailing-zero (thin) strata.
//!
//! For a set expected to hold up to `2^depth` keys, levels 0 and 1 (which
//! together hold roughly 3/4 of a well-distributed set) get a MinHash
//! signature each; levels `2..depth` each get an IBF, exactly like
//! [`crate::strata::Strata`].
//!
//! The combination policy for mixing MinHash and IBF strata into one
//! difference estimate is an open question in the source material (its
//! `EstimateSizeDifference` just prints the MinHash score instead of
//! folding it in). This implementation's policy, decided in DESIGN.md: at
//! levels 0/1, scale the MinHash-estimated difference on the *combined*
//! low-level population to that stratum's expected share, then fold it
//! into the same high-to-low extrapolation the plain Strata estimator
//! uses, with Strata's all-IBF walk as the required fallback when a
//! caller doesn't want the mixed estimator.

use crate::error::{ReconcileError, Result};
use crate::ibf::Ibf;
use crate::minhash::MinHash;
use crate::strata::trailing_zeros3;

/// Per-stratum MinHash signature length, matching the source's `NewMinHash(100, ...)`.
pub const MINHASH_HASHCOUNT: usize = 100;

/// Per-stratum IBF size for levels 2 and above, matching [`crate::strata::DEFAULT_CELLSIZE`].
pub const IBF_CELLSIZE: usize = crate::strata::DEFAULT_CELLSIZE;

/// Estimator mixing MinHash (levels 0, 1) and IBF (levels 2..depth) strata.
#[derive(Debug, Clone)]
pub struct Hybrid {
    depth: usize,
    keysize: usize,
    minhash: [MinHash; 2],
    ibfs: Vec<Ibf>,
}

impl Hybrid {
    /// Builds an empty estimator for a set expected to hold up to `2^depth`
    /// keys of `keysize` bytes. `depth` must be at least 2 (so there is at
    /// least one IBF stratum above the two MinHash levels); smaller depths
    /// are clamped up to 2.
    pub fn new(keysize: usize, depth: usize) -> Self {
        let depth = depth.max(2);
        let ibfs = (0..depth - 2)
            .map(|_| Ibf::new(IBF_CELLSIZE, keysize))
            .collect::<Vec<_>>();
        Self {
            depth,
            keysize,
            minhash: [MinHash::new(MINHASH_HASHCOUNT), MinHash::new(MINHASH_HASHCOUNT)],
            ibfs,
        }
    }

    /// Chooses `depth = ceil(log2(n))` for a set of `n` keys, per the same rule [`crate::reconcile::Reconciler`] uses.
    pub fn for_set_size(keysize: usize, n: usize) -> Self {
        let depth = (n.max(1) as f64).log2().ceil() as usize;
        Self::new(keysize, depth)
    }

    /// Number of strata (2 MinHash levels + `depth - 2` IBF levels).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Adds `key` to the stratum `min(trailing_zeros3(key), depth - 1)`
    /// selects: MinHash for levels 0/1, the corresponding IBF otherwise.
    pub fn add(&mut self, key: &[u8]) -> Result<()> {
        let stratum = trailing_zeros3(key, self.depth - 1);
        if stratum < 2 {
            self.minhash[stratum].add(key);
        } else {
            self.ibfs[stratum - 2].add(key)?;
        }
        Ok(())
    }

    /// Estimates `|A △ B|` against a `remote` estimator of the same shape.
    ///
    /// Walks strata high-to-low like [`crate::strata::Strata::estimate_differences`];
    /// at levels 0 and 1 it instead scales each MinHash-estimated difference
    /// by that level's expected share of the full key population
    /// (`2^-(level+1)`), since MinHash estimates the *whole* low-level
    /// population's difference, not a single stratum's.
    pub fn estimate_differences(&self, remote: &Hybrid) -> Result<i64> {
        if self.depth != remote.depth {
            return Err(ReconcileError::DimensionMismatch(format!(
                "depth {} != {}",
                self.depth, remote.depth
            )));
        }

        let mut count: i64 = 0;
        for level in (0..self.depth).rev() {
            if level < 2 {
                let estimate = self.minhash[level].estimate_difference(&remote.minhash[level])?;
                let share = 1.0 / (1u64 << (level + 1)) as f64;
                count += (estimate as f64 * share).round() as i64;
                tracing::debug!(level, estimate, "hybrid minhash stratum folded in");
                continue;
            }

            let mut diff = self.ibfs[level - 2].clone();
            diff.subtract(&remote.ibfs[level - 2])?;
            let outcome = diff.decode();
            if !outcome.complete {
                let extrapolated = count * (1i64 << (level as u32 + 1));
                tracing::debug!(level, count, extrapolated, "hybrid ibf stratum stalled");
                return Ok(extrapolated);
            }
            count += (outcome.a_only.len() + outcome.b_only.len()) as i64;
        }
        Ok(count)
    }

    /// Configured key width in bytes.
    pub fn keysize(&self) -> usize {
        self.keysize
    }
}
