//! End-to-end reconciliation flow: estimate → size the IBF → exchange → decode.

use crate::error::Result;
use crate::ibf::{DecodeOutcome, Ibf};
use crate::strata::{Strata, DEFAULT_CELLSIZE};

/// Stateful driver for one side of a reconciliation session.
///
/// Holds the local key set and knows (or has been told) the remote set's
/// approximate size, which together fix `depth = ceil(log2(max(|local|,
/// remote_size)))` for the Strata estimator both parties must agree on.
#[derive(Debug, Clone)]
pub struct Reconciler {
    keys: Vec<Vec<u8>>,
    keysize: usize,
    depth: usize,
    estimator: Strata,
}

impl Reconciler {
    /// Builds a reconciler over `keys` (all must share one `keysize`),
    /// given the remote party's advertised (or assumed) set size.
    ///
    /// Populates the local Strata estimator immediately so
    /// [`Reconciler::get_estimator`] is ready to call right away.
    pub fn new(keys: Vec<Vec<u8>>, remote_set_size: usize) -> Result<Self> {
        let keysize = keys.first().map(|k| k.len()).unwrap_or(1);
        let depth = ((keys.len().max(remote_set_size).max(1)) as f64)
            .log2()
            .ceil() as usize;
        let depth = depth.max(1);

        let mut estimator = Strata::new(DEFAULT_CELLSIZE, keysize, depth);
        for key in &keys {
            estimator.add(key)?;
        }

        Ok(Self {
            keys,
            keysize,
            depth,
            estimator,
        })
    }

    /// The `depth` this reconciler negotiated for its Strata estimator.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Serializes the local Strata estimator for exchange with the peer.
    pub fn get_estimator(&self) -> Result<Vec<u8>> {
        self.estimator.to_json()
    }

    /// Deserializes a peer's Strata estimator (must share `depth`) and
    /// returns its estimate of `|A △ B|`.
    pub fn estimate_difference(&self, remote_estimator: &[u8]) -> Result<i64> {
        let remote = Strata::from_json(remote_estimator)?;
        self.estimator.estimate_differences(&remote)
    }

    /// Builds an IBF of `size` cells over the local key set and serializes it.
    pub fn get_ibf_signature(&self, size: usize) -> Result<Vec<u8>> {
        let mut ibf = Ibf::new(size, self.keysize);
        for key in &self.keys {
            ibf.add(key)?;
        }
        ibf.to_json()
    }

    /// Rebuilds the local IBF at `size`, subtracts the deserialized peer
    /// IBF, decodes, and returns the recovered local-only/remote-only keys.
    pub fn get_difference(&self, size: usize, remote_signature: &[u8]) -> Result<DecodeOutcome> {
        let mut ibf = Ibf::new(size, self.keysize);
        for key in &self.keys {
            ibf.add(key)?;
        }
        let remote = Ibf::from_json(remote_signature)?;
        ibf.subtract(&remote)?;
        let outcome = ibf.decode();
        tracing::debug!(
            size,
            complete = outcome.complete,
            a_only = outcome.a_only.len(),
            b_only = outcome.b_only.len(),
            "reconciliation difference decoded"
        );
        Ok(outcome)
    }

    /// Recommended IBF size for a given difference estimate: `1.5x` plus a
    /// small constant, floored at 8.
    pub fn recommended_ibf_size(estimate: i64) -> usize {
        let scaled = (estimate.max(0) as f64 * 1.5).ceil() as i64 + 2;
        scaled.max(8) as usize
    }
}
