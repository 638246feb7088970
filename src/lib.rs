//! Set reconciliation between two parties holding fixed-width binary keys
//! (e.g. 32-byte content hashes), via Invertible Bloom Filters, as found in
//! [What's the Difference? Efficient Set Reconciliation without Prior Context](https://www.ics.uci.edu/~eppstein/pubs/EppGooUye-SIGCOMM-11.pdf)
//!
//! At completion each party learns the keys present in the other's set but
//! absent from its own (the symmetric set difference), while transmitting
//! data proportional to the size of that difference, not the size of
//! either set.
//!
//! Expected use case looks something like this.
//! ```rust
//! use reconcile_core::Reconciler;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let local_keys = vec![vec![1u8; 32], vec![2u8; 32], vec![3u8; 32]];
//! let remote_keys = vec![vec![1u8; 32], vec![2u8; 32], vec![4u8; 32]];
//!
//! let local = Reconciler::new(local_keys, remote_keys.len())?;
//! let remote = Reconciler::new(remote_keys, 3)?;
//!
//! // Exchange estimators, each side computes the same estimate independently.
//! let local_estimate = local.estimate_difference(&remote.get_estimator()?)?;
//! let size = Reconciler::recommended_ibf_size(local_estimate);
//!
//! // Exchange IBF signatures sized accordingly.
//! let remote_sig = remote.get_ibf_signature(size)?;
//! let diff = local.get_difference(size, &remote_sig)?;
//! assert!(diff.complete);
//! # Ok(())
//! # }
//! ```
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    rustdoc::broken_intra_doc_links
)]
#![allow(clippy::type_complexity)]

mod error;
mod hybrid;
mod ibf;
mod minhash;
mod murmur3;
mod reconcile;
mod strata;
mod wire;

pub use error::{ReconcileError, Result};
pub use hybrid::Hybrid;
pub use ibf::{DecodeOutcome, Ibf};
pub use minhash::MinHash;
pub use reconcile::Reconciler;
pub use strata::{Strata, DEFAULT_CELLSIZE};
pub use wire::{IbfWire, MinHashWire};

/// Low-level Murmur3-128 hashing, exposed for interoperability testing
/// against other implementations of this protocol.
pub mod hash {
    pub use crate::murmur3::{sum128, sum128_words, sum128x32};
}
