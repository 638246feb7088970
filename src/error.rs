use thiserror::Error;

/// Errors produced by the codec and estimator layers.
///
/// Decode incompleteness is *not* represented here (an undersized IBF is
/// an expected outcome, not a failure), and is surfaced through
/// [`crate::ibf::DecodeOutcome::complete`] instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A key passed to `Add`/`Remove`/`Update` did not match the filter's `keysize`.
    #[error("key size mismatch: filter expects {expected} bytes, got {actual}")]
    KeySizeMismatch {
        /// The filter's configured key width.
        expected: usize,
        /// The length of the key that was rejected.
        actual: usize,
    },

    /// Two structures were combined (`Subtract`, `Similarity`, `Estimate`) but
    /// their dimensions (`size`, `keysize`, `hashcount`, `depth`) disagree.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A wire-format payload's array lengths disagree with its declared
    /// `size`/`keysize` header fields.
    #[error("wire format length mismatch: {0}")]
    WireLengthMismatch(String),

    /// JSON (de)serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The `data` hex string could not be decoded.
    #[error("invalid hex payload: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReconcileError>;
