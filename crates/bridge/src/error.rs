//! Bridge error type.

use std::time::Duration;

use thiserror::Error;

/// Failures surfaced to the decision-loop side of the bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller broke the one-batch-per-step handshake.
    #[error("rendezvous contract violation: {0}")]
    ContractViolation(&'static str),

    /// The engine did not deliver a snapshot before the configured deadline.
    #[error("no snapshot from the engine within {waited:?}")]
    Timeout {
        /// Configured deadline that elapsed.
        waited: Duration,
    },

    /// The store was shut down while a caller was waiting.
    #[error("rendezvous store closed")]
    Closed,

    /// Featurizer output did not match its declared dimension.
    #[error("featurizer produced {got} values, expected {expected}")]
    FeatureShape {
        /// Declared [`crate::Featurizer::dim`].
        expected: usize,
        /// Length actually returned.
        got: usize,
    },

    /// Settings rejected before the bridge starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias defaulting to the bridge [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
