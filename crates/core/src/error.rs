use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a [`crate::ChainAdapter`]
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// The request never produced a usable response
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with an error object
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A single item could not be decoded; adapters skip it
    #[error("decode error: {0}")]
    Decode(String),

    #[error("call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("expected {expected} lookup results, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors returned from a reconciliation tick
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Fetching the pending snapshot failed; engine state was left untouched
    #[error("failed to fetch pending snapshot from {adapter}: {source}")]
    Fetch {
        adapter: String,
        #[source]
        source: AdapterError,
    },
}
