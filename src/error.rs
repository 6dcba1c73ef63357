//! Error taxonomy for the store and the analysis pipeline
//!
//! A lookup miss is not an error: stores answer `Ok(None)` for it.
//! Service and parsing failures never leave the pipeline; they are folded
//! into a fallback verdict before `run_analysis` returns.

use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Store-internal invariant violation. Should not happen in normal operation.
    #[error("storage fault in collection '{collection}': {reason}")]
    StorageFault { collection: String, reason: String },

    /// A payload handed to `add_item` did not serialize to a field map.
    #[error("payload is not a field map: {0}")]
    InvalidPayload(String),

    /// A stored record could not be decoded into the requested shape.
    #[error("record '{id}' does not match the expected shape: {reason}")]
    InvalidRecord { id: String, reason: String },

    /// A batch step did not apply; the collection was left unchanged.
    #[error("batch aborted at step {step}: {reason}")]
    BatchAborted { step: usize, reason: String },

    #[error("completion service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("completion service did not answer within {0:?}")]
    ServiceTimeout(Duration),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl Error {
    pub(crate) fn fault(collection: &str, reason: impl Into<String>) -> Self {
        Error::StorageFault {
            collection: collection.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the pipeline recovers from this error by falling back.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ServiceUnavailable(_) | Error::ServiceTimeout(_) | Error::MalformedResponse(_)
        )
    }
}
