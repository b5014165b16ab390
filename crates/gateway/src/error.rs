//! Gateway error types.

use thiserror::Error;

/// Errors from completion-endpoint calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Transport-level failure, including the per-call timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint returned a non-success status.
    #[error("API error: {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body could not be interpreted: unparseable JSON,
    /// no choices, or an assistant message with neither content nor
    /// tool calls.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
