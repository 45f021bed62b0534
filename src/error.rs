// Error taxonomy for calls to the moderation provider and the chat backend.
//
// Check adapters never bubble these up: a failed call becomes that check's
// Failed outcome. Only the chat backend error reaches the caller, wrapped in
// ChatBackendError so it can't be mistaken for a moderation rejection.

use std::time::Duration;

use thiserror::Error;

/// Why a single call to an external endpoint did not produce a usable answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network, DNS or connection failure before a status code was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The body was received but didn't match the expected contract.
    #[error("unexpected response shape: {0}")]
    ResponseShape(String),

    /// The request was never sent because it was malformed locally.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No answer within the allotted time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest doesn't report the configured limit, only that it elapsed
            ApiError::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            ApiError::ResponseShape(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// The chat backend failed to answer a message that passed moderation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chat backend error: {0}")]
pub struct ChatBackendError(#[from] pub ApiError);
