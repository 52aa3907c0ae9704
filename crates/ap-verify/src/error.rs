// error.rs — Error types for the verification client.
//
// Every variant blocks the protected action; the taxonomy exists so audit
// trails can distinguish an infrastructure failure from a policy outcome.
// A deny is NOT an error at this layer — it is a Decision with allow=false.

use std::time::Duration;

use thiserror::Error;

/// Verification failures.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Authority unreachable or erroring after retry exhaustion
    /// (timeout, connection failure, 5xx).
    #[error("authority unavailable: {message}")]
    Unavailable { message: String },

    /// Contract violation in the remote response. Never retried.
    #[error("invalid response from authority: {message}")]
    InvalidResponse { message: String },

    /// Authentication or permission failure against the authority itself.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Unknown agent, policy, or passport (404).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Authority is rate limiting this client.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Client-side configuration problem (bad base URL, TLS setup).
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl VerifyError {
    /// Whether the retry loop may attempt the request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            Self::Unavailable {
                message: err.to_string(),
            }
        }
    }
}

/// Result type for verification operations.
pub type VerifyResult<T> = Result<T, VerifyError>;
