//! Push transport seam.
//!
//! The engine never talks to a push service directly; it drives a
//! [`PushTransport`] implementation injected by the binary. Failures come
//! back as a closed [`SendError`] taxonomy so the retry processor can record
//! a stable classification code instead of scraping free-form messages.

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::types::{ErrorDetail, PushPayload};

/// Errors a push transport can report for one delivery attempt.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("destination token is malformed")]
    InvalidToken,

    #[error("destination token is no longer registered")]
    Unregistered,

    #[error("push gateway rate limited the sender")]
    RateLimited,

    #[error("delivery attempt timed out")]
    Timeout,

    #[error("push gateway returned status {status}")]
    Gateway { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

impl SendError {
    /// Stable classification code recorded on metrics and retry records.
    ///
    /// `Unavailable` is the catch-all for failures the transport could not
    /// attribute, hence `UNKNOWN_ERROR`.
    pub fn code(&self) -> &'static str {
        match self {
            SendError::InvalidToken => "INVALID_TOKEN",
            SendError::Unregistered => "UNREGISTERED",
            SendError::RateLimited => "RATE_LIMITED",
            SendError::Timeout => "TIMEOUT",
            SendError::Gateway { .. } => "GATEWAY_ERROR",
            SendError::Network(_) => "NETWORK_ERROR",
            SendError::Unavailable(_) => "UNKNOWN_ERROR",
        }
    }

    /// Classify this failure for persistence, stamped with the current time.
    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            code: self.code().to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A client able to deliver one push payload to a destination token.
///
/// Implementations must resolve or fail in bounded time; the engine imposes
/// no timeout of its own.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, destination_token: &str, payload: &PushPayload) -> Result<(), SendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_stable_code() {
        assert_eq!(SendError::InvalidToken.code(), "INVALID_TOKEN");
        assert_eq!(SendError::Unregistered.code(), "UNREGISTERED");
        assert_eq!(SendError::RateLimited.code(), "RATE_LIMITED");
        assert_eq!(SendError::Timeout.code(), "TIMEOUT");
        assert_eq!(SendError::Gateway { status: 502 }.code(), "GATEWAY_ERROR");
        assert_eq!(SendError::Network("reset".into()).code(), "NETWORK_ERROR");
        assert_eq!(SendError::Unavailable("?".into()).code(), "UNKNOWN_ERROR");
    }

    #[test]
    fn test_detail_carries_code_and_message() {
        let detail = SendError::Gateway { status: 503 }.detail();
        assert_eq!(detail.code, "GATEWAY_ERROR");
        assert!(detail.message.contains("503"));
    }
}
