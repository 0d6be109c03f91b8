//! Error taxonomy for client operations.
//!
//! Every failure a component can produce is recovered into one of these
//! variants at the component boundary; nothing escapes to callers as a
//! raw transport or decode error.

use thiserror::Error;

/// Primary error type for data-access operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected locally before any network call was issued.
    #[error("{message}")]
    Precondition {
        /// What the caller must fix before resubmitting.
        message: String,
    },
    /// The server confirmed the bearer credential is invalid; the token
    /// store has been cleared and the user must sign in again.
    #[error("session expired; sign in again")]
    SessionExpired,
    /// Any other non-2xx response, with the message derived from the
    /// failure envelope.
    #[error("{message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Envelope-derived user-facing message.
        message: String,
    },
    /// A success response arrived in none of the documented shapes.
    #[error("unexpected response format: {reason}")]
    UnexpectedFormat {
        /// What made the payload unclassifiable.
        reason: String,
    },
    /// The request never completed: connection failure or timeout.
    #[error("network failure: {detail}")]
    Network {
        /// Transport-level description.
        detail: String,
    },
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Build a precondition error from any message.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Build a format error from any reason.
    pub fn unexpected_format(reason: impl Into<String>) -> Self {
        Self::UnexpectedFormat {
            reason: reason.into(),
        }
    }

    /// Whether the caller should route the user back to login.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let detail = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self::Network { detail }
    }
}
