// ── Core error types ──
//
// Errors surfaced by netpresence-core. Callers never see HTTP status codes
// or JSON parse failures directly: `From<netpresence_api::Error>` folds
// transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fetch errors ─────────────────────────────────────────────────
    #[error("Cannot reach router at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Router authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Router request timed out")]
    Timeout,

    #[error("Router error: {message}")]
    Router { message: String },

    #[error("Malformed router response: {message}")]
    MalformedResponse { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for failures while talking to the router.
    ///
    /// These leave entity state untouched and only flag the data as
    /// unavailable until the next successful fetch.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::AuthenticationFailed { .. }
                | Self::Timeout
                | Self::Router { .. }
                | Self::MalformedResponse { .. }
        )
    }

    /// Returns `true` if a later attempt can be expected to succeed
    /// without reconfiguration.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout | Self::Router { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<netpresence_api::Error> for CoreError {
    fn from(err: netpresence_api::Error) -> Self {
        use netpresence_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- re-authentication required".into(),
            },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Router {
                        message: e.to_string(),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::RouterApi { message } => CoreError::Router { message },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
        }
    }
}
