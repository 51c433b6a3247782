use thiserror::Error;

/// Top-level error type for the `netpresence-api` crate.
///
/// Every failure the router session can produce: login, transport,
/// envelope-level errors, and malformed payloads. `netpresence-core`
/// folds all of these into its transport error category.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected by the router (bad credentials, lockout, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The session cookie expired or was revoked.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Router API ──────────────────────────────────────────────────
    /// The router answered with an `error` field other than `"ok"`.
    #[error("Router API error: {message}")]
    RouterApi { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if logging in again might resolve the error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
