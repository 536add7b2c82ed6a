// ── Core error types ──
//
// User-facing errors from ucictl-core. Commit-protocol outcomes (rolled
// back, rejected apply, cancelled risk prompt) are *not* errors; they are
// terminal phases reported through `ApplyOutcome`. What remains here are
// the failures a caller cannot recover from inside a session.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Another apply or revert is already in progress")]
    SessionActive,

    #[error("Operation cancelled")]
    Cancelled,

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for failures a later retry could plausibly fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ucictl_api::Error> for CoreError {
    fn from(err: ucictl_api::Error) -> Self {
        match err {
            ucictl_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            ucictl_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_ms: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ucictl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ucictl_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            ucictl_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ucictl_api::Error::UnexpectedStatus {
                endpoint, status, ..
            } => CoreError::Api {
                message: format!("{endpoint} returned HTTP {status}"),
                status: Some(status),
            },
            ucictl_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
