//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ucictl_config::ConfigError;
use ucictl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const ROLLED_BACK: i32 = 9;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to device at {url}")]
    #[diagnostic(
        code(ucictl::connection_failed),
        help(
            "Check that the device is up and its web interface is reachable.\n\
             URL: {url}\n\
             Try: ucictl probe <host>"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{host} did not answer over {protocols}")]
    #[diagnostic(code(ucictl::unreachable))]
    Unreachable { host: String, protocols: String },

    #[error("Request timed out after {millis}ms")]
    #[diagnostic(
        code(ucictl::timeout),
        help("Increase timeout with --timeout or check the device's responsiveness.")
    )]
    Timeout { millis: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed")]
    #[diagnostic(
        code(ucictl::auth_failed),
        help(
            "The session id or token was rejected; sessions expire after inactivity.\n\
             Log in again and run: ucictl config set-secret"
        )
    )]
    AuthFailed,

    #[error("No {what} configured for profile '{profile}'")]
    #[diagnostic(
        code(ucictl::no_credentials),
        help(
            "Configure credentials with: ucictl config init\n\
             Or set UCICTL_SID and UCICTL_TOKEN."
        )
    )]
    NoCredentials { profile: String, what: String },

    // ── Commit sessions ──────────────────────────────────────────────

    #[error("Another apply or revert is already in progress")]
    #[diagnostic(code(ucictl::session_active))]
    SessionActive,

    #[error("{operation} failed: {reason}")]
    #[diagnostic(code(ucictl::commit_failed))]
    CommitFailed { operation: String, reason: String },

    #[error("Configuration changes were rolled back by the device")]
    #[diagnostic(
        code(ucictl::rolled_back),
        help(
            "The changes are still staged. Inspect them with: ucictl changes\n\
             Discard them with: ucictl revert\n\
             Or force them through with: ucictl apply --unchecked"
        )
    )]
    RolledBack,

    #[error("Interrupted")]
    #[diagnostic(code(ucictl::interrupted))]
    Interrupted,

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error: {message}")]
    #[diagnostic(code(ucictl::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ucictl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ucictl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: ucictl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(ucictl::no_config),
        help(
            "Create one with: ucictl config init\n\
             Or pass --controller with UCICTL_SID and UCICTL_TOKEN.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ucictl::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(ucictl::confirmation_required),
        help("Use --yes (-y) to skip prompts in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Unreachable { .. } => exit_code::CONNECTION,
            Self::AuthFailed | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::SessionActive => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::RolledBack => exit_code::ROLLED_BACK,
            Self::Interrupted => exit_code::INTERRUPTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile, what } => CliError::NoCredentials {
                profile,
                what: what.into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SessionActive => CliError::SessionActive,
            CoreError::Cancelled => CliError::Interrupted,
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed,
            CoreError::Timeout { timeout_ms } => CliError::Timeout { millis: timeout_ms },
            CoreError::Api { message, status } => CliError::ApiError { message, status },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::ApiError {
                message,
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_conflict_has_its_own_exit_code() {
        let err = CliError::from(CoreError::SessionActive);
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
    }

    #[test]
    fn missing_credentials_map_to_auth_exit_code() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "home".into(),
            what: "sid",
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(err.to_string().contains("sid"));
    }
}
