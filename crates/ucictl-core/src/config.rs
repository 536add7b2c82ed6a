// ── Runtime device configuration ──
//
// These types describe *how* to talk to one device and how long each step
// of a commit cycle may take. They never touch disk; the config crate
// builds a `DeviceConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use ucictl_api::{HttpProbe, SessionAuth, TlsMode, TransportConfig, UciClient};
use url::Url;

use crate::error::CoreError;

/// Smallest rollback window the device accepts.
pub const MIN_ROLLBACK_WINDOW: Duration = Duration::from_secs(90);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(value: &TlsVerification) -> Self {
        match value {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Timing of one apply cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitTimings {
    /// How long a checked apply may go unconfirmed before the device rolls back.
    pub rollback_window: Duration,
    /// Delay before the first confirm attempt.
    pub holdoff: Duration,
    /// Target spacing between confirm attempts.
    pub confirm_interval: Duration,
    /// Upper bound on a single confirm request.
    pub apply_timeout: Duration,
    /// How long a terminal message stays up before reload or dismissal.
    pub display_hold: Duration,
    /// Give up waiting for a rollback after this long. `None` waits forever.
    pub rollback_wait_limit: Option<Duration>,
}

impl Default for CommitTimings {
    fn default() -> Self {
        Self {
            rollback_window: MIN_ROLLBACK_WINDOW,
            holdoff: Duration::from_secs(4),
            confirm_interval: Duration::from_secs(1),
            apply_timeout: Duration::from_secs(5),
            display_hold: Duration::from_millis(1500),
            rollback_wait_limit: None,
        }
    }
}

/// Timing of the wait-for-device-to-return loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectTimings {
    /// Initial delay before the first probe round.
    pub grace: Duration,
    /// Spacing between probe rounds.
    pub interval: Duration,
    /// Upper bound on a single probe.
    pub probe_timeout: Duration,
}

impl Default for ReconnectTimings {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(1),
        }
    }
}

/// Everything the controller needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Host (with port, if any) the operator reached the device on.
    pub host: String,
    pub commit: CommitTimings,
    pub reconnect: ReconnectTimings,
}

impl ControllerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            commit: CommitTimings::default(),
            reconnect: ReconnectTimings::default(),
        }
    }
}

/// Connection settings for a single device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device URL (e.g. `https://192.168.1.1`).
    pub url: Url,
    /// Path prefix of the UCI endpoints.
    pub api_prefix: String,
    pub session: SessionAuth,
    pub tls: TlsVerification,
    /// Generic request timeout.
    pub timeout: Duration,
    pub commit: CommitTimings,
    pub reconnect: ReconnectTimings,
}

impl DeviceConfig {
    /// `host[:port]` of the device URL.
    pub fn host(&self) -> Result<String, CoreError> {
        let host = self.url.host_str().ok_or_else(|| CoreError::Config {
            message: format!("device URL '{}' has no host", self.url),
        })?;
        Ok(match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        })
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            cookie_jar: None,
        }
    }

    pub fn client(&self) -> Result<UciClient, CoreError> {
        Ok(UciClient::new(
            self.url.clone(),
            &self.api_prefix,
            self.session.clone(),
            &self.transport(),
        )?)
    }

    pub fn probe(&self) -> Result<HttpProbe, CoreError> {
        Ok(HttpProbe::new(&self.transport())?)
    }

    pub fn controller_config(&self) -> Result<ControllerConfig, CoreError> {
        Ok(ControllerConfig {
            host: self.host()?,
            commit: self.commit,
            reconnect: self.reconnect,
        })
    }
}
