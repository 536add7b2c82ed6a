//! Configuration for ucictl.
//!
//! TOML profiles, session credential resolution (env + keyring +
//! plaintext), commit timing overrides, and translation to
//! `ucictl_core::DeviceConfig`. The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use ucictl_core::{
    CommitTimings, DEFAULT_API_PREFIX, DeviceConfig, MIN_ROLLBACK_WINDOW, ReconnectTimings,
    SessionAuth, TlsVerification,
};

/// Keyring service name for stored session credentials.
pub const KEYRING_SERVICE: &str = "ucictl";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured for profile '{profile}'")]
    NoCredentials { profile: String, what: &'static str },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    /// Look up a profile by name (or the default profile).
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name.unwrap_or_else(|| self.default_profile_name());
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Generic request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default, skip_serializing_if = "Timings::is_empty")]
    pub timings: Timings,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            timings: Timings::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Commit and reconnect timing overrides, as humantime strings
/// (`"90s"`, `"1500ms"`, `"2m"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Timings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_window: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holdoff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_hold: Option<String>,
    /// Give up waiting for a rollback after this long. Unset waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_wait_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_grace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_timeout: Option<String>,
}

impl Timings {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A named device profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Device base URL (e.g., "https://192.168.1.1").
    pub controller: String,

    /// Path prefix of the UCI endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_prefix: Option<String>,

    /// Session id (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Environment variable name containing the session id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid_env: Option<String>,

    /// Anti-CSRF token (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the anti-CSRF token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Hosts to try when waiting for the device to come back.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reconnect_hosts: Vec<String>,

    #[serde(default, skip_serializing_if = "Timings::is_empty")]
    pub timings: Timings,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "ucictl", "ucictl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ucictl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + `UCICTL_*` environment variables.
///
/// Nested keys use a double underscore: `UCICTL_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("UCICTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Keyring account for one secret of one profile.
pub fn keyring_account(profile_name: &str, secret: &str) -> String {
    format!("{profile_name}/{secret}")
}

/// Store a secret in the system keyring.
pub fn store_secret(profile_name: &str, secret: &str, value: &SecretString) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name, secret))
        .and_then(|entry| entry.set_password(value.expose_secret()))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

fn resolve_secret(
    env_name: Option<&str>,
    profile_name: &str,
    secret: &'static str,
    plaintext: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's *_env → env var lookup
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name, secret)) {
        if let Ok(value) = entry.get_password() {
            return Ok(SecretString::from(value));
        }
    }

    // 3. Plaintext in config
    if let Some(value) = plaintext {
        return Ok(SecretString::from(value.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        what: secret,
    })
}

/// Resolve the session id and anti-CSRF token for a profile.
pub fn resolve_session(profile: &Profile, profile_name: &str) -> Result<SessionAuth, ConfigError> {
    let sid = resolve_secret(
        profile.sid_env.as_deref(),
        profile_name,
        "sid",
        profile.sid.as_deref(),
    )?;
    let token = resolve_secret(
        profile.token_env.as_deref(),
        profile_name,
        "token",
        profile.token.as_deref(),
    )?;
    Ok(SessionAuth { sid, token })
}

// ── Timings ─────────────────────────────────────────────────────────

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{value}': {e}"),
    })
}

/// Profile value, then defaults value, then `fallback`.
fn pick(
    field: &str,
    profile: Option<&String>,
    defaults: Option<&String>,
    fallback: Duration,
) -> Result<Duration, ConfigError> {
    profile
        .or(defaults)
        .map_or(Ok(fallback), |v| parse_duration(field, v))
}

/// Resolve commit timings. A rollback window below the device minimum is
/// raised to it.
/// Like [`pick`], for durations that pace a loop and must not be zero.
fn pick_nonzero(
    field: &str,
    profile: Option<&String>,
    defaults: Option<&String>,
    fallback: Duration,
) -> Result<Duration, ConfigError> {
    let value = pick(field, profile, defaults, fallback)?;
    if value.is_zero() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}

pub fn commit_timings(profile: &Timings, defaults: &Timings) -> Result<CommitTimings, ConfigError> {
    let base = CommitTimings::default();

    let mut rollback_window = pick(
        "rollback_window",
        profile.rollback_window.as_ref(),
        defaults.rollback_window.as_ref(),
        base.rollback_window,
    )?;
    if rollback_window < MIN_ROLLBACK_WINDOW {
        warn!(
            requested = ?rollback_window,
            minimum = ?MIN_ROLLBACK_WINDOW,
            "rollback window too short; using the minimum"
        );
        rollback_window = MIN_ROLLBACK_WINDOW;
    }

    let rollback_wait_limit = profile
        .rollback_wait_limit
        .as_ref()
        .or(defaults.rollback_wait_limit.as_ref())
        .map(|v| parse_duration("rollback_wait_limit", v))
        .transpose()?;

    Ok(CommitTimings {
        rollback_window,
        holdoff: pick(
            "holdoff",
            profile.holdoff.as_ref(),
            defaults.holdoff.as_ref(),
            base.holdoff,
        )?,
        confirm_interval: pick_nonzero(
            "confirm_interval",
            profile.confirm_interval.as_ref(),
            defaults.confirm_interval.as_ref(),
            base.confirm_interval,
        )?,
        apply_timeout: pick_nonzero(
            "apply_timeout",
            profile.apply_timeout.as_ref(),
            defaults.apply_timeout.as_ref(),
            base.apply_timeout,
        )?,
        display_hold: pick(
            "display_hold",
            profile.display_hold.as_ref(),
            defaults.display_hold.as_ref(),
            base.display_hold,
        )?,
        rollback_wait_limit,
    })
}

pub fn reconnect_timings(
    profile: &Timings,
    defaults: &Timings,
) -> Result<ReconnectTimings, ConfigError> {
    let base = ReconnectTimings::default();
    Ok(ReconnectTimings {
        grace: pick(
            "reconnect_grace",
            profile.reconnect_grace.as_ref(),
            defaults.reconnect_grace.as_ref(),
            base.grace,
        )?,
        interval: pick_nonzero(
            "reconnect_interval",
            profile.reconnect_interval.as_ref(),
            defaults.reconnect_interval.as_ref(),
            base.interval,
        )?,
        probe_timeout: pick_nonzero(
            "probe_timeout",
            profile.probe_timeout.as_ref(),
            defaults.probe_timeout.as_ref(),
            base.probe_timeout,
        )?,
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DeviceConfig` from a profile, without CLI flag overrides.
pub fn profile_to_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    let url: url::Url = profile
        .controller
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "controller".into(),
            reason: format!("invalid URL: {}", profile.controller),
        })?;

    let session = resolve_session(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(DeviceConfig {
        url,
        api_prefix: profile
            .api_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_API_PREFIX.into()),
        session,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        commit: commit_timings(&profile.timings, &defaults.timings)?,
        reconnect: reconnect_timings(&profile.timings, &defaults.timings)?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn timings(rollback: Option<&str>, hold: Option<&str>) -> Timings {
        Timings {
            rollback_window: rollback.map(str::to_owned),
            display_hold: hold.map(str::to_owned),
            ..Timings::default()
        }
    }

    #[test]
    fn commit_timings_fall_back_to_builtins() {
        let t = commit_timings(&Timings::default(), &Timings::default()).expect("defaults");
        assert_eq!(t, CommitTimings::default());
    }

    #[test]
    fn profile_overrides_defaults() {
        let t = commit_timings(
            &timings(Some("120s"), None),
            &timings(Some("100s"), Some("3s")),
        )
        .expect("valid");
        assert_eq!(t.rollback_window, Duration::from_secs(120));
        assert_eq!(t.display_hold, Duration::from_secs(3));
    }

    #[test]
    fn short_rollback_window_is_raised_to_minimum() {
        let t = commit_timings(&timings(Some("30s"), None), &Timings::default()).expect("valid");
        assert_eq!(t.rollback_window, MIN_ROLLBACK_WINDOW);
    }

    #[test]
    fn bad_duration_names_the_field() {
        let err = commit_timings(&Timings::default(), &timings(None, Some("soon")))
            .expect_err("invalid duration");
        assert!(err.to_string().contains("display_hold"), "{err}");
    }

    #[test]
    fn zero_pacing_durations_are_rejected() {
        for field in ["confirm_interval", "apply_timeout"] {
            let mut profile = Timings::default();
            match field {
                "confirm_interval" => profile.confirm_interval = Some("0s".into()),
                _ => profile.apply_timeout = Some("0s".into()),
            }
            let err = commit_timings(&profile, &Timings::default()).expect_err("zero duration");
            assert!(err.to_string().contains(field), "{err}");
        }

        let profile = Timings {
            reconnect_interval: Some("0s".into()),
            ..Timings::default()
        };
        let err = reconnect_timings(&profile, &Timings::default()).expect_err("zero interval");
        assert!(err.to_string().contains("reconnect_interval"), "{err}");
    }

    #[test]
    fn zero_holdoff_is_allowed() {
        let profile = Timings {
            holdoff: Some("0s".into()),
            ..Timings::default()
        };
        let t = commit_timings(&profile, &Timings::default()).expect("valid");
        assert_eq!(t.holdoff, Duration::ZERO);
    }

    #[test]
    fn wait_limit_is_optional() {
        let mut profile = Timings::default();
        assert!(
            commit_timings(&profile, &Timings::default())
                .expect("valid")
                .rollback_wait_limit
                .is_none()
        );
        profile.rollback_wait_limit = Some("10m".into());
        assert_eq!(
            commit_timings(&profile, &Timings::default())
                .expect("valid")
                .rollback_wait_limit,
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn loads_profile_with_timings_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "home"

[defaults.timings]
display_hold = "3s"

[profiles.home]
controller = "https://192.0.2.1"
sid = "abc"
token = "def"
reconnect_hosts = ["192.0.2.1", "10.0.0.1"]

[profiles.home.timings]
rollback_window = "2m"
"#,
        )
        .expect("write");

        let cfg = load_config_from(&path).expect("load");
        let (name, profile) = cfg.profile(None).expect("default profile");
        assert_eq!(name, "home");
        assert_eq!(profile.reconnect_hosts, vec!["192.0.2.1", "10.0.0.1"]);

        let device = profile_to_device_config(profile, "ucictl-test-home", &cfg.defaults)
            .expect("device config");
        assert_eq!(device.api_prefix, DEFAULT_API_PREFIX);
        assert_eq!(device.commit.rollback_window, Duration::from_secs(120));
        assert_eq!(device.commit.display_hold, Duration::from_secs(3));
        assert_eq!(device.timeout, Duration::from_secs(30));
        assert_eq!(device.session.sid.expose_secret(), "abc");
    }

    #[test]
    fn saved_config_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                controller: "http://router.lan".into(),
                sid_env: Some("ROUTER_SID".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).expect("save");

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(!text.contains("timings"), "empty timings are omitted:\n{text}");

        let loaded = load_config_from(&path).expect("load");
        let (_, profile) = loaded.profile(Some("default")).expect("profile");
        assert_eq!(profile.controller, "http://router.lan");
        assert_eq!(profile.sid_env.as_deref(), Some("ROUTER_SID"));
    }

    #[test]
    fn missing_session_is_reported() {
        let profile = Profile {
            controller: "https://192.0.2.1".into(),
            token: Some("def".into()),
            ..Profile::default()
        };
        let err = resolve_session(&profile, "ucictl-test-nosid").expect_err("no sid");
        assert!(matches!(err, ConfigError::NoCredentials { what: "sid", .. }));
    }

    #[test]
    fn invalid_controller_url_is_rejected() {
        let profile = Profile {
            controller: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_device_config(&profile, "x", &Defaults::default())
            .expect_err("bad url");
        assert!(err.to_string().contains("controller"), "{err}");
    }

    #[test]
    fn missing_profile_is_reported() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.profile(None),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }
}
