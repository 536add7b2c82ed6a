//! CLI configuration: a thin wrapper around `ucictl_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--controller, --sid, --token, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use ucictl_config::{Config, Defaults, Profile};
use ucictl_core::{DEFAULT_API_PREFIX, DeviceConfig, SessionAuth, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A device config together with the profile fields the core doesn't carry.
pub struct Resolved {
    pub profile_name: String,
    pub device: DeviceConfig,
    pub reconnect_hosts: Vec<String>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Build the device config from the config file, profile, and CLI overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = ucictl_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let device = resolve_profile(profile, &profile_name, &cfg.defaults, global)?;
        return Ok(Resolved {
            profile_name,
            device,
            reconnect_hosts: profile.reconnect_hosts.clone(),
        });
    }

    // An explicitly named profile must exist.
    if global.profile.is_some() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    // No profile -- build from CLI flags / env vars alone
    let url_str = global.controller.as_deref().ok_or_else(|| CliError::NoConfig {
        path: ucictl_config::config_path().display().to_string(),
    })?;
    let profile = Profile {
        controller: url_str.to_owned(),
        ..Profile::default()
    };
    let device = resolve_profile(&profile, &profile_name, &cfg.defaults, global)?;
    Ok(Resolved {
        profile_name,
        device,
        reconnect_hosts: Vec::new(),
    })
}

/// Translate a `Profile` + global flags into a `DeviceConfig`.
///
/// CLI flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<DeviceConfig, CliError> {
    // 1. Device URL (flag > env > profile)
    let url_str = global.controller.as_deref().unwrap_or(&profile.controller);
    let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "controller".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    // 2. Session (both flags > profile chain)
    let session = match (&global.sid, &global.token) {
        (Some(sid), Some(token)) => SessionAuth {
            sid: SecretString::from(sid.clone()),
            token: SecretString::from(token.clone()),
        },
        _ => ucictl_config::resolve_session(profile, profile_name)?,
    };

    // 3. TLS verification
    let tls = if global.insecure || profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    // 4. Timeout (flag > profile > defaults)
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(defaults.timeout);

    Ok(DeviceConfig {
        url,
        api_prefix: profile
            .api_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_API_PREFIX.into()),
        session,
        tls,
        timeout: Duration::from_secs(timeout),
        commit: ucictl_config::commit_timings(&profile.timings, &defaults.timings)?,
        reconnect: ucictl_config::reconnect_timings(&profile.timings, &defaults.timings)?,
    })
}
