use secrecy::{ExposeSecret, SecretString};
use strum::{Display, EnumString};

/// Session material for the device's web interface.
///
/// Both values travel as query parameters on every mutating request:
/// `sid` identifies the login session, `token` is the anti-CSRF token
/// bound to it.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub sid: SecretString,
    pub token: SecretString,
}

impl SessionAuth {
    pub fn new(sid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            sid: SecretString::from(sid.into()),
            token: SecretString::from(token.into()),
        }
    }

    pub(crate) fn query(&self) -> [(&'static str, &str); 2] {
        [
            ("sid", self.sid.expose_secret()),
            ("token", self.token.expose_secret()),
        ]
    }
}

/// Which apply endpoint to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ApplyMode {
    /// Device arms an automatic rollback unless the change is confirmed.
    Checked,
    /// Fire-and-forget; no confirmation and no safety rollback.
    Unchecked,
}

impl ApplyMode {
    /// Endpoint path relative to the API prefix.
    pub fn path(self) -> &'static str {
        match self {
            Self::Checked => "apply/rollback-checked",
            Self::Unchecked => "apply/unchecked",
        }
    }
}

/// Credential presented to the `confirm` endpoint.
#[derive(Debug, Clone)]
pub enum ConfirmAuth {
    /// Opaque token issued by a checked apply. Used while confirming.
    Credential(SecretString),
    /// Plain session auth. Used while waiting for a rollback to finish,
    /// after the issued credential has expired on the device.
    Session,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn apply_mode_paths() {
        assert_eq!(ApplyMode::Checked.path(), "apply/rollback-checked");
        assert_eq!(ApplyMode::Unchecked.path(), "apply/unchecked");
    }

    #[test]
    fn apply_mode_parses_kebab_case() {
        assert_eq!(ApplyMode::from_str("unchecked").ok(), Some(ApplyMode::Unchecked));
        assert_eq!(ApplyMode::Checked.to_string(), "checked");
    }
}
