// ── Presentation surfaces ──
//
// Everything the controllers show or ask goes through these traits. The
// front end supplies implementations; the core never renders anything.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use strum::{Display, EnumIter};
use ucictl_api::Protocol;
use url::Url;

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Notice,
    /// Long-running step; the message carries a countdown.
    Progress,
    Warning,
    Error,
}

/// A user-actionable choice offered after a rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryAction {
    #[strum(to_string = "Dismiss")]
    Dismiss,
    #[strum(to_string = "Revert changes")]
    RevertChanges,
    #[strum(to_string = "Apply unchecked")]
    ApplyUnchecked,
}

impl RecoveryAction {
    pub const ALL: [Self; 3] = [Self::Dismiss, Self::RevertChanges, Self::ApplyUnchecked];
}

/// Content for the single shared status display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<RecoveryAction>,
}

impl Status {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = RecoveryAction>) -> Self {
        self.actions = actions.into_iter().collect();
        self
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The status display plus the staged-change indicator.
///
/// `show` replaces whatever is currently shown.
pub trait StatusSink: Send + Sync {
    fn show(&self, status: Status);
    fn clear(&self);
    fn show_indicator(&self, count: NonZeroUsize);
    fn hide_indicator(&self);
}

/// Reload or leave the current view.
pub trait Navigator: Send + Sync {
    fn reload(&self);
    fn navigate(&self, url: &Url);
}

/// Answer to a connectivity-risk warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum RiskChoice {
    #[strum(to_string = "Cancel")]
    Cancel,
    #[strum(to_string = "Apply with rollback")]
    ApplyChecked,
    #[strum(to_string = "Apply unchecked")]
    ApplyUnchecked,
}

/// What the pre-apply check found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    /// Inbound interfaces with staged connectivity edits.
    pub interfaces: Vec<String>,
    /// Protocols on which the device currently answers.
    pub reachable_via: Vec<Protocol>,
}

pub trait RiskPrompt: Send + Sync {
    fn choose(&self, assessment: &RiskAssessment) -> RiskChoice;
}

/// Bundle of front-end collaborators handed to the controller.
#[derive(Clone)]
pub struct Surfaces {
    pub status: Arc<dyn StatusSink>,
    pub navigator: Arc<dyn Navigator>,
    pub risk_prompt: Arc<dyn RiskPrompt>,
}

impl fmt::Debug for Surfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surfaces").finish_non_exhaustive()
    }
}
