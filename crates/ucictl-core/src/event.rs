// ── Domain events ──

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Broadcast when staged changes leave the staging area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CommitEvent {
    /// Changes were committed (confirmed, unchecked, or nothing to apply).
    Applied { changes: usize, at: DateTime<Utc> },
    /// Staged changes were discarded.
    Reverted { at: DateTime<Utc> },
}

impl CommitEvent {
    pub fn applied(changes: usize) -> Self {
        Self::Applied {
            changes,
            at: Utc::now(),
        }
    }

    pub fn reverted() -> Self {
        Self::Reverted { at: Utc::now() }
    }
}
