// ── Revert ──
//
// Single request, no retry, no deadline.

use serde::Serialize;
use tracing::{info, warn};

use super::{ApplyPhase, Controller, FailureReason};
use crate::backend::{CommitBackend, Probe};
use crate::error::CoreError;
use crate::event::CommitEvent;
use crate::surface::{Status, StatusKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevertOutcome {
    Reverted,
    Failed { reason: FailureReason },
}

impl<B: CommitBackend, P: Probe> Controller<B, P> {
    /// Discard all staged changes.
    ///
    /// Reverting an empty changeset succeeds. Returns
    /// `CoreError::SessionActive` while an apply or revert is running.
    pub async fn revert(&self) -> Result<RevertOutcome, CoreError> {
        let _slot = self.begin_session()?;
        self.set_phase(ApplyPhase::Reverting);
        self.show(Status::new(StatusKind::Progress, "Reverting configuration…"));

        let reason = match self.inner.backend.revert().await {
            Ok(200) => {
                info!("staged changes reverted");
                self.set_phase(ApplyPhase::Reverted);
                self.finish_committed(
                    CommitEvent::reverted(),
                    Status::new(StatusKind::Notice, "Changes have been reverted."),
                )
                .await;
                return Ok(RevertOutcome::Reverted);
            }
            Ok(status) => FailureReason::Rejected { status },
            Err(e) => FailureReason::Transport {
                message: e.to_string(),
            },
        };

        warn!(%reason, "revert failed");
        self.set_phase(ApplyPhase::Failed);
        let message = match &reason {
            FailureReason::Rejected { status } => {
                format!("Revert request failed with status {status}")
            }
            other => format!("Revert request failed: {other}"),
        };
        self.flash(Status::new(StatusKind::Warning, message)).await;
        Ok(RevertOutcome::Failed { reason })
    }
}
