// ── Apply state machine ──
//
// Idle → RiskCheck → Requesting → Confirming → {Applied, RollingBack, Failed}
// RollingBack → {RolledBack, Failed}

use std::fmt;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use ucictl_api::{ApplyMode, ConfirmAuth, Protocol};

use super::{ApplyPhase, Controller};
use crate::backend::{CommitBackend, Probe};
use crate::confirm::{ConfirmLoop, ConfirmOutcome, ConfirmTarget, Terminal};
use crate::error::CoreError;
use crate::event::CommitEvent;
use crate::surface::{RecoveryAction, RiskAssessment, RiskChoice, Status, StatusKind};

/// How an apply session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Changes are live. `changes` is zero when there was nothing to apply.
    Applied { changes: usize },
    /// The device rolled the changes back; the caller picks what next.
    RolledBack { actions: Vec<RecoveryAction> },
    Failed { reason: FailureReason },
}

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The operator declined at the risk prompt.
    Cancelled,
    /// The device answered the request with an unexpected status.
    Rejected { status: u16 },
    /// The request never got an answer.
    Transport { message: String },
    /// The device never reported rollback completion within the wait limit.
    RollbackUnconfirmed,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::Rejected { status } => write!(f, "rejected with status {status}"),
            Self::Transport { message } => write!(f, "transport error: {message}"),
            Self::RollbackUnconfirmed => f.write_str("rollback not confirmed"),
        }
    }
}

/// State of one apply attempt. Lives only inside `Controller::apply`.
struct ApplySession {
    mode: ApplyMode,
    confirm_credential: Option<ConfirmAuth>,
    deadline: Option<Instant>,
    phase: ApplyPhase,
}

impl ApplySession {
    fn new(mode: ApplyMode) -> Self {
        Self {
            mode,
            confirm_credential: None,
            deadline: None,
            phase: ApplyPhase::Idle,
        }
    }
}

impl<B: CommitBackend, P: Probe> Controller<B, P> {
    /// Apply all staged changes.
    ///
    /// Returns `CoreError::SessionActive` if another apply or revert is
    /// running; that session is not affected. Everything else, including a
    /// rejected request or a rollback, is reported as an [`ApplyOutcome`].
    pub async fn apply(&self, mode: ApplyMode) -> Result<ApplyOutcome, CoreError> {
        let _slot = self.begin_session()?;
        let mut session = ApplySession::new(mode);
        let changes = self.inner.store.current().count();
        info!(%mode, changes, "apply requested");

        if mode == ApplyMode::Checked {
            self.advance(&mut session, ApplyPhase::RiskCheck);
            if let Some(assessment) = self.assess_risk().await {
                warn!(interfaces = ?assessment.interfaces, "staged changes touch the inbound connection");
                match self.inner.surfaces.risk_prompt.choose(&assessment) {
                    RiskChoice::Cancel => {
                        return Ok(self.fail(&mut session, FailureReason::Cancelled).await);
                    }
                    RiskChoice::ApplyChecked => {}
                    RiskChoice::ApplyUnchecked => session.mode = ApplyMode::Unchecked,
                }
            }
        }

        self.advance(&mut session, ApplyPhase::Requesting);
        self.show(Status::new(
            StatusKind::Progress,
            "Starting configuration apply…",
        ));

        let reply = match self.inner.backend.apply(session.mode).await {
            Ok(reply) => reply,
            Err(e) => {
                return Ok(self
                    .fail(
                        &mut session,
                        FailureReason::Transport {
                            message: e.to_string(),
                        },
                    )
                    .await);
            }
        };
        debug!(status = reply.status, mode = %session.mode, "apply reply");

        match (session.mode, reply.status) {
            (ApplyMode::Unchecked, 204) => Ok(self
                .applied(&mut session, changes, "Configuration changes applied.")
                .await),
            (ApplyMode::Checked, 204) => Ok(self
                .applied(&mut session, 0, "There are no changes to apply.")
                .await),
            (ApplyMode::Checked, 200) => {
                session.confirm_credential = Some(match reply.token {
                    Some(token) => ConfirmAuth::Credential(token.into()),
                    None => {
                        warn!("apply reply carried no token; confirming with session auth");
                        ConfirmAuth::Session
                    }
                });
                session.deadline = Some(Instant::now() + self.inner.config.commit.rollback_window);
                Ok(self.confirm(&mut session, changes).await)
            }
            (_, status) => Ok(self
                .fail(&mut session, FailureReason::Rejected { status })
                .await),
        }
    }

    // ── RiskCheck ────────────────────────────────────────────────

    /// Which inbound interfaces the staged changes could cut off.
    ///
    /// Fails open: if the interfaces cannot be fetched, there is no risk.
    async fn assess_risk(&self) -> Option<RiskAssessment> {
        let interfaces = match self.inner.backend.inbound_interfaces().await {
            Ok(interfaces) => interfaces,
            Err(e) => {
                warn!(error = %e, "inbound interfaces unavailable; skipping risk check");
                return None;
            }
        };

        let at_risk = self.inner.store.current().interfaces_at_risk(&interfaces);
        if at_risk.is_empty() {
            return None;
        }

        let host = self.inner.config.host.as_str();
        let timeout = self.inner.config.reconnect.probe_timeout;
        let probes = Protocol::ALL.into_iter().map(|protocol| async move {
            (protocol, self.inner.probe.probe(protocol, host, timeout).await)
        });
        let reachable_via = join_all(probes)
            .await
            .into_iter()
            .filter_map(|(protocol, reachable)| reachable.then_some(protocol))
            .collect();

        Some(RiskAssessment {
            interfaces: at_risk,
            reachable_via,
        })
    }

    // ── Confirming ───────────────────────────────────────────────

    async fn confirm(&self, session: &mut ApplySession, changes: usize) -> ApplyOutcome {
        let timings = self.inner.config.commit;
        let deadline = session.deadline;
        let target = ConfirmTarget {
            auth: session
                .confirm_credential
                .clone()
                .unwrap_or(ConfirmAuth::Session),
            terminal: Terminal::Confirmed,
        };

        self.advance(session, ApplyPhase::Confirming);
        self.show(countdown(timings.rollback_window));

        let sink = &self.inner.surfaces.status;
        let outcome = ConfirmLoop::new(
            &self.inner.backend,
            timings.confirm_interval,
            timings.apply_timeout,
        )
        .confirm_until(
            &target,
            Instant::now() + timings.holdoff,
            deadline,
            |_, remaining| {
                if let Some(remaining) = remaining {
                    sink.show(countdown(remaining));
                }
            },
        )
        .await;

        match outcome {
            ConfirmOutcome::Confirmed { attempts } => {
                info!(attempts, "apply confirmed");
                self.applied(session, changes, "Configuration changes applied.")
                    .await
            }
            ConfirmOutcome::DeadlineExceeded { attempts } => {
                warn!(attempts, "apply not confirmed before the deadline");
                self.await_rollback(session).await
            }
        }
    }

    // ── RollingBack ──────────────────────────────────────────────

    async fn await_rollback(&self, session: &mut ApplySession) -> ApplyOutcome {
        let timings = self.inner.config.commit;
        self.advance(session, ApplyPhase::RollingBack);
        self.show(Status::new(
            StatusKind::Warning,
            format!(
                "Failed to confirm apply within {}s, waiting for rollback…",
                timings.rollback_window.as_secs()
            ),
        ));

        let target = ConfirmTarget {
            auth: ConfirmAuth::Session,
            terminal: Terminal::RollbackFinished,
        };
        let now = Instant::now();
        let outcome = ConfirmLoop::new(
            &self.inner.backend,
            timings.confirm_interval,
            timings.apply_timeout,
        )
        .confirm_until(
            &target,
            now,
            timings.rollback_wait_limit.map(|limit| now + limit),
            |_, _| {},
        )
        .await;

        match outcome {
            ConfirmOutcome::Confirmed { attempts } => {
                info!(attempts, "device rolled back");
                self.advance(session, ApplyPhase::RolledBack);
                let actions = RecoveryAction::ALL.to_vec();
                self.show(
                    Status::new(
                        StatusKind::Warning,
                        "Configuration changes have been rolled back!",
                    )
                    .with_actions(actions.iter().copied()),
                );
                ApplyOutcome::RolledBack { actions }
            }
            ConfirmOutcome::DeadlineExceeded { attempts } => {
                warn!(attempts, "gave up waiting for rollback");
                self.fail(session, FailureReason::RollbackUnconfirmed).await
            }
        }
    }

    // ── Terminal phases ──────────────────────────────────────────

    async fn applied(&self, session: &mut ApplySession, changes: usize, message: &str) -> ApplyOutcome {
        self.advance(session, ApplyPhase::Applied);
        self.finish_committed(
            CommitEvent::applied(changes),
            Status::new(StatusKind::Notice, message),
        )
        .await;
        ApplyOutcome::Applied { changes }
    }

    async fn fail(&self, session: &mut ApplySession, reason: FailureReason) -> ApplyOutcome {
        warn!(%reason, "apply failed");
        self.advance(session, ApplyPhase::Failed);
        let status = match &reason {
            FailureReason::Rejected { status } => Status::new(
                StatusKind::Warning,
                format!("Apply request failed with status {status}"),
            ),
            FailureReason::Transport { message } => Status::new(
                StatusKind::Warning,
                format!("Apply request failed: {message}"),
            ),
            FailureReason::RollbackUnconfirmed => Status::new(
                StatusKind::Error,
                "Device unreachable! It did not report finishing the rollback.",
            ),
            FailureReason::Cancelled => Status::new(StatusKind::Notice, "Apply cancelled"),
        };
        self.flash(status).await;
        ApplyOutcome::Failed { reason }
    }

    fn advance(&self, session: &mut ApplySession, phase: ApplyPhase) {
        debug!(mode = %session.mode, from = %session.phase, to = %phase, "apply session");
        session.phase = phase;
        self.set_phase(phase);
    }
}

fn countdown(remaining: Duration) -> Status {
    Status::new(
        StatusKind::Progress,
        format!(
            "Applying configuration changes… {}s",
            remaining.as_secs_f64().ceil()
        ),
    )
}
