// ── Confirm loop ──
//
// Repeats the confirm call at a fixed cadence until the device reports a
// terminal status or a deadline passes. Written as an explicit state loop
// so the deadline check and cadence normalization live in one place.
//
// Reused unchanged for rollback detection: no deadline, session auth, and
// "rollback finished" as the terminal status.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};
use ucictl_api::ConfirmAuth;

use crate::backend::CommitBackend;

/// Which statuses end the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// 200 or 204: the apply was confirmed.
    Confirmed,
    /// 204: the device finished rolling back.
    RollbackFinished,
}

impl Terminal {
    pub fn matches(self, status: u16) -> bool {
        match self {
            Self::Confirmed => matches!(status, 200 | 204),
            Self::RollbackFinished => status == 204,
        }
    }
}

/// Credential and terminal condition for one run of the loop.
#[derive(Debug, Clone)]
pub struct ConfirmTarget {
    pub auth: ConfirmAuth,
    pub terminal: Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed { attempts: u32 },
    DeadlineExceeded { attempts: u32 },
}

impl ConfirmOutcome {
    pub fn attempts(self) -> u32 {
        match self {
            Self::Confirmed { attempts } | Self::DeadlineExceeded { attempts } => attempts,
        }
    }
}

enum Step {
    Wait(Instant),
    Attempt,
    Done,
}

pub struct ConfirmLoop<'a, B> {
    backend: &'a B,
    cadence: Duration,
    timeout: Duration,
}

impl<'a, B: CommitBackend> ConfirmLoop<'a, B> {
    /// `cadence` spaces attempt starts; `timeout` bounds each call.
    pub fn new(backend: &'a B, cadence: Duration, timeout: Duration) -> Self {
        Self {
            backend,
            cadence,
            timeout,
        }
    }

    /// Run until `target.terminal` matches or `deadline` passes.
    ///
    /// The first attempt starts at `start_at`. Before each attempt
    /// `on_attempt(n, remaining)` is called with the attempt number and the
    /// time left until `deadline`. No attempt is ever issued at or after
    /// `deadline`; with no deadline the loop runs until terminal.
    pub async fn confirm_until(
        &self,
        target: &ConfirmTarget,
        start_at: Instant,
        deadline: Option<Instant>,
        mut on_attempt: impl FnMut(u32, Option<Duration>) + Send,
    ) -> ConfirmOutcome {
        let mut attempts = 0;
        let mut step = Step::Wait(start_at);

        loop {
            step = match step {
                Step::Wait(until) => {
                    sleep_until(until).await;
                    Step::Attempt
                }
                Step::Attempt => {
                    let started = Instant::now();
                    if deadline.is_some_and(|d| started >= d) {
                        debug!(attempts, "confirm deadline reached");
                        return ConfirmOutcome::DeadlineExceeded { attempts };
                    }

                    attempts += 1;
                    on_attempt(attempts, deadline.map(|d| d - started));

                    let call = self.backend.confirm(&target.auth, self.timeout);
                    match tokio::time::timeout(self.timeout, call).await {
                        Ok(Ok(status)) if target.terminal.matches(status) => {
                            debug!(attempts, status, "confirm loop finished");
                            Step::Done
                        }
                        Ok(Ok(status)) => {
                            trace!(attempts, status, "not yet terminal");
                            Step::Wait(started + self.cadence)
                        }
                        Ok(Err(e)) => {
                            trace!(attempts, error = %e, "confirm attempt failed");
                            Step::Wait(started + self.cadence)
                        }
                        Err(_) => {
                            trace!(attempts, "confirm attempt timed out");
                            Step::Wait(started + self.cadence)
                        }
                    }
                }
                Step::Done => return ConfirmOutcome::Confirmed { attempts },
            };
        }
    }
}
