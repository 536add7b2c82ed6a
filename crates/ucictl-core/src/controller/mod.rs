// ── Controller ──
//
// Owns the change store, the device seams and the front-end surfaces, and
// runs at most one apply or revert session at a time. The apply state
// machine lives in `apply`, the revert path in `revert`.

mod apply;
mod revert;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, MutexGuard, broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::backend::{CommitBackend, Probe};
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::event::CommitEvent;
use crate::model::Changeset;
use crate::reconnect::ReconnectWaiter;
use crate::store::ChangeStore;
use crate::surface::{Status, Surfaces};

pub use apply::{ApplyOutcome, FailureReason};
pub use revert::RevertOutcome;

const EVENT_CHANNEL_SIZE: usize = 16;

// ── ApplyPhase ───────────────────────────────────────────────────

/// Where the current (or last) session is, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApplyPhase {
    Idle,
    RiskCheck,
    Requesting,
    Confirming,
    Applied,
    RollingBack,
    RolledBack,
    Failed,
    Reverting,
    Reverted,
}

impl ApplyPhase {
    /// Phases a session ends in.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Applied | Self::RolledBack | Self::Failed | Self::Reverted
        )
    }
}

// ── Controller ───────────────────────────────────────────────────

/// Entry point for the front end.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Every session method
/// returns once the session reached a terminal phase.
pub struct Controller<B, P> {
    inner: Arc<ControllerInner<B, P>>,
}

struct ControllerInner<B, P> {
    backend: B,
    probe: P,
    config: ControllerConfig,
    store: ChangeStore,
    surfaces: Surfaces,
    phase: watch::Sender<ApplyPhase>,
    event_tx: broadcast::Sender<CommitEvent>,
    session_slot: Mutex<()>,
}

impl<B, P> Clone for Controller<B, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, P> fmt::Debug for Controller<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("config", &self.inner.config)
            .field("phase", &*self.inner.phase.borrow())
            .finish_non_exhaustive()
    }
}

impl<B: CommitBackend, P: Probe> Controller<B, P> {
    pub fn new(backend: B, probe: P, config: ControllerConfig, surfaces: Surfaces) -> Self {
        let store = ChangeStore::new(Arc::clone(&surfaces.status));
        let (phase, _) = watch::channel(ApplyPhase::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(ControllerInner {
                backend,
                probe,
                config,
                store,
                surfaces,
                phase,
                event_tx,
                session_slot: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &ChangeStore {
        &self.inner.store
    }

    // ── Change store passthrough ─────────────────────────────────

    /// Refresh the staged changeset from the device.
    pub async fn load(&self) -> Arc<Changeset> {
        self.inner.store.load(&self.inner.backend).await
    }

    /// Refresh the staged changeset, reporting a failed fetch.
    pub async fn try_load(&self) -> Result<Arc<Changeset>, CoreError> {
        self.inner.store.try_load(&self.inner.backend).await
    }

    pub fn changeset(&self) -> Arc<Changeset> {
        self.inner.store.current()
    }

    pub fn indicator_count(&self) -> usize {
        self.inner.store.indicator_count()
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn phase(&self) -> ApplyPhase {
        *self.inner.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<ApplyPhase> {
        self.inner.phase.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CommitEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Tear down a terminal status display and return to `Idle`.
    ///
    /// Does nothing while a session is running.
    pub fn dismiss(&self) {
        let Ok(_slot) = self.inner.session_slot.try_lock() else {
            debug!("dismiss ignored: session in progress");
            return;
        };
        if self.phase().is_terminal() {
            self.inner.surfaces.status.clear();
            self.set_phase(ApplyPhase::Idle);
        }
    }

    // ── Reconnect ────────────────────────────────────────────────

    /// Wait for the device to answer on any of `hosts`, then navigate there.
    pub async fn await_reconnect(
        &self,
        hosts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Url, CoreError> {
        let inner = &*self.inner;
        ReconnectWaiter::new(
            &inner.probe,
            inner.surfaces.navigator.as_ref(),
            inner.config.reconnect,
            &inner.config.host,
        )
        .await_reconnect(hosts, cancel)
        .await
    }

    // ── Session plumbing ─────────────────────────────────────────

    fn begin_session(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.inner
            .session_slot
            .try_lock()
            .map_err(|_| CoreError::SessionActive)
    }

    fn set_phase(&self, phase: ApplyPhase) {
        let previous = self.inner.phase.send_replace(phase);
        if previous != phase {
            info!(from = %previous, to = %phase, "phase transition");
        }
    }

    fn show(&self, status: Status) {
        self.inner.surfaces.status.show(status);
    }

    async fn hold(&self) {
        tokio::time::sleep(self.inner.config.commit.display_hold).await;
    }

    /// Show `status` for the display hold, then take it down.
    async fn flash(&self, status: Status) {
        self.show(status);
        self.hold().await;
        self.inner.surfaces.status.clear();
    }

    /// Common tail of a successful apply or revert.
    async fn finish_committed(&self, event: CommitEvent, status: Status) {
        // No subscribers is fine.
        let _ = self.inner.event_tx.send(event);
        self.inner.store.clear();
        self.flash(status).await;
        self.inner.surfaces.navigator.reload();
        self.load().await;
    }
}
