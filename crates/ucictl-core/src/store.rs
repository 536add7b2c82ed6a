// ── Staged-change store ──
//
// Passive cache of the device's staged changeset. Refreshed on demand
// (startup, after apply or revert); every replacement is broadcast through
// a `watch` channel and mirrored to the status sink's indicator.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::CommitBackend;
use crate::error::CoreError;
use crate::model::Changeset;
use crate::surface::StatusSink;

pub struct ChangeStore {
    current: watch::Sender<Arc<Changeset>>,
    indicator: watch::Sender<usize>,
    sink: Arc<dyn StatusSink>,
}

impl ChangeStore {
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        let (current, _) = watch::channel(Arc::new(Changeset::default()));
        let (indicator, _) = watch::channel(0);
        Self {
            current,
            indicator,
            sink,
        }
    }

    /// Fetch the staged changeset and update the indicator.
    ///
    /// A failed fetch degrades to an empty changeset; it is never an error.
    pub async fn load<B: CommitBackend>(&self, backend: &B) -> Arc<Changeset> {
        let changeset = match backend.fetch_changes().await {
            Ok(cs) => cs,
            Err(e) => {
                warn!(error = %e, "failed to load staged changes; showing none");
                Changeset::default()
            }
        };
        self.publish(changeset)
    }

    /// Like [`load`](Self::load), but a failed fetch is returned and the
    /// store keeps its previous contents.
    pub async fn try_load<B: CommitBackend>(
        &self,
        backend: &B,
    ) -> Result<Arc<Changeset>, CoreError> {
        let changeset = backend.fetch_changes().await?;
        Ok(self.publish(changeset))
    }

    fn publish(&self, changeset: Changeset) -> Arc<Changeset> {
        let count = Self::count(&changeset);
        debug!(count, "staged changes loaded");

        let changeset = Arc::new(changeset);
        self.current.send_replace(Arc::clone(&changeset));
        self.set_indicator(count);
        changeset
    }

    /// Total number of records across all configuration files.
    pub fn count(changeset: &Changeset) -> usize {
        changeset.count()
    }

    /// Show a count-labelled indicator, or remove it when `count` is zero.
    pub fn set_indicator(&self, count: usize) {
        match NonZeroUsize::new(count) {
            Some(n) => self.sink.show_indicator(n),
            None => self.sink.hide_indicator(),
        }
        self.indicator.send_replace(count);
    }

    /// Forget the cached changeset after it left the staging area.
    pub fn clear(&self) {
        self.current.send_replace(Arc::new(Changeset::default()));
        self.set_indicator(0);
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn current(&self) -> Arc<Changeset> {
        Arc::clone(&self.current.borrow())
    }

    pub fn indicator_count(&self) -> usize {
        *self.indicator.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Changeset>> {
        self.current.subscribe()
    }
}

impl std::fmt::Debug for ChangeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeStore")
            .field("indicator", &*self.indicator.borrow())
            .finish_non_exhaustive()
    }
}
