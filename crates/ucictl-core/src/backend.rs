// ── Device seams ──
//
// The controller talks to the device through these two traits so it can be
// driven by the real HTTP client or by an in-memory fake under paused time.

use std::future::Future;
use std::time::Duration;

use ucictl_api::{ApplyMode, ApplyReply, ConfirmAuth, HttpProbe, Protocol, UciClient};

use crate::error::CoreError;
use crate::model::Changeset;

/// Commit endpoints of one device.
pub trait CommitBackend: Send + Sync + 'static {
    /// Fetch and parse the staged changeset.
    fn fetch_changes(&self) -> impl Future<Output = Result<Changeset, CoreError>> + Send;

    /// Interfaces carrying the current inbound connection.
    fn inbound_interfaces(&self) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;

    /// Issue an apply request. Non-success statuses are returned as data.
    fn apply(&self, mode: ApplyMode) -> impl Future<Output = Result<ApplyReply, CoreError>> + Send;

    /// One confirm call bounded by `timeout`. Returns the HTTP status.
    fn confirm(
        &self,
        auth: &ConfirmAuth,
        timeout: Duration,
    ) -> impl Future<Output = Result<u16, CoreError>> + Send;

    /// Discard staged changes. Returns the HTTP status.
    fn revert(&self) -> impl Future<Output = Result<u16, CoreError>> + Send;
}

/// Side-effect-free liveness check for a `(protocol, host)` pair.
pub trait Probe: Send + Sync + 'static {
    fn probe(
        &self,
        protocol: Protocol,
        host: &str,
        timeout: Duration,
    ) -> impl Future<Output = bool> + Send;
}

impl CommitBackend for UciClient {
    async fn fetch_changes(&self) -> Result<Changeset, CoreError> {
        let raw = UciClient::fetch_changes(self).await?;
        Ok(Changeset::from(raw))
    }

    async fn inbound_interfaces(&self) -> Result<Vec<String>, CoreError> {
        Ok(UciClient::inbound_interfaces(self).await?)
    }

    async fn apply(&self, mode: ApplyMode) -> Result<ApplyReply, CoreError> {
        Ok(UciClient::apply(self, mode).await?)
    }

    async fn confirm(&self, auth: &ConfirmAuth, timeout: Duration) -> Result<u16, CoreError> {
        Ok(UciClient::confirm(self, auth, timeout).await?)
    }

    async fn revert(&self) -> Result<u16, CoreError> {
        Ok(UciClient::revert(self).await?)
    }
}

impl Probe for HttpProbe {
    async fn probe(&self, protocol: Protocol, host: &str, timeout: Duration) -> bool {
        HttpProbe::probe(self, protocol, host, timeout).await
    }
}
