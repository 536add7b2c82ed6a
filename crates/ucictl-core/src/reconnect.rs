// ── Reconnect waiter ──
//
// After a revert or a device that went away, probe every candidate
// (protocol, host) pair until one answers, then navigate there once.

use futures_util::future::join_all;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use ucictl_api::{Protocol, ReachabilityResult};
use url::Url;

use crate::backend::Probe;
use crate::config::ReconnectTimings;
use crate::error::CoreError;
use crate::surface::Navigator;

pub struct ReconnectWaiter<'a, P> {
    probe: &'a P,
    navigator: &'a dyn Navigator,
    timings: ReconnectTimings,
    default_host: &'a str,
}

impl<'a, P: Probe> ReconnectWaiter<'a, P> {
    pub fn new(
        probe: &'a P,
        navigator: &'a dyn Navigator,
        timings: ReconnectTimings,
        default_host: &'a str,
    ) -> Self {
        Self {
            probe,
            navigator,
            timings,
            default_host,
        }
    }

    /// Wait until one of `hosts` answers, then navigate to it.
    ///
    /// An empty list means the default host. Rounds start every
    /// `interval` and never overlap. There is no upper bound; only
    /// `cancel` ends the wait early, without navigating.
    pub async fn await_reconnect(
        &self,
        hosts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Url, CoreError> {
        let hosts: Vec<&str> = if hosts.is_empty() {
            vec![self.default_host]
        } else {
            hosts.iter().map(String::as_str).collect()
        };
        debug!(?hosts, grace = ?self.timings.grace, "waiting for device");

        wait_until(Instant::now() + self.timings.grace, cancel).await?;

        let mut round: u32 = 0;
        loop {
            let started = Instant::now();
            round += 1;

            let results = tokio::select! {
                () = cancel.cancelled() => return Err(CoreError::Cancelled),
                results = self.probe_round(&hosts) => results,
            };

            if let Some(hit) = results.into_iter().find(|r| r.reachable) {
                let url = hit.url()?;
                info!(%url, round, "device reachable");
                self.navigator.navigate(&url);
                return Ok(url);
            }

            debug!(round, "no candidate answered");
            wait_until(started + self.timings.interval, cancel).await?;
        }
    }

    /// Probe every protocol × host pair in parallel.
    ///
    /// Results keep candidate order: http before https, then host order.
    async fn probe_round(&self, hosts: &[&str]) -> Vec<ReachabilityResult> {
        let timeout = self.timings.probe_timeout;
        let candidates = Protocol::ALL
            .into_iter()
            .flat_map(|protocol| hosts.iter().map(move |host| (protocol, *host)));

        join_all(candidates.map(|(protocol, host)| async move {
            ReachabilityResult {
                host: host.to_owned(),
                protocol,
                reachable: self.probe.probe(protocol, host, timeout).await,
            }
        }))
        .await
    }
}

async fn wait_until(until: Instant, cancel: &CancellationToken) -> Result<(), CoreError> {
    tokio::select! {
        () = cancel.cancelled() => Err(CoreError::Cancelled),
        () = sleep_until(until) => Ok(()),
    }
}
