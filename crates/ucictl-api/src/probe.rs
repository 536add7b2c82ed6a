//! Session-independent reachability probing.
//!
//! While a device is applying network changes the session transport is
//! presumed broken, so probing uses its own cookie-less client and fetches a
//! small static resource. Each probe races the request against a local
//! timer: a device that accepts the connection but never answers still
//! yields `false` once the timer fires.

use std::time::Duration;

use strum::{Display, EnumString};
use tracing::trace;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Static asset every stock firmware image serves without a session.
pub const DEFAULT_PROBE_RESOURCE: &str = "/luci-static/resources/icons/loading.gif";

/// URL scheme a probe is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// Probe order used when waiting for a device to come back.
    pub const ALL: [Self; 2] = [Self::Http, Self::Https];
}

/// Outcome of one probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityResult {
    pub host: String,
    pub protocol: Protocol,
    pub reachable: bool,
}

impl ReachabilityResult {
    /// Root URL of the probed host, the place to send the operator back to.
    pub fn url(&self) -> Result<Url, Error> {
        root_url(self.protocol, &self.host)
    }
}

/// `{protocol}://{host}/`
pub fn root_url(protocol: Protocol, host: &str) -> Result<Url, Error> {
    Ok(Url::parse(&format!("{protocol}://{host}/"))?)
}

/// Reachability probe over plain HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpProbe {
    http: reqwest::Client,
    resource: String,
}

impl HttpProbe {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::with_client(
            transport.build_probe_client()?,
            DEFAULT_PROBE_RESOURCE,
        ))
    }

    pub fn with_client(http: reqwest::Client, resource: &str) -> Self {
        let resource = if resource.starts_with('/') {
            resource.to_owned()
        } else {
            format!("/{resource}")
        };
        Self { http, resource }
    }

    /// Probe `{protocol}://{host}{resource}`, resolving within `timeout`.
    ///
    /// Never fails: malformed hosts, transport errors, error statuses and
    /// timeouts all read as unreachable.
    pub async fn probe(&self, protocol: Protocol, host: &str, timeout: Duration) -> bool {
        let url = match Url::parse(&format!("{protocol}://{host}{}", self.resource)) {
            Ok(mut url) => {
                // cache-buster
                url.query_pairs_mut()
                    .append_pair("_", &uuid::Uuid::new_v4().simple().to_string());
                url
            }
            Err(e) => {
                trace!(%protocol, host, error = %e, "probe URL invalid");
                return false;
            }
        };

        let request = self.http.get(url).send();
        let reachable = match tokio::time::timeout(timeout, request).await {
            Ok(Ok(resp)) => resp.status().is_success(),
            Ok(Err(e)) => {
                trace!(%protocol, host, error = %e, "probe failed");
                false
            }
            Err(_) => {
                trace!(%protocol, host, "probe timed out");
                false
            }
        };

        trace!(%protocol, host, reachable, "probe finished");
        reachable
    }
}
