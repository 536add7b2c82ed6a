// UCI HTTP client
//
// Wraps `reqwest::Client` with device-specific URL construction, session
// query parameters, and response parsing. Endpoint methods live in
// `uci.rs` to keep this module focused on transport mechanics.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::SessionAuth;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Default path prefix of the UCI endpoints on a stock device.
pub const DEFAULT_API_PREFIX: &str = "/cgi-bin/luci/admin/uci";

/// Raw HTTP client for the device's UCI commit endpoints.
///
/// Every mutating request carries the session id and CSRF token as query
/// parameters. Commit endpoints report their outcome through the status
/// code, so those methods hand the status back instead of failing on it.
#[derive(Clone)]
pub struct UciClient {
    http: reqwest::Client,
    base_url: Url,
    prefix: String,
    session: SessionAuth,
}

impl UciClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// A cookie jar is attached if the config lacks one; some firmware
    /// mirrors the session id into a cookie and expects it back.
    pub fn new(
        base_url: Url,
        prefix: &str,
        session: SessionAuth,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url, prefix, session))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        prefix: &str,
        session: SessionAuth,
    ) -> Self {
        Self {
            http,
            base_url,
            prefix: prefix.trim_end_matches('/').to_owned(),
            session,
        }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Host (and port, if non-default) of the device, as typed by the user.
    pub fn host(&self) -> Option<String> {
        let host = self.base_url.host_str()?;
        Some(match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        })
    }

    pub(crate) fn session(&self) -> &SessionAuth {
        &self.session
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}{prefix}/{path}`.
    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}{}/{path}", self.prefix);
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a POST with query parameters and return the raw response.
    ///
    /// Only transport failures are errors; the caller inspects the status.
    pub(crate) async fn post_raw(
        &self,
        url: Url,
        query: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, Error> {
        debug!("POST {}", url);

        let mut builder = self.http.post(url).query(query);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        builder.send().await.map_err(|e| map_send_error(e, timeout))
    }

    /// Send a session-authenticated GET and decode a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
    ) -> Result<T, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&self.session.query())
            .send()
            .await
            .map_err(|e| map_send_error(e, None))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("session rejected (HTTP {status})"),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", truncate(&body)),
            body,
        })
    }
}

fn map_send_error(err: reqwest::Error, timeout: Option<Duration>) -> Error {
    if err.is_timeout() {
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let timeout_ms = timeout.map_or(0, |t| t.as_millis() as u64);
        Error::Timeout { timeout_ms }
    } else {
        Error::Transport(err)
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
