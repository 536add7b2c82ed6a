// UCI commit endpoints
//
// Staged-change listing, apply (checked and unchecked), confirm, revert,
// and the inbound-interface lookup used for the pre-apply risk check.

use std::time::Duration;

use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::auth::{ApplyMode, ConfirmAuth};
use crate::client::UciClient;
use crate::error::Error;
use crate::models::{ApplyReply, ApplyToken, InboundInterfaces, RawChangeset};

impl UciClient {
    /// Fetch the staged changeset.
    ///
    /// `GET {prefix}/changes?sid=&token=`
    pub async fn fetch_changes(&self) -> Result<RawChangeset, Error> {
        debug!("fetching staged changes");
        self.get_json("changes").await
    }

    /// Interfaces carrying the connection this client is using.
    ///
    /// `GET {prefix}/interfaces/inbound?sid=&token=`
    pub async fn inbound_interfaces(&self) -> Result<Vec<String>, Error> {
        debug!("fetching inbound interfaces");
        let raw: InboundInterfaces = self.get_json("interfaces/inbound").await?;
        Ok(raw.into())
    }

    /// Ask the device to apply all staged changes.
    ///
    /// `POST {prefix}/apply/unchecked` or `POST {prefix}/apply/rollback-checked`
    ///
    /// A 200 body is scanned for a `{"token": ...}` confirmation credential.
    pub async fn apply(&self, mode: ApplyMode) -> Result<ApplyReply, Error> {
        let url = self.endpoint_url(mode.path())?;
        debug!(%mode, "requesting apply");
        let resp = self.post_raw(url, &self.session().query(), None).await?;

        let status = resp.status().as_u16();
        // the device has armed its rollback once it answered 200, so an
        // unreadable body still yields a reply
        let token = if status == 200 {
            credential_from(resp.text().await)
        } else {
            None
        };

        Ok(ApplyReply { status, token })
    }

    /// Confirm a checked apply, or poll for rollback completion.
    ///
    /// `POST {prefix}/confirm?token=<credential>` or `?sid=&token=`
    ///
    /// Bounded by `timeout` independently of the client-wide timeout.
    pub async fn confirm(&self, auth: &ConfirmAuth, timeout: Duration) -> Result<u16, Error> {
        let url = self.endpoint_url("confirm")?;
        let resp = match auth {
            ConfirmAuth::Credential(token) => {
                self.post_raw(url, &[("token", token.expose_secret())], Some(timeout))
                    .await?
            }
            ConfirmAuth::Session => {
                self.post_raw(url, &self.session().query(), Some(timeout))
                    .await?
            }
        };
        Ok(resp.status().as_u16())
    }

    /// Discard all staged changes.
    ///
    /// `POST {prefix}/revert?sid=&token=`
    pub async fn revert(&self) -> Result<u16, Error> {
        let url = self.endpoint_url("revert")?;
        debug!("requesting revert");
        let resp = self.post_raw(url, &self.session().query(), None).await?;
        Ok(resp.status().as_u16())
    }
}

/// Confirmation credential from a checked-apply body, if one can be read.
fn credential_from<E: std::fmt::Display>(body: Result<String, E>) -> Option<String> {
    match body {
        Ok(body) => serde_json::from_str::<ApplyToken>(&body)
            .ok()
            .map(|t| t.token),
        Err(e) => {
            warn!(error = %e, "apply reply body unreadable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn credential_read_from_token_body() {
        let body: Result<String, &str> = Ok(r#"{"token":"abc123"}"#.into());
        assert_eq!(credential_from(body).as_deref(), Some("abc123"));
    }

    #[test]
    fn unreadable_body_yields_no_credential() {
        let body: Result<String, &str> = Err("connection reset");
        assert_eq!(credential_from(body), None);
    }

    #[test]
    fn unparsable_body_yields_no_credential() {
        let body: Result<String, &str> = Ok("<html>".into());
        assert_eq!(credential_from(body), None);
    }
}
