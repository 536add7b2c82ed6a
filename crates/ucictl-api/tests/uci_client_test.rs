#![allow(clippy::unwrap_used)]
// Integration tests for `UciClient` and `HttpProbe` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ucictl_api::{ApplyMode, ConfirmAuth, Error, HttpProbe, Protocol, SessionAuth, UciClient};

// ── Helpers ─────────────────────────────────────────────────────────

const PREFIX: &str = "/cgi-bin/luci/admin/uci";

async fn setup() -> (MockServer, UciClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = UciClient::with_client(
        reqwest::Client::new(),
        base_url,
        PREFIX,
        SessionAuth::new("s3ss10n", "csrf-tok"),
    );
    (server, client)
}

fn uci_path(suffix: &str) -> String {
    format!("{PREFIX}/{suffix}")
}

fn server_host(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_owned()
}

// ── Changes ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_changes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(uci_path("changes")))
        .and(query_param("sid", "s3ss10n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "changes": {
                "network": [["set", "lan", "proto", "dhcp"], ["remove", "wan6"]],
                "system": [["set", "@system[0]", "hostname", "gw"]]
            }
        })))
        .mount(&server)
        .await;

    let raw = client.fetch_changes().await.unwrap();

    assert_eq!(raw.changes.len(), 2);
    assert_eq!(raw.changes["network"].len(), 2);
    assert_eq!(raw.changes["network"][1], vec![json!("remove"), json!("wan6")]);
}

#[tokio::test]
async fn test_fetch_changes_session_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client.fetch_changes().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_fetch_changes_garbage_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(uci_path("changes")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = client.fetch_changes().await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => assert!(body.contains("login")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Interfaces ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_inbound_interfaces() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(uci_path("interfaces/inbound")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"interfaces": ["lan"]})))
        .mount(&server)
        .await;

    assert_eq!(client.inbound_interfaces().await.unwrap(), vec!["lan"]);
}

// ── Apply ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_apply_checked_returns_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(uci_path("apply/rollback-checked")))
        .and(query_param("sid", "s3ss10n"))
        .and(query_param("token", "csrf-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "T"})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client.apply(ApplyMode::Checked).await.unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.token.as_deref(), Some("T"));
}

#[tokio::test]
async fn test_apply_checked_nothing_to_apply() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(uci_path("apply/rollback-checked")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let reply = client.apply(ApplyMode::Checked).await.unwrap();

    assert_eq!(reply.status, 204);
    assert!(reply.token.is_none());
}

#[tokio::test]
async fn test_apply_unchecked_hits_unchecked_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(uci_path("apply/unchecked")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client.apply(ApplyMode::Unchecked).await.unwrap();

    assert_eq!(reply.status, 204);
}

#[tokio::test]
async fn test_apply_failure_status_is_data() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let reply = client.apply(ApplyMode::Checked).await.unwrap();

    assert_eq!(reply.status, 500);
    assert!(reply.token.is_none());
}

// ── Confirm ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_confirm_with_credential() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(uci_path("confirm")))
        .and(query_param("token", "T"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let auth = ConfirmAuth::Credential(SecretString::from("T".to_string()));
    let status = client.confirm(&auth, Duration::from_secs(5)).await.unwrap();

    assert_eq!(status, 204);
}

#[tokio::test]
async fn test_confirm_with_session() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(uci_path("confirm")))
        .and(query_param("sid", "s3ss10n"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let status = client
        .confirm(&ConfirmAuth::Session, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_confirm_times_out() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(uci_path("confirm")))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let auth = ConfirmAuth::Credential(SecretString::from("T".to_string()));
    let result = client.confirm(&auth, Duration::from_millis(100)).await;

    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::Timeout { timeout_ms: 100 }),
        "expected Timeout, got: {err:?}"
    );
    assert!(err.is_transient());
}

// ── Revert ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_revert() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(uci_path("revert")))
        .and(query_param("token", "csrf-tok"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.revert().await.unwrap(), 200);
}

// ── Probe ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_reachable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/luci-static/resources/icons/loading.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x47, 0x49, 0x46]))
        .mount(&server)
        .await;

    let probe = HttpProbe::with_client(
        reqwest::Client::new(),
        ucictl_api::probe::DEFAULT_PROBE_RESOURCE,
    );

    assert!(
        probe
            .probe(Protocol::Http, &server_host(&server), Duration::from_secs(1))
            .await
    );
}

#[tokio::test]
async fn test_probe_error_status_is_unreachable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let probe = HttpProbe::with_client(reqwest::Client::new(), "icons/loading.gif");

    assert!(
        !probe
            .probe(Protocol::Http, &server_host(&server), Duration::from_secs(1))
            .await
    );
}

#[tokio::test]
async fn test_probe_slow_server_loses_to_timer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let probe = HttpProbe::with_client(reqwest::Client::new(), "icons/loading.gif");
    let started = std::time::Instant::now();

    let reachable = probe
        .probe(Protocol::Http, &server_host(&server), Duration::from_millis(150))
        .await;

    assert!(!reachable);
    assert!(started.elapsed() < Duration::from_secs(2));
}
