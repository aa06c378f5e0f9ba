#![allow(clippy::unwrap_used)]
// Integration tests for `LegacyClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use uniform_api::legacy::models::LegacyUser;
use uniform_api::{ControllerPlatform, Error, LegacyClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, LegacyClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = LegacyClient::with_client(
        reqwest::Client::new(),
        base_url,
        ControllerPlatform::ClassicController,
    );
    (server, client)
}

fn site_path(suffix: &str) -> String {
    format!("/api/s/default/{suffix}")
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" }, "data": data }))
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "test-password".to_string().into();
    client.login("admin", &secret).await.unwrap();
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong-password".to_string().into();
    let result = client.login("admin", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_logout_posts_to_platform_route() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_detect_platform_unifi_os() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).unwrap();
    let platform = LegacyClient::detect_platform(&base, &TransportConfig::default())
        .await
        .unwrap();
    assert_eq!(platform, ControllerPlatform::UnifiOs);
}

#[tokio::test]
async fn test_detect_platform_classic() {
    // Unmatched routes answer 404, so only the classic probe succeeds.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).unwrap();
    let platform = LegacyClient::detect_platform(&base, &TransportConfig::default())
        .await
        .unwrap();
    assert_eq!(platform, ControllerPlatform::ClassicController);
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_device_by_mac() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(site_path("stat/device/aa:bb:cc:dd:ee:ff")))
        .respond_with(ok(json!([{
            "_id": "abc123",
            "mac": "aa:bb:cc:dd:ee:ff",
            "type": "usw",
            "name": "Switch-24",
            "adopted": true,
            "state": 1,
            "port_overrides": [{ "port_idx": 1, "name": "uplink" }]
        }])))
        .mount(&server)
        .await;

    let device = client
        .get_device_by_mac("default", "AA:BB:CC:DD:EE:FF")
        .await
        .unwrap();

    assert_eq!(device.id, "abc123");
    assert_eq!(device.name.as_deref(), Some("Switch-24"));
    assert!(device.adopted);
    assert_eq!(device.state, 1);
    assert_eq!(device.port_overrides.unwrap()[0].port_idx, 1);
}

#[tokio::test]
async fn test_get_device_empty_result_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(site_path("stat/device/aa:bb:cc:dd:ee:ff")))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    let err = client
        .get_device_by_mac("default", "aa:bb:cc:dd:ee:ff")
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got: {err:?}");
}

#[tokio::test]
async fn test_get_device_by_id_filters_listing() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(site_path("stat/device")))
        .respond_with(ok(json!([
            { "_id": "dev-a", "mac": "aa:bb:cc:00:00:01", "state": 1 },
            { "_id": "dev-b", "mac": "aa:bb:cc:00:00:02", "state": 2 }
        ])))
        .mount(&server)
        .await;

    let device = client.get_device("default", "dev-b").await.unwrap();
    assert_eq!(device.mac, "aa:bb:cc:00:00:02");

    let err = client.get_device("default", "dev-z").await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got: {err:?}");
}

#[tokio::test]
async fn test_unknown_device_on_http_400_is_classified() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(site_path("stat/device/aa:bb:cc:dd:ee:ff")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.UnknownDevice" },
            "data": []
        })))
        .mount(&server)
        .await;

    let err = client
        .get_device_by_mac("default", "aa:bb:cc:dd:ee:ff")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownDevice), "got: {err:?}");
}

#[tokio::test]
async fn test_adopt_device_sends_devmgr_command() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(site_path("cmd/devmgr")))
        .and(body_json(json!({ "cmd": "adopt", "mac": "aa:bb:cc:dd:ee:ff" })))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client
        .adopt_device("default", "AA:BB:CC:DD:EE:FF")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_forget_device_sends_sitemgr_command() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(site_path("cmd/sitemgr")))
        .and(body_json(
            json!({ "cmd": "delete-device", "macs": ["aa:bb:cc:dd:ee:ff"] }),
        ))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client
        .forget_device("default", "aa:bb:cc:dd:ee:ff")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_device_puts_full_record() {
    let (server, client) = setup().await;

    let stored = json!({
        "_id": "abc123",
        "mac": "aa:bb:cc:dd:ee:ff",
        "state": 1,
        "adopted": true,
        "name": "renamed",
        "config_network": { "type": "dhcp" }
    });

    Mock::given(method("PUT"))
        .and(path(site_path("rest/device/abc123")))
        .and(body_json(&stored))
        .respond_with(ok(json!([stored.clone()])))
        .expect(1)
        .mount(&server)
        .await;

    let device = serde_json::from_value(stored).unwrap();
    let updated = client.update_device("default", &device).await.unwrap();
    assert_eq!(updated, device);
}

// ── User tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_user_mac_in_use() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(site_path("group/user")))
        .respond_with(ok(json!([{
            "meta": { "rc": "error", "msg": "api.err.MacUsed" },
            "data": []
        }])))
        .mount(&server)
        .await;

    let user = LegacyUser {
        mac: "00:11:22:33:44:55".into(),
        name: Some("printer".into()),
        ..LegacyUser::default()
    };
    let err = client.create_user("default", &user).await.unwrap_err();
    assert!(
        matches!(err, Error::MacInUse { ref mac } if mac == "00:11:22:33:44:55"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn test_create_user_returns_assigned_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(site_path("group/user")))
        .respond_with(ok(json!([{
            "meta": { "rc": "ok" },
            "data": [{ "_id": "u1", "mac": "00:11:22:33:44:55", "name": "printer" }]
        }])))
        .mount(&server)
        .await;

    let user = LegacyUser {
        mac: "00:11:22:33:44:55".into(),
        name: Some("printer".into()),
        ..LegacyUser::default()
    };
    let created = client.create_user("default", &user).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("u1"));
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_devices("default").await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("session expired"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_legacy_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(site_path("stat/device")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.InvalidObject" },
            "data": []
        })))
        .mount(&server)
        .await;

    match client.list_devices("default").await {
        Err(Error::LegacyApi { ref message }) => {
            assert!(message.contains("InvalidObject"), "got: {message}");
        }
        other => panic!("expected LegacyApi error, got: {other:?}"),
    }
}
