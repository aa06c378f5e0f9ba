#![allow(clippy::unwrap_used)]
// End-to-end resource tests over `LegacyDirectory` against a wiremock
// controller.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use uniform_api::{ControllerPlatform, LegacyClient};
use uniform_core::{
    DevicePlan, DeviceResource, LegacyDirectory, LifecycleTimeouts, UserPlan, UserResource,
};

const MAC: &str = "aa:bb:cc:dd:ee:ff";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<LegacyDirectory>) {
    let server = MockServer::start().await;
    let client = LegacyClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        ControllerPlatform::ClassicController,
    );
    (server, Arc::new(LegacyDirectory::new(Arc::new(client))))
}

fn quick() -> LifecycleTimeouts {
    LifecycleTimeouts {
        adopt: Duration::from_secs(5),
        apply: Duration::from_secs(5),
        forget: Duration::from_secs(5),
        update_retry: Duration::from_secs(1),
        poll_interval: Duration::from_millis(10),
        not_found_tolerance: 2,
    }
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" }, "data": data }))
}

fn device_path() -> String {
    format!("/api/s/default/stat/device/{MAC}")
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn adopts_pending_device_over_http() {
    let (server, directory) = setup().await;

    // First lookup sees the device pending; later polls see it connected.
    Mock::given(method("GET"))
        .and(path(device_path()))
        .respond_with(ok(json!([{ "_id": "d1", "mac": MAC, "adopted": false, "state": 2 }])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(device_path()))
        .respond_with(ok(json!([{
            "_id": "d1",
            "mac": MAC,
            "adopted": true,
            "state": 1,
            "name": "lab-ap",
            "model": "U6LR"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/s/default/cmd/devmgr"))
        .and(body_json(json!({ "cmd": "adopt", "mac": MAC })))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    // Already converged after adoption: no configuration write.
    Mock::given(method("PUT"))
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let devices = DeviceResource::new(directory, quick(), "default");
    let plan: DevicePlan = serde_json::from_value(json!({ "mac": MAC, "name": "lab-ap" })).unwrap();
    let state = devices
        .create(&plan, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(state.id, "d1");
    assert!(state.adopted);
    assert_eq!(state.state, "connected");
    assert_eq!(state.config.name.as_deref(), Some("lab-ap"));
}

#[tokio::test]
async fn forget_tolerates_unknown_device_then_vanishes() {
    let (server, directory) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/s/default/cmd/sitemgr"))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(device_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.UnknownDevice" },
            "data": []
        })))
        .up_to_n_times(3)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(device_path()))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    let devices = DeviceResource::new(directory, quick(), "default");
    let prior = serde_json::from_value(json!({
        "id": "d1",
        "mac": MAC,
        "site": "default",
        "adopted": true,
        "state": "connected"
    }))
    .unwrap();
    devices
        .delete(&prior, &CancellationToken::new())
        .await
        .unwrap();
}

// ── Users ───────────────────────────────────────────────────────────

#[tokio::test]
async fn user_create_absorbs_registered_mac_over_http() {
    let (server, directory) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/s/default/group/user"))
        .respond_with(ok(json!([{
            "meta": { "rc": "error", "msg": "api.err.MacUsed" },
            "data": []
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/user/00:11:22:33:44:55"))
        .respond_with(ok(json!([{
            "_id": "u7",
            "mac": "00:11:22:33:44:55",
            "name": "old-name",
            "site_id": "s1"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/s/default/rest/user/u7"))
        .respond_with(ok(json!([{
            "_id": "u7",
            "mac": "00:11:22:33:44:55",
            "name": "printer",
            "site_id": "s1"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let users = UserResource::new(directory, "default");
    let plan: UserPlan =
        serde_json::from_value(json!({ "mac": "00:11:22:33:44:55", "name": "printer" })).unwrap();
    let state = users.create(&plan).await.unwrap();

    assert_eq!(state.id, "u7");
    assert_eq!(state.config.name.as_deref(), Some("printer"));
}
