#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceOperations` against a wiremock platform.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tuyalarm_api::ManualClock;
use tuyalarm_core::{
    AlarmConfig, ApiResult, BatteryBand, CommandPayload, CoreError, DeviceOperations, ErrorKind,
};

const DEVICE_ID: &str = "vdevo123456789012345";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DeviceOperations) {
    let server = MockServer::start().await;
    let mut config = AlarmConfig::new(
        "test_access_id",
        SecretString::from("test_secret".to_owned()),
        Url::parse(&server.uri()).unwrap(),
    );
    config.timeout = Duration::from_millis(300);

    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ));
    let ops = DeviceOperations::with_clock(&config, clock).unwrap();

    Mock::given(method("GET"))
        .and(path("/v1.0/token"))
        .respond_with(ok(json!({"access_token": "tok-123", "expire_time": 7200})))
        .mount(&server)
        .await;

    (server, ops)
}

fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true, "result": result}))
}

fn commands_path() -> String {
    format!("/v1.0/devices/{DEVICE_ID}/commands")
}

async fn expect_batch(server: &MockServer, commands: Value) {
    Mock::given(method("POST"))
        .and(path(commands_path()))
        .and(body_json(json!({ "commands": commands })))
        .respond_with(ok(json!(true)))
        .expect(1)
        .mount(server)
        .await;
}

async fn expect_no_commands(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(commands_path()))
        .respond_with(ok(json!(true)))
        .expect(0)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, status: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/devices/{DEVICE_ID}")))
        .respond_with(ok(json!({
            "id": DEVICE_ID,
            "name": "Hallway Siren",
            "online": true,
            "status": status
        })))
        .mount(server)
        .await;
}

// ── Validation happens before the network ───────────────────────────

#[tokio::test]
async fn test_out_of_domain_volume_sends_nothing() {
    let (server, ops) = setup().await;
    expect_no_commands(&server).await;

    let err = ops.set_volume(DEVICE_ID, "extreme").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let raw = [CommandPayload {
        code: "alarm_volume".into(),
        value: json!("extreme"),
    }];
    let err = ops.send_commands(DEVICE_ID, &raw).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_unknown_preset_is_validation() {
    let (server, ops) = setup().await;
    expect_no_commands(&server).await;

    let err = ops.apply_preset(DEVICE_ID, "nonexistent").await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

#[tokio::test]
async fn test_empty_batch_and_bad_duration_are_rejected() {
    let (server, ops) = setup().await;
    expect_no_commands(&server).await;

    let err = ops.send_commands(DEVICE_ID, &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    for seconds in [0, 61] {
        let err = ops.set_duration(DEVICE_ID, seconds).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let err = ops.activate_alarm("bad/id").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ── Command sequences ───────────────────────────────────────────────

#[tokio::test]
async fn test_away_preset_sends_exact_sequence() {
    let (server, ops) = setup().await;
    expect_batch(
        &server,
        json!([
            {"code": "master_mode", "value": "arm"},
            {"code": "alert_state", "value": true},
            {"code": "alarm_switch", "value": true},
            {"code": "alarm_volume", "value": "high"},
            {"code": "bright_state", "value": "strong"}
        ]),
    )
    .await;

    let result = ops.apply_preset(DEVICE_ID, "away").await.unwrap();
    assert_eq!(result, json!(true));
}

#[tokio::test]
async fn test_activate_alarm_sends_emergency_bundle() {
    let (server, ops) = setup().await;
    expect_batch(
        &server,
        json!([
            {"code": "alarm_switch", "value": true},
            {"code": "alert_state", "value": true},
            {"code": "alarm_state", "value": "alarm_sound_light"},
            {"code": "alarm_volume", "value": "high"},
            {"code": "bright_state", "value": "strong"},
            {"code": "master_mode", "value": "sos"}
        ]),
    )
    .await;

    ops.activate_alarm(DEVICE_ID).await.unwrap();
}

#[tokio::test]
async fn test_deactivate_alarm_sends_disarm_bundle() {
    let (server, ops) = setup().await;
    expect_batch(
        &server,
        json!([
            {"code": "alarm_switch", "value": false},
            {"code": "alert_state", "value": false},
            {"code": "alarm_state", "value": "normal"},
            {"code": "master_mode", "value": "disarmed"}
        ]),
    )
    .await;

    ops.deactivate_alarm(DEVICE_ID).await.unwrap();
}

#[tokio::test]
async fn test_set_mode_arm_adds_arming_flags() {
    let (server, ops) = setup().await;
    expect_batch(
        &server,
        json!([
            {"code": "master_mode", "value": "arm"},
            {"code": "alert_state", "value": true},
            {"code": "alarm_switch", "value": true}
        ]),
    )
    .await;

    ops.set_mode(DEVICE_ID, "arm").await.unwrap();
}

#[tokio::test]
async fn test_set_duration_sends_integer() {
    let (server, ops) = setup().await;
    expect_batch(&server, json!([{"code": "alarm_time", "value": 30}])).await;

    ops.set_duration(DEVICE_ID, 30).await.unwrap();
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_high_battery() {
    let (server, ops) = setup().await;
    mount_status(
        &server,
        json!([
            {"code": "alarm_volume", "value": "middle"},
            {"code": "battery_percentage", "value": 95}
        ]),
    )
    .await;

    let status = ops.get_status(DEVICE_ID).await.unwrap();
    assert_eq!(status.formatted_status["battery_percentage"], json!(95));
    assert_eq!(status.labels.battery_state, Some(BatteryBand::High));
    assert_eq!(status.device["name"], "Hallway Siren");
}

#[tokio::test]
async fn test_status_low_battery() {
    let (server, ops) = setup().await;
    mount_status(&server, json!([{"code": "battery_percentage", "value": 10}])).await;

    let status = ops.get_status(DEVICE_ID).await.unwrap();
    assert_eq!(status.labels.battery_state, Some(BatteryBand::Low));
}

#[tokio::test]
async fn test_status_without_points_is_empty() {
    let (server, ops) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/devices/{DEVICE_ID}")))
        .respond_with(ok(json!({"id": DEVICE_ID})))
        .mount(&server)
        .await;

    let status = ops.get_status(DEVICE_ID).await.unwrap();
    assert!(status.formatted_status.is_empty());
    assert_eq!(status.labels.battery_state, None);
}

#[tokio::test]
async fn test_status_detail_omits_local_key() {
    let (server, ops) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/devices/{DEVICE_ID}")))
        .respond_with(ok(json!({
            "id": DEVICE_ID,
            "local_key": "lan-secret",
            "category": "sgbj",
            "status": null
        })))
        .mount(&server)
        .await;

    let status = ops.get_status(DEVICE_ID).await.unwrap();
    assert!(status.device.get("local_key").is_none());
    assert_eq!(status.device["category"], "sgbj");
    assert!(status.formatted_status.is_empty());
}

#[tokio::test]
async fn test_malformed_status_is_protocol() {
    let (server, ops) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/devices/{DEVICE_ID}")))
        .respond_with(ok(json!({"id": DEVICE_ID, "status": "offline"})))
        .mount(&server)
        .await;

    let err = ops.get_status(DEVICE_ID).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

// ── Failure classification ──────────────────────────────────────────

#[tokio::test]
async fn test_timeout_is_network_failure() {
    let (server, ops) = setup().await;
    Mock::given(method("POST"))
        .and(path(commands_path()))
        .respond_with(ok(json!(true)).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let result = ApiResult::from(ops.deactivate_alarm(DEVICE_ID).await);
    assert!(!result.success);
    assert_eq!(result.kind(), Some(ErrorKind::Network));
}

#[tokio::test]
async fn test_token_invalid_is_api_error_with_one_request() {
    let (server, ops) = setup().await;
    Mock::given(method("POST"))
        .and(path(commands_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "code": 1010,
            "msg": "token invalid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = ops.set_brightness(DEVICE_ID, "low").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.api_code(), Some(1010));
    assert!(err.is_auth_rejection());

    let result = ApiResult::failure(&err);
    let error = result.error.unwrap();
    assert_eq!(error.code, Some(1010));
    assert!(error.message.contains("token invalid"));
}

#[tokio::test]
async fn test_check_credentials_reports_expiry() {
    let (_server, ops) = setup().await;

    let check = ops.check_credentials().await.unwrap();
    assert!(check.valid);
    assert_eq!(check.access_id, "test_a...");
    assert_eq!(
        check.token_expires_at,
        DateTime::from_timestamp(1_700_007_200, 0).unwrap()
    );
}

#[tokio::test]
async fn test_bad_credentials_are_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "code": 1004,
            "msg": "sign invalid"
        })))
        .mount(&server)
        .await;
    let config = AlarmConfig::new(
        "wrong",
        SecretString::from("wrong".to_owned()),
        Url::parse(&server.uri()).unwrap(),
    );
    let ops = DeviceOperations::new(&config).unwrap();

    let result = ApiResult::from(ops.check_credentials().await);
    assert_eq!(result.kind(), Some(ErrorKind::Auth));
}
