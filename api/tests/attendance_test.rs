mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sea_orm::EntityTrait;
use serde_json::json;

use db::models::attendance_record;
use db::models::attendance_session::EventType;
use services::token_codec::{encode, CheckInPayload};
use services::word_of_day::word_of_day;

use helpers::app::{bearer, make_test_app, send_json, TestApp, ATTENDANCE_SECRET};

async fn create_session(app: &TestApp, admin: &str) -> (i64, String) {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/attendance/sessions",
        Some(admin),
        Some(json!({
            "event_name": "Sunday Service",
            "event_type": "weekly",
            "duration_minutes": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let id = body["data"]["id"].as_i64().unwrap();
    let code = body["data"]["code"].as_str().unwrap().to_owned();
    (id, code)
}

/// A payload that passes the pure checks except where overridden.
fn forged_payload(session_id: i64) -> CheckInPayload {
    let now = Utc::now();
    CheckInPayload {
        session_id,
        event_name: "Sunday Service".into(),
        event_type: EventType::Weekly,
        word_of_day: word_of_day(now.date_naive(), ATTENDANCE_SECRET).into(),
        issued_token: "forged-token".into(),
        issued_at: now,
        expires_at: now + Duration::minutes(30),
    }
}

#[tokio::test]
async fn health_is_public() {
    let (app, _db) = make_test_app().await;
    let (status, body) = send_json(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn attendance_routes_require_authentication() {
    let (app, _db) = make_test_app().await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        None,
        Some(json!({ "code": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&app, "GET", "/api/attendance/sessions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_management_is_admin_only() {
    let (app, _db) = make_test_app().await;
    let member = bearer(5, "Jordan Lee", false);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/sessions",
        Some(&member),
        Some(json!({
            "event_name": "Sunday Service",
            "event_type": "weekly",
            "duration_minutes": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        send_json(&app, "GET", "/api/attendance/sessions", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_session_returns_scannable_code() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/sessions",
        Some(&admin),
        Some(json!({
            "event_name": "Youth Retreat",
            "event_type": "retreat",
            "duration_minutes": 120
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["active"], true);
    assert_eq!(body["data"]["attendance_count"], 0);
    assert!(body["data"]["word_of_day"].as_str().unwrap().len() > 0);
    assert!(body["data"]["code"]
        .as_str()
        .unwrap()
        .starts_with("FC-ATTEND:"));

    let (status, body) =
        send_json(&app, "GET", "/api/attendance/sessions", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    // the listing never re-exposes the code
    assert!(body["data"][0].get("code").is_none());
}

#[tokio::test]
async fn invalid_duration_is_rejected() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/sessions",
        Some(&admin),
        Some(json!({
            "event_name": "Sunday Service",
            "event_type": "weekly",
            "duration_minutes": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn check_in_happy_path_then_duplicate_conflict() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(10, "Jordan Lee", false);
    let (session_id, code) = create_session(&app, &admin).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["session_id"], session_id);
    assert_eq!(body["data"]["user_name"], "Jordan Lee");
    assert_eq!(body["data"]["check_in_method"], "self");
    assert_eq!(body["data"]["is_visitor"], false);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn kiosk_scans_are_recorded_as_qrcode() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(11, "Sam Park", false);
    let (_, code) = create_session(&app, &admin).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": code, "kiosk": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["check_in_method"], "qrcode");
}

#[tokio::test]
async fn malformed_code_is_bad_request() {
    let (app, _db) = make_test_app().await;
    let member = bearer(10, "Jordan Lee", false);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": "definitely not a code" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn expired_code_is_bad_request_even_without_a_session() {
    let (app, _db) = make_test_app().await;
    let member = bearer(10, "Jordan Lee", false);

    let mut payload = forged_payload(9999);
    payload.issued_at = Utc::now() - Duration::hours(2);
    payload.expires_at = Utc::now() - Duration::hours(1);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": encode(&payload) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn wrong_word_of_day_is_bad_request() {
    let (app, _db) = make_test_app().await;
    let member = bearer(10, "Jordan Lee", false);

    let mut payload = forged_payload(9999);
    payload.word_of_day = "NOTTODAYSWORD".into();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": encode(&payload) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("word"));
}

#[tokio::test]
async fn valid_payload_for_unknown_session_is_not_found() {
    let (app, _db) = make_test_app().await;
    let member = bearer(10, "Jordan Lee", false);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": encode(&forged_payload(9999)) })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivated_session_rejects_check_in() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(10, "Jordan Lee", false);
    let (session_id, code) = create_session(&app, &admin).await;

    let uri = format!("/api/attendance/sessions/{session_id}/deactivate");
    let (status, body) = send_json(&app, "PUT", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], false);

    // idempotent
    let (status, _) = send_json(&app, "PUT", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn visitor_check_in_requires_admin_and_never_deduplicates() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(10, "Jordan Lee", false);
    let (_, code) = create_session(&app, &admin).await;

    let visitor_body = json!({
        "code": code,
        "visitor": { "name": "Chris Walker", "invited_by": "Jordan Lee" }
    });

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(visitor_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&admin),
        Some(visitor_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_visitor"], true);
    assert_eq!(body["data"]["check_in_method"], "admin");

    // same visitor again: no user id, no duplicate rule
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&admin),
        Some(visitor_body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn on_behalf_check_in_requires_admin() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(10, "Jordan Lee", false);
    let (_, code) = create_session(&app, &admin).await;

    let body = json!({
        "code": code,
        "on_behalf_of": { "user_id": 77, "user_name": "Elder Cho" }
    });

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&admin),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"]["user_name"], "Elder Cho");
    assert_eq!(resp["data"]["check_in_method"], "admin");
}

#[tokio::test]
async fn reissued_code_checks_in_successfully() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(10, "Jordan Lee", false);
    let (session_id, first_code) = create_session(&app, &admin).await;

    let uri = format!("/api/attendance/sessions/{session_id}/code");
    let (status, body) = send_json(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let reissued = body["data"]["code"].as_str().unwrap().to_owned();
    assert!(reissued.starts_with("FC-ATTEND:"));
    assert_ne!(reissued, first_code);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": reissued })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn session_records_listing_includes_check_ins() {
    let (app, _db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(10, "Jordan Lee", false);
    let (session_id, code) = create_session(&app, &admin).await;

    send_json(
        &app,
        "POST",
        "/api/attendance/check-in",
        Some(&member),
        Some(json!({ "code": code })),
    )
    .await;

    let uri = format!("/api/attendance/sessions/{session_id}/records");
    let (status, body) = send_json(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["user_name"], "Jordan Lee");

    let (status, _) = send_json(
        &app,
        "GET",
        "/api/attendance/sessions/9999/records",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sync_reports_summary_and_is_idempotent() {
    let (app, db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(10, "Jordan Lee", false);
    let (session_id, code) = create_session(&app, &admin).await;

    let op = json!({
        "local_id": "device-op-1",
        "session_id": session_id,
        "event_name": "Sunday Service",
        "check_in_time": Utc::now().to_rfc3339(),
        "payload": code
    });

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/sync",
        Some(&member),
        Some(json!({ "operations": [op.clone()] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["synced"], 1);
    assert_eq!(body["data"]["skipped"], 0);
    assert_eq!(body["data"]["failed"], 0);

    // the device lost the ack and re-posts the same operation
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/sync",
        Some(&member),
        Some(json!({ "operations": [op] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["synced"], 0);
    assert_eq!(body["data"]["skipped"], 1);

    let records = attendance_record::Entity::find().all(&db).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].local_id.as_deref(), Some("device-op-1"));
    assert_eq!(
        records[0].check_in_method,
        attendance_record::CheckInMethod::Offline
    );
}

#[tokio::test]
async fn sync_cannot_forge_attendance_for_other_members() {
    let (app, db) = make_test_app().await;
    let admin = bearer(1, "Pastor Kim", true);
    let member = bearer(10, "Jordan Lee", false);
    let (session_id, code) = create_session(&app, &admin).await;

    let forged = json!({
        "local_id": "forged-1",
        "user_id": 77,
        "user_name": "Elder Cho",
        "session_id": session_id,
        "event_name": "Sunday Service",
        "check_in_time": Utc::now().to_rfc3339(),
        "payload": code
    });

    // same gate as the live check-in path: members sync only themselves
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/sync",
        Some(&member),
        Some(json!({ "operations": [forged.clone()] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let visitor_op = json!({
        "local_id": "forged-2",
        "visitor": true,
        "user_name": "Walk-in",
        "session_id": session_id,
        "event_name": "Sunday Service",
        "check_in_time": Utc::now().to_rfc3339(),
        "payload": code
    });
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/sync",
        Some(&member),
        Some(json!({ "operations": [visitor_op] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert!(attendance_record::Entity::find()
        .all(&db)
        .await
        .unwrap()
        .is_empty());

    // an admin syncing a greeter device's queue is allowed
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/sync",
        Some(&admin),
        Some(json!({ "operations": [forged] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["synced"], 1);

    let records = attendance_record::Entity::find().all(&db).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, Some(77));
}

#[tokio::test]
async fn sync_with_unreplayable_operation_reports_failed() {
    let (app, _db) = make_test_app().await;
    let member = bearer(10, "Jordan Lee", false);

    let op = json!({
        "local_id": "poisoned-1",
        "event_name": "Sunday Service",
        "check_in_time": Utc::now().to_rfc3339(),
        "payload": "FC-ATTEND:!!corrupt!!"
    });

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/attendance/sync",
        Some(&member),
        Some(json!({ "operations": [op] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["failed"], 1);
    assert_eq!(body["data"]["synced"], 0);
}
