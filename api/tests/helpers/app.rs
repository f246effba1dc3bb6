use std::convert::Infallible;
use std::sync::Once;

use api::routes::routes;
use api::state::AppState;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use sea_orm::DatabaseConnection;
use tower::util::BoxCloneService;
use tower::ServiceExt;

pub const ATTENDANCE_SECRET: &str = "test-attendance-secret";

static INIT: Once = Once::new();

fn init_config() {
    INIT.call_once(|| {
        unsafe {
            std::env::set_var("DATABASE_URL", "sqlite::memory:");
            std::env::set_var("JWT_SECRET", "test-jwt-secret");
            std::env::set_var("ATTENDANCE_SECRET", ATTENDANCE_SECRET);
        }
        common::config::Config::init(".env.test");
    });
}

pub type TestApp = BoxCloneService<Request<Body>, Response, Infallible>;

/// Fresh in-memory database and a ready router for each test.
pub async fn make_test_app() -> (TestApp, DatabaseConnection) {
    init_config();

    let db = db::test_utils::setup_test_db().await;
    let state = AppState::new(db.clone(), ATTENDANCE_SECRET, 0);

    let router = Router::new().nest("/api", routes(state));
    (router.into_service().boxed_clone(), db)
}

pub fn bearer(user_id: i64, name: &str, admin: bool) -> String {
    init_config();
    let (token, _) = api::auth::generate_jwt(user_id, name, admin);
    format!("Bearer {token}")
}

pub async fn send_json(
    app: &TestApp,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
