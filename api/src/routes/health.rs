use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health() -> (StatusCode, Json<ApiResponse<Value>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(json!({ "status": "ok" }), "Service is up")),
    )
}
