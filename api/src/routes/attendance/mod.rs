//! Attendance routes: session lifecycle (admin), check-in, and offline sync.

use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};

use crate::auth::guards::allow_admin;
use crate::state::AppState;

mod common;
mod get;
mod post;
mod put;
mod sync;

pub fn attendance_routes() -> Router<AppState> {
    let session_management = Router::new()
        .route("/sessions", post(post::create_session))
        .route("/sessions", get(get::list_sessions))
        .route("/sessions/{session_id}", get(get::get_session))
        .route("/sessions/{session_id}/code", get(get::get_session_code))
        .route(
            "/sessions/{session_id}/deactivate",
            put(put::deactivate_session),
        )
        .route(
            "/sessions/{session_id}/records",
            get(get::list_session_records),
        )
        .route_layer(from_fn(allow_admin));

    Router::new()
        .merge(session_management)
        .route("/check-in", post(post::check_in))
        .route("/sync", post(sync::sync_offline))
}
