use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::state::AppState;

use super::common::{ok, service_error_response, SessionResponse};

/// PUT /api/attendance/sessions/{session_id}/deactivate
///
/// Force-closes a session before natural expiry. Idempotent.
pub async fn deactivate_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Response {
    match state.sessions().deactivate_session(session_id).await {
        Ok(session) => ok(
            StatusCode::OK,
            SessionResponse::from_model(session, None),
            "Attendance session deactivated",
        ),
        Err(err) => service_error_response(err),
    }
}
