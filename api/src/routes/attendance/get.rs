use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::Utc;

use crate::state::AppState;
use services::token_codec;

use super::common::{fail, ok, service_error_response, SessionResponse};

/// GET /api/attendance/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Response {
    match state.sessions().list_sessions().await {
        Ok(sessions) => {
            let sessions: Vec<_> = sessions
                .into_iter()
                .map(|s| SessionResponse::from_model(s, None))
                .collect();
            ok(StatusCode::OK, sessions, "Sessions retrieved")
        }
        Err(err) => service_error_response(err),
    }
}

/// GET /api/attendance/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Response {
    match state.sessions().get_session(session_id).await {
        Ok(Some(session)) => ok(
            StatusCode::OK,
            SessionResponse::from_model(session, None),
            "Session retrieved",
        ),
        Ok(None) => fail(StatusCode::NOT_FOUND, "Check-in session not found"),
        Err(err) => service_error_response(err),
    }
}

/// GET /api/attendance/sessions/{session_id}/code
///
/// Re-issues a fresh scannable code for a still-usable session.
pub async fn get_session_code(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Response {
    match state.sessions().reissue_code(session_id, Utc::now()).await {
        Ok(payload) => ok(
            StatusCode::OK,
            serde_json::json!({ "code": token_codec::encode(&payload) }),
            "Code reissued",
        ),
        Err(err) => service_error_response(err),
    }
}

/// GET /api/attendance/sessions/{session_id}/records
pub async fn list_session_records(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Response {
    match state.sessions().get_session(session_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return fail(StatusCode::NOT_FOUND, "Check-in session not found"),
        Err(err) => return service_error_response(err),
    }

    match state.sessions().session_records(session_id).await {
        Ok(records) => ok(StatusCode::OK, records, "Attendance records retrieved"),
        Err(err) => service_error_response(err),
    }
}
