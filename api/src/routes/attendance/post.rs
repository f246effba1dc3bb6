use axum::{extract::State, http::StatusCode, response::Response, Extension, Json};
use chrono::Utc;
use validator::Validate;

use crate::auth::AuthUser;
use crate::state::AppState;
use common::format_validation_errors;
use db::models::attendance_record::CheckInMethod;
use services::session::CreateSessionParams;
use services::token_codec;
use services::validator::CheckInActor;

use super::common::{
    fail, ok, service_error_response, CheckInReq, CheckInResponse, CreateSessionReq,
    SessionResponse,
};

/// POST /api/attendance/sessions
///
/// Opens a check-in window for one event instance and returns the session
/// together with its scannable code.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateSessionReq>,
) -> Response {
    if let Err(errors) = body.validate() {
        return fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            format_validation_errors(&errors),
        );
    }

    let params = CreateSessionParams {
        event_name: body.event_name,
        event_type: body.event_type,
        duration_minutes: body.duration_minutes,
        event_id: body.event_id,
        created_by: claims.sub,
    };

    match state.sessions().create_session(params).await {
        Ok((session, payload)) => {
            let code = token_codec::encode(&payload);
            ok(
                StatusCode::CREATED,
                SessionResponse::from_model(session, Some(code)),
                "Attendance session created",
            )
        }
        Err(err) => service_error_response(err),
    }
}

/// POST /api/attendance/check-in
///
/// Validates a scanned code for the caller (or, for admins, on behalf of a
/// member or walk-in visitor) and persists the attendance record.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CheckInReq>,
) -> Response {
    let (actor, method) = match (body.visitor, body.on_behalf_of) {
        (Some(_), Some(_)) => {
            return fail(
                StatusCode::UNPROCESSABLE_ENTITY,
                "A check-in cannot be both a visitor and on behalf of a member",
            );
        }
        (Some(info), None) => {
            if !claims.admin {
                return fail(
                    StatusCode::FORBIDDEN,
                    "Only admins may record visitor check-ins",
                );
            }
            (CheckInActor::Visitor { info }, CheckInMethod::Admin)
        }
        (None, Some(other)) => {
            if !claims.admin {
                return fail(
                    StatusCode::FORBIDDEN,
                    "Only admins may check in on behalf of another member",
                );
            }
            (
                CheckInActor::Member {
                    user_id: other.user_id,
                    user_name: other.user_name,
                },
                CheckInMethod::Admin,
            )
        }
        (None, None) => {
            let method = if body.kiosk {
                CheckInMethod::Qrcode
            } else {
                CheckInMethod::SelfCheckIn
            };
            (
                CheckInActor::Member {
                    user_id: claims.sub,
                    user_name: claims.name.clone(),
                },
                method,
            )
        }
    };

    match state
        .validator()
        .check_in(&body.code, actor, method, Utc::now())
        .await
    {
        Ok(record) => ok(
            StatusCode::OK,
            CheckInResponse::from(record),
            "Attendance recorded",
        ),
        Err(err) => service_error_response(err),
    }
}
