use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::attendance_record;
use db::models::attendance_session::{self, EventType};
use services::validator::VisitorInfo;
use services::{CheckInRejection, ServiceError, SyncSummary};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionReq {
    #[validate(length(min = 1, max = 200, message = "event_name must be 1-200 characters"))]
    pub event_name: String,
    pub event_type: EventType,
    pub duration_minutes: i64,
    pub event_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub event_id: Option<i64>,
    pub event_name: String,
    pub event_type: EventType,
    pub word_of_day: String,
    pub generated_at: String,
    pub expires_at: String,
    pub active: bool,
    pub attendance_count: i32,
    /// Encoded scannable code; present on creation and code reissue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl SessionResponse {
    pub fn from_model(m: attendance_session::Model, code: Option<String>) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            event_name: m.event_name,
            event_type: m.event_type,
            word_of_day: m.word_of_day,
            generated_at: m.generated_at.to_rfc3339(),
            expires_at: m.expires_at.to_rfc3339(),
            active: m.active,
            attendance_count: m.attendance_count,
            code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckInReq {
    pub code: String,
    /// Present when a greeter records a walk-in visitor; skips deduplication.
    pub visitor: Option<VisitorInfo>,
    /// Admin-only: record attendance for another member.
    pub on_behalf_of: Option<OnBehalfOf>,
    /// Set when the scan came from a shared kiosk device rather than the
    /// member's own phone.
    #[serde(default)]
    pub kiosk: bool,
}

#[derive(Debug, Deserialize)]
pub struct OnBehalfOf {
    pub user_id: i64,
    pub user_name: String,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub record_id: i64,
    pub session_id: i64,
    pub user_name: String,
    pub check_in_time: String,
    pub check_in_method: attendance_record::CheckInMethod,
    pub is_visitor: bool,
}

impl From<attendance_record::Model> for CheckInResponse {
    fn from(m: attendance_record::Model) -> Self {
        Self {
            record_id: m.id,
            session_id: m.session_id,
            user_name: m.user_name,
            check_in_time: m.check_in_time.to_rfc3339(),
            check_in_method: m.check_in_method,
            is_visitor: m.is_visitor,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncReq {
    pub operations: Vec<SyncOperationReq>,
}

#[derive(Debug, Deserialize)]
pub struct SyncOperationReq {
    pub local_id: Option<String>,
    /// Defaults to the caller; ignored for visitor operations.
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    #[serde(default)]
    pub visitor: bool,
    pub session_id: Option<i64>,
    pub event_name: String,
    pub check_in_time: chrono::DateTime<chrono::Utc>,
    pub payload: String,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub synced: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl From<SyncSummary> for SyncResponse {
    fn from(s: SyncSummary) -> Self {
        Self {
            synced: s.synced,
            skipped: s.skipped,
            failed: s.failed,
        }
    }
}

// ---- response plumbing ----

pub fn ok<T: Serialize>(status: StatusCode, data: T, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::success(data, message))).into_response()
}

pub fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<Empty>::error(message))).into_response()
}

/// Expected rejections map to specific 4xx statuses; anything else is an
/// infrastructure failure.
pub fn rejection_status(rejection: CheckInRejection) -> StatusCode {
    match rejection {
        CheckInRejection::DuplicateCheckIn => StatusCode::CONFLICT,
        CheckInRejection::SessionNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    }
}

pub fn service_error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Rejected(rejection) => fail(rejection_status(rejection), rejection.to_string()),
        ServiceError::Db(db_err) => {
            tracing::error!(error = %db_err, "storage failure during attendance operation");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
