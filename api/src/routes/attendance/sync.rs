use axum::{extract::State, http::StatusCode, response::Response, Extension, Json};

use crate::auth::AuthUser;
use crate::state::AppState;
use services::offline_queue::EnqueueOperation;

use super::common::{fail, ok, service_error_response, SyncReq, SyncResponse};

/// POST /api/attendance/sync
///
/// Accepts a device's queued offline check-ins, appends them to the server
/// queue, then runs one reconciliation pass over the whole queue. Operations
/// that fail validation stay queued and are reported in the `failed` count.
///
/// The same admission rules as the live check-in path apply: a non-admin
/// caller may only sync their own attendance, so operations naming another
/// member or a visitor reject the whole batch with 403 before anything is
/// queued.
pub async fn sync_offline(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<SyncReq>,
) -> Response {
    if !claims.admin {
        let foreign = body.operations.iter().any(|op| {
            op.visitor || op.user_id.is_some_and(|user_id| user_id != claims.sub)
        });
        if foreign {
            return fail(
                StatusCode::FORBIDDEN,
                "Only admins may sync check-ins for other members or visitors",
            );
        }
    }

    for op in body.operations {
        let user_id = if op.visitor {
            None
        } else {
            Some(op.user_id.unwrap_or(claims.sub))
        };
        let enqueue = EnqueueOperation {
            local_id: op.local_id,
            user_id,
            user_name: op.user_name.unwrap_or_else(|| claims.name.clone()),
            session_id: op.session_id,
            event_name: op.event_name,
            check_in_time: op.check_in_time,
            payload: op.payload,
        };
        if let Err(err) = state.queue().enqueue(enqueue).await {
            return service_error_response(err);
        }
    }

    match state.reconciler().reconcile().await {
        Ok(summary) => ok(
            StatusCode::OK,
            SyncResponse::from(summary),
            "Offline operations reconciled",
        ),
        Err(err) => service_error_response(err),
    }
}
