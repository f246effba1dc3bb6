//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness check (public)
//! - `/attendance` → session management, check-in, and offline sync
//!   (authenticated; session management is admin-only per route)

use crate::auth::guards::allow_authenticated;
use crate::routes::{attendance::attendance_routes, health::health_routes};
use crate::state::AppState;
use axum::{middleware::from_fn, Router};

pub mod attendance;
pub mod health;

pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
