//! Application state shared across route handlers.
//!
//! Service values are constructed once at process start and passed by
//! reference into handlers via Axum's `State` extractor — no implicitly
//! shared singletons. Each service holds a clone of the one underlying
//! connection pool, which governs its own write-conflict resolution.

use chrono::Duration;
use sea_orm::DatabaseConnection;
use services::offline_queue::OfflineQueue;
use services::reconciler::SyncReconciler;
use services::session::AttendanceSessionService;
use services::validator::CheckInValidator;

#[derive(Clone)]
pub struct AppState {
    sessions: AttendanceSessionService,
    validator: CheckInValidator,
    queue: OfflineQueue,
    reconciler: SyncReconciler,
}

impl AppState {
    /// Wires every service to the given connection. `token_max_age_minutes`
    /// of 0 disables the staleness bound.
    pub fn new(db: DatabaseConnection, attendance_secret: &str, token_max_age_minutes: i64) -> Self {
        let max_age = match token_max_age_minutes {
            n if n > 0 => Some(Duration::minutes(n)),
            _ => None,
        };

        let sessions = AttendanceSessionService::new(db.clone(), attendance_secret);
        let validator = CheckInValidator::new(db.clone(), attendance_secret, max_age);
        let queue = OfflineQueue::new(db.clone());
        let reconciler = SyncReconciler::new(db, queue.clone(), validator.clone());

        Self {
            sessions,
            validator,
            queue,
            reconciler,
        }
    }

    pub fn sessions(&self) -> &AttendanceSessionService {
        &self.sessions
    }

    pub fn validator(&self) -> &CheckInValidator {
        &self.validator
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    pub fn reconciler(&self) -> &SyncReconciler {
        &self.reconciler
    }
}
