//! Replays queued offline operations against the canonical store, merging
//! each exactly once. A record already persisted under an operation's
//! `local_id` is skipped; a rejected or erroring operation stays queued for a
//! later pass and never blocks the rest of the batch.

use log::{error, warn};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::error::ServiceError;
use crate::offline_queue::{OfflineOperation, OfflineQueue};
use crate::token_codec::{self, ScannedToken};
use crate::validator::{CheckInActor, CheckInValidator, VisitorInfo};
use db::models::attendance_record;

/// Outcome counts for one reconciliation pass. Partial failure is reported
/// here, never raised.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub synced: u32,
    pub skipped: u32,
    pub failed: u32,
}

enum Replay {
    Synced,
    Skipped,
}

#[derive(Clone)]
pub struct SyncReconciler {
    db: DatabaseConnection,
    queue: OfflineQueue,
    validator: CheckInValidator,
}

impl SyncReconciler {
    pub fn new(db: DatabaseConnection, queue: OfflineQueue, validator: CheckInValidator) -> Self {
        Self {
            db,
            queue,
            validator,
        }
    }

    /// Processes the whole queue in enqueue order and returns the summary.
    /// Only a catastrophic failure (the store unreachable while draining)
    /// returns `Err`.
    pub async fn reconcile(&self) -> Result<SyncSummary, ServiceError> {
        let ops = self.queue.drain().await?;

        let mut summary = SyncSummary::default();
        for op in ops {
            match self.replay(&op).await {
                Ok(Replay::Synced) => summary.synced += 1,
                Ok(Replay::Skipped) => summary.skipped += 1,
                Err(ServiceError::Rejected(reason)) => {
                    warn!("offline op {} rejected, left queued: {reason}", op.local_id);
                    summary.failed += 1;
                }
                Err(ServiceError::Db(err)) => {
                    error!("offline op {} hit storage error, left queued: {err}", op.local_id);
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn replay(&self, op: &OfflineOperation) -> Result<Replay, ServiceError> {
        // Already persisted under this idempotency key: a previous pass (or
        // another device) got the record in but the queue entry survived.
        let already = attendance_record::Entity::find()
            .filter(attendance_record::Column::LocalId.eq(op.local_id.as_str()))
            .one(&self.db)
            .await?;
        if already.is_some() {
            self.queue.remove(&op.local_id).await?;
            return Ok(Replay::Skipped);
        }

        let actor = match op.user_id {
            Some(user_id) => CheckInActor::Member {
                user_id,
                user_name: op.user_name.clone(),
            },
            None => CheckInActor::Visitor {
                info: VisitorInfo {
                    name: op.user_name.clone(),
                    phone: None,
                    email: None,
                    invited_by: None,
                },
            },
        };

        // Full validation, with the operation's own check-in time as "now".
        match token_codec::decode_any(&op.payload)? {
            ScannedToken::Session(payload) => {
                self.validator
                    .check_in_payload(
                        &payload,
                        actor,
                        attendance_record::CheckInMethod::Offline,
                        op.check_in_time,
                        Some(op.local_id.clone()),
                    )
                    .await?
            }
            ScannedToken::Offline(_) => {
                self.validator
                    .check_in_offline(
                        op.session_id,
                        actor,
                        op.check_in_time,
                        Some(op.local_id.clone()),
                    )
                    .await?
            }
        };

        self.queue.remove(&op.local_id).await?;
        Ok(Replay::Synced)
    }
}
