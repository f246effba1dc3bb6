//! Durable ordered log of check-in intents created while disconnected. The
//! queue is a dumb store: no validation, no deduplication — semantic
//! correctness lives in the reconciler.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::error::{is_unique_violation, ServiceError};
use db::models::offline_operation::{ActiveModel, Column, Entity, Model};

pub use db::models::offline_operation::Model as OfflineOperation;

#[derive(Debug, Clone)]
pub struct EnqueueOperation {
    /// Idempotency key; assigned here when the client didn't supply one.
    pub local_id: Option<String>,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub session_id: Option<i64>,
    pub event_name: String,
    /// When the user actually checked in, not when the sync ran.
    pub check_in_time: DateTime<Utc>,
    /// The original encoded code or synthetic offline token.
    pub payload: String,
}

#[derive(Clone)]
pub struct OfflineQueue {
    db: DatabaseConnection,
}

impl OfflineQueue {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an operation. Re-posting an already-queued `local_id` is a
    /// client retry: the first queued row wins and is returned unchanged.
    pub async fn enqueue(&self, op: EnqueueOperation) -> Result<Model, ServiceError> {
        let local_id = op
            .local_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let inserted = ActiveModel {
            local_id: Set(local_id.clone()),
            user_id: Set(op.user_id),
            user_name: Set(op.user_name),
            session_id: Set(op.session_id),
            event_name: Set(op.event_name),
            check_in_time: Set(op.check_in_time),
            payload: Set(op.payload),
            queued_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(row) => Ok(row),
            Err(err) if is_unique_violation(&err) => {
                let existing = Entity::find_by_id(&local_id).one(&self.db).await?;
                existing.ok_or(ServiceError::Db(err))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Non-destructive ordered read; insertion order is the retry order.
    pub async fn drain(&self) -> Result<Vec<Model>, ServiceError> {
        Ok(Entity::find()
            .order_by_asc(Column::QueuedAt)
            .order_by_asc(Column::LocalId)
            .all(&self.db)
            .await?)
    }

    /// Deletes one operation once the reconciler has confirmed durable
    /// persistence. Removing an unknown id is a no-op.
    pub async fn remove(&self, local_id: &str) -> Result<(), ServiceError> {
        Entity::delete_by_id(local_id).exec(&self.db).await?;
        Ok(())
    }
}
