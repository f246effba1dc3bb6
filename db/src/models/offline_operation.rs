use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A locally queued intent to create an attendance record, held until the
/// reconciler confirms durable persistence.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "offline_operations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub local_id: String,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub session_id: Option<i64>,
    pub event_name: String,
    /// When the user actually checked in, not when the sync ran.
    pub check_in_time: DateTime<Utc>,
    /// The original encoded code, or the prefix-less synthetic offline token.
    pub payload: String,
    pub queued_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
