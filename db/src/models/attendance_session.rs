use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed set of recurring-event kinds a session can be opened for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "special")]
    Special,
    #[sea_orm(string_value = "retreat")]
    Retreat,
    #[sea_orm(string_value = "holiday")]
    Holiday,
    #[sea_orm(string_value = "outreach")]
    Outreach,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: Option<i64>,
    pub event_name: String,
    pub event_type: EventType,
    pub word_of_day: String,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
    pub attendance_count: i32,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Deactivation and natural expiry gate usability independently;
    /// neither alone is authoritative.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.active && now <= self.expires_at
    }
}
