use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{ArrayType, Nullable, ValueType, ValueTypeErr};
use sea_orm::{ColIdx, TryGetError, TryGetable};
use serde::{Deserialize, Serialize};

/// How a check-in reached the store. The stored value `"self"` is a Rust
/// keyword, which `DeriveActiveEnum` cannot generate an identifier for, so
/// the `ActiveEnum` machinery is written out by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Serialize, Deserialize)]
pub enum CheckInMethod {
    #[serde(rename = "qrcode")]
    Qrcode,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "self")]
    SelfCheckIn,
    #[serde(rename = "offline")]
    Offline,
}

#[derive(Debug, DeriveIden)]
pub struct CheckInMethodEnum;

impl ActiveEnum for CheckInMethod {
    type Value = String;
    type ValueVec = Vec<String>;

    fn name() -> DynIden {
        SeaRc::new(CheckInMethodEnum)
    }

    fn to_value(&self) -> Self::Value {
        match self {
            Self::Qrcode => "qrcode",
            Self::Admin => "admin",
            Self::SelfCheckIn => "self",
            Self::Offline => "offline",
        }
        .to_owned()
    }

    fn try_from_value(v: &Self::Value) -> Result<Self, DbErr> {
        match v.as_str() {
            "qrcode" => Ok(Self::Qrcode),
            "admin" => Ok(Self::Admin),
            "self" => Ok(Self::SelfCheckIn),
            "offline" => Ok(Self::Offline),
            _ => Err(DbErr::Type(format!(
                "unexpected value for CheckInMethod enum: {v}"
            ))),
        }
    }

    fn db_type() -> ColumnDef {
        ColumnType::String(StringLen::N(16)).def()
    }
}

impl From<CheckInMethod> for Value {
    fn from(method: CheckInMethod) -> Self {
        method.to_value().into()
    }
}

impl TryGetable for CheckInMethod {
    fn try_get_by<I: ColIdx>(res: &QueryResult, idx: I) -> Result<Self, TryGetError> {
        let value = String::try_get_by(res, idx)?;
        Self::try_from_value(&value).map_err(TryGetError::DbErr)
    }
}

impl ValueType for CheckInMethod {
    fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
        let value = <String as ValueType>::try_from(v)?;
        Self::try_from_value(&value).map_err(|_| ValueTypeErr)
    }

    fn type_name() -> String {
        <String as ValueType>::type_name()
    }

    fn array_type() -> ArrayType {
        <String as ValueType>::array_type()
    }

    fn column_type() -> sea_orm::sea_query::ColumnType {
        Self::db_type().get_column_type().to_owned()
    }
}

impl Nullable for CheckInMethod {
    fn null() -> Value {
        <String as Nullable>::null()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: i64,
    /// NULL for visitors. The (session_id, user_id) unique index never
    /// collides on NULL, so visitors are not deduplicated.
    pub user_id: Option<i64>,
    pub user_name: String,
    pub check_in_time: DateTime<Utc>,
    pub check_in_method: CheckInMethod,
    pub is_visitor: bool,
    pub visitor_info: Option<Json>,
    /// Client-generated idempotency key for offline-origin records.
    pub local_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}
