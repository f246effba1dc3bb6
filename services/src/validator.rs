//! Check-in admission. Every rule that can accept or reject a check-in lives
//! here, in order, short-circuiting on the first failure:
//!
//! 1. decode            -> MalformedToken
//! 2. payload expiry    -> ExpiredToken   (authoritative, needs no session row)
//! 3. word of day       -> WordMismatch
//! 4. staleness bound   -> StaleToken     (optional, independent of expiry)
//! 5. session row gates -> SessionNotFound / SessionInactive
//! 6. prior attendance  -> DuplicateCheckIn (skipped for visitors)
//!
//! Steps 2-4 are pure and run before any storage access, so a payload stays
//! rejectable even when the issuing session record is unreachable. The final
//! insert relies on the store's unique index, so two racing check-ins for the
//! same (user, session) can never both succeed.

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::error::{is_unique_violation, CheckInRejection, ServiceError};
use crate::token_codec::{self, CheckInPayload};
use crate::word_of_day::word_of_day;
use db::models::attendance_record::{self, CheckInMethod};
use db::models::attendance_session;

pub use db::models::attendance_record::Model as AttendanceRecord;

/// Contact details for a check-in actor with no membership identity. Only
/// the name is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<String>,
}

/// Who is checking in. Members are deduplicated per session; visitors carry
/// no natural identity key and never are.
#[derive(Debug, Clone)]
pub enum CheckInActor {
    Member { user_id: i64, user_name: String },
    Visitor { info: VisitorInfo },
}

/// Inputs to the pure payload checks (steps 2-4).
#[derive(Debug, Clone)]
pub struct Admission<'a> {
    /// Word computed fresh by the validating party for today, not trusted
    /// from the payload.
    pub current_word: &'a str,
    pub now: DateTime<Utc>,
    /// None disables the staleness bound.
    pub max_token_age: Option<Duration>,
}

/// Steps 2-4: pure, no I/O, never blocks.
pub fn decide(payload: &CheckInPayload, adm: &Admission) -> Result<(), CheckInRejection> {
    if adm.now > payload.expires_at {
        return Err(CheckInRejection::ExpiredToken);
    }
    if payload.word_of_day != adm.current_word {
        return Err(CheckInRejection::WordMismatch);
    }
    if let Some(max_age) = adm.max_token_age {
        if adm.now - payload.issued_at > max_age {
            return Err(CheckInRejection::StaleToken);
        }
    }
    Ok(())
}

/// Step 6 for a known prior-attendance answer: pure counterpart of the
/// storage lookup, exhaustively testable.
pub fn admit_actor(actor: &CheckInActor, prior_attendance: bool) -> Result<(), CheckInRejection> {
    match actor {
        CheckInActor::Visitor { info } => {
            if info.name.trim().is_empty() {
                return Err(CheckInRejection::MissingVisitorName);
            }
            Ok(())
        }
        CheckInActor::Member { .. } if prior_attendance => Err(CheckInRejection::DuplicateCheckIn),
        CheckInActor::Member { .. } => Ok(()),
    }
}

/// Validates scanned codes and persists accepted records. Holds an injected
/// storage handle; one instance per process is fine, as is one per request.
#[derive(Clone)]
pub struct CheckInValidator {
    db: DatabaseConnection,
    secret: String,
    max_token_age: Option<Duration>,
}

impl CheckInValidator {
    pub fn new(
        db: DatabaseConnection,
        secret: impl Into<String>,
        max_token_age: Option<Duration>,
    ) -> Self {
        Self {
            db,
            secret: secret.into(),
            max_token_age,
        }
    }

    /// Full pipeline for a raw scanned code.
    pub async fn check_in(
        &self,
        raw_code: &str,
        actor: CheckInActor,
        method: CheckInMethod,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, ServiceError> {
        let payload = token_codec::decode(raw_code)?;
        self.check_in_payload(&payload, actor, method, now, None).await
    }

    /// Pipeline for an already-decoded payload. `local_id` tags
    /// offline-origin records with their idempotency key.
    pub async fn check_in_payload(
        &self,
        payload: &CheckInPayload,
        actor: CheckInActor,
        method: CheckInMethod,
        now: DateTime<Utc>,
        local_id: Option<String>,
    ) -> Result<AttendanceRecord, ServiceError> {
        let current_word = word_of_day(now.date_naive(), &self.secret);
        decide(
            payload,
            &Admission {
                current_word,
                now,
                max_token_age: self.max_token_age,
            },
        )?;

        let session = attendance_session::Entity::find_by_id(payload.session_id)
            .one(&self.db)
            .await?
            .ok_or(CheckInRejection::SessionNotFound)?;
        if !session.active {
            return Err(CheckInRejection::SessionInactive.into());
        }

        self.admit_and_persist(session.id, actor, method, now, local_id)
            .await
    }

    /// Pipeline for a synthetic offline token, which carries no word or
    /// expiry of its own: the session's window is checked against the time
    /// the user actually checked in, not the sync time.
    pub async fn check_in_offline(
        &self,
        session_id: Option<i64>,
        actor: CheckInActor,
        check_in_time: DateTime<Utc>,
        local_id: Option<String>,
    ) -> Result<AttendanceRecord, ServiceError> {
        let session_id = session_id.ok_or(CheckInRejection::SessionNotFound)?;
        let session = attendance_session::Entity::find_by_id(session_id)
            .one(&self.db)
            .await?
            .ok_or(CheckInRejection::SessionNotFound)?;
        if check_in_time > session.expires_at {
            return Err(CheckInRejection::ExpiredToken.into());
        }
        if !session.active {
            return Err(CheckInRejection::SessionInactive.into());
        }

        self.admit_and_persist(session.id, actor, CheckInMethod::Offline, check_in_time, local_id)
            .await
    }

    async fn admit_and_persist(
        &self,
        session_id: i64,
        actor: CheckInActor,
        method: CheckInMethod,
        check_in_time: DateTime<Utc>,
        local_id: Option<String>,
    ) -> Result<AttendanceRecord, ServiceError> {
        let prior = match &actor {
            CheckInActor::Member { user_id, .. } => {
                self.prior_attendance(*user_id, session_id).await?
            }
            CheckInActor::Visitor { .. } => false,
        };
        admit_actor(&actor, prior)?;

        let (user_id, user_name, is_visitor, visitor_info) = match actor {
            CheckInActor::Member { user_id, user_name } => (Some(user_id), user_name, false, None),
            CheckInActor::Visitor { info } => {
                let name = info.name.clone();
                let json = serde_json::to_value(&info).expect("visitor info serializes");
                (None, name, true, Some(json))
            }
        };

        let draft = attendance_record::ActiveModel {
            session_id: Set(session_id),
            user_id: Set(user_id),
            user_name: Set(user_name),
            check_in_time: Set(check_in_time),
            check_in_method: Set(method),
            is_visitor: Set(is_visitor),
            visitor_info: Set(visitor_info),
            local_id: Set(local_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        // The lookup above gives the friendly rejection; the unique index
        // closes the race between the lookup and this insert.
        let record = draft.insert(&self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                ServiceError::Rejected(CheckInRejection::DuplicateCheckIn)
            } else {
                ServiceError::Db(err)
            }
        })?;

        // Informational counter, monotonically non-decreasing.
        attendance_session::Entity::update_many()
            .col_expr(
                attendance_session::Column::AttendanceCount,
                Expr::col(attendance_session::Column::AttendanceCount).add(1),
            )
            .filter(attendance_session::Column::Id.eq(session_id))
            .exec(&self.db)
            .await?;

        Ok(record)
    }

    async fn prior_attendance(&self, user_id: i64, session_id: i64) -> Result<bool, ServiceError> {
        let existing = attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .filter(attendance_record::Column::UserId.eq(user_id))
            .filter(attendance_record::Column::IsVisitor.eq(false))
            .one(&self.db)
            .await?;
        Ok(existing.is_some())
    }
}
