//! Session manager: opens, reissues codes for, and closes the time-boxed
//! windows during which check-ins for one event instance are accepted.
//! Sessions are never deleted; history is kept for audit.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::error::{CheckInRejection, ServiceError};
use crate::token_codec::CheckInPayload;
use crate::word_of_day::word_of_day;
use db::models::attendance_record;
use db::models::attendance_session::{ActiveModel, Column, Entity, EventType, Model};

pub use db::models::attendance_session::Model as AttendanceSession;

#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub event_name: String,
    pub event_type: EventType,
    pub duration_minutes: i64,
    /// Optional reference to an external event record.
    pub event_id: Option<i64>,
    pub created_by: i64,
}

/// Holds an injected storage handle; never constructs its own connection, so
/// any number of instances may share one underlying store.
#[derive(Clone)]
pub struct AttendanceSessionService {
    db: DatabaseConnection,
    secret: String,
}

impl AttendanceSessionService {
    pub fn new(db: DatabaseConnection, secret: impl Into<String>) -> Self {
        Self {
            db,
            secret: secret.into(),
        }
    }

    /// Opens a session and mints its paired check-in payload. The payload's
    /// expiry equals the session's expiry at mint time.
    pub async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<(Model, CheckInPayload), ServiceError> {
        self.create_session_at(params, Utc::now()).await
    }

    /// Clock-injected variant used by tests and backdated admin tooling.
    pub async fn create_session_at(
        &self,
        params: CreateSessionParams,
        now: DateTime<Utc>,
    ) -> Result<(Model, CheckInPayload), ServiceError> {
        if params.duration_minutes <= 0 {
            return Err(CheckInRejection::InvalidDuration.into());
        }

        let word = word_of_day(now.date_naive(), &self.secret);
        let expires_at = now + Duration::minutes(params.duration_minutes);

        let session = ActiveModel {
            event_id: Set(params.event_id),
            event_name: Set(params.event_name),
            event_type: Set(params.event_type),
            word_of_day: Set(word.to_owned()),
            generated_at: Set(now),
            expires_at: Set(expires_at),
            active: Set(true),
            attendance_count: Set(0),
            created_by: Set(params.created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        let payload = mint_payload(&session, now);
        Ok((session, payload))
    }

    /// Re-issues a fresh payload (new `issued_token`) for a still-usable
    /// session, e.g. to re-render the code on a second screen.
    pub async fn reissue_code(
        &self,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CheckInPayload, ServiceError> {
        let session = self
            .get_session(session_id)
            .await?
            .ok_or(CheckInRejection::SessionNotFound)?;
        if !session.active {
            return Err(CheckInRejection::SessionInactive.into());
        }
        if now > session.expires_at {
            return Err(CheckInRejection::ExpiredToken.into());
        }
        Ok(mint_payload(&session, now))
    }

    /// Force-closes a session before natural expiry. Idempotent: closing a
    /// closed session is not an error.
    pub async fn deactivate_session(&self, session_id: i64) -> Result<Model, ServiceError> {
        let session = self
            .get_session(session_id)
            .await?
            .ok_or(CheckInRejection::SessionNotFound)?;
        if !session.active {
            return Ok(session);
        }

        let mut active: ActiveModel = session.into();
        active.active = Set(false);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    pub async fn get_session(&self, session_id: i64) -> Result<Option<Model>, ServiceError> {
        Ok(Entity::find_by_id(session_id).one(&self.db).await?)
    }

    pub async fn list_sessions(&self) -> Result<Vec<Model>, ServiceError> {
        Ok(Entity::find()
            .order_by_desc(Column::GeneratedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn session_records(
        &self,
        session_id: i64,
    ) -> Result<Vec<attendance_record::Model>, ServiceError> {
        Ok(attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .order_by_asc(attendance_record::Column::CheckInTime)
            .all(&self.db)
            .await?)
    }
}

/// Fresh payload for a session: random token, session's own expiry.
pub fn mint_payload(session: &Model, now: DateTime<Utc>) -> CheckInPayload {
    CheckInPayload {
        session_id: session.id,
        event_name: session.event_name.clone(),
        event_type: session.event_type,
        word_of_day: session.word_of_day.clone(),
        issued_token: fresh_token(),
        issued_at: now,
        expires_at: session.expires_at,
    }
}

fn fresh_token() -> String {
    let mut buf = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
