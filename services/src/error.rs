use sea_orm::DbErr;
use thiserror::Error;

/// Expected business outcomes of a check-in attempt. These are returned,
/// never raised: the caller maps them to user-facing feedback. Display
/// strings are the actionable reason shown to the person scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckInRejection {
    #[error("This is not a valid check-in code")]
    MalformedToken,
    #[error("This code has expired")]
    ExpiredToken,
    #[error("This code was issued too long ago, please scan a fresh one")]
    StaleToken,
    #[error("The word of the day does not match")]
    WordMismatch,
    #[error("Already checked in for this session")]
    DuplicateCheckIn,
    #[error("This check-in session has been closed")]
    SessionInactive,
    #[error("Check-in session not found")]
    SessionNotFound,
    #[error("Visitor check-ins must include a name")]
    MissingVisitorName,
    #[error("Session duration must be at least one minute")]
    InvalidDuration,
}

/// Splits expected rejections from infrastructure failures. Only the latter
/// should surface as 5xx to a caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Rejected(#[from] CheckInRejection),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl ServiceError {
    pub fn rejection(&self) -> Option<CheckInRejection> {
        match self {
            ServiceError::Rejected(r) => Some(*r),
            ServiceError::Db(_) => None,
        }
    }
}

/// SQLite reports constraint conflicts inside the error text; SeaORM does
/// not expose a typed variant for them on the sqlx backend.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("UNIQUE constraint failed") || msg.contains("unique constraint")
}
