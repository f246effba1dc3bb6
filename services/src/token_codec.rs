//! Wire codec for the scannable check-in payload.
//!
//! Format (bit-exact): `"FC-ATTEND:" + base64(JSON({ sessionId, eventName,
//! eventType, wordOfDay, issuedToken, issuedAt, expiresAt }))` with RFC 3339
//! timestamps. Decoding is total: any input that is not a well-formed token
//! yields `MalformedToken`, never a panic.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CheckInRejection;
use db::models::attendance_session::EventType;

pub const TOKEN_PREFIX: &str = "FC-ATTEND:";

/// The value embedded in the scannable code; immutable once minted.
/// `expires_at` equals the session's expiry at mint time and never diverges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInPayload {
    pub session_id: i64,
    pub event_name: String,
    pub event_type: EventType,
    pub word_of_day: String,
    /// Identifies this specific code instance, not the user.
    pub issued_token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Synthetic payload recorded when a manual offline check-in happens without
/// a scannable code. Carries no prefix on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineToken {
    pub user_id: i64,
    pub event_name: String,
    pub timestamp: DateTime<Utc>,
    pub offline: bool,
    pub issued_token: String,
}

/// Both wire shapes the reconciler must recognize.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannedToken {
    Session(CheckInPayload),
    Offline(OfflineToken),
}

pub fn encode(payload: &CheckInPayload) -> String {
    let json = serde_json::to_vec(payload).expect("payload serializes");
    format!("{}{}", TOKEN_PREFIX, BASE64.encode(json))
}

pub fn encode_offline(token: &OfflineToken) -> String {
    let json = serde_json::to_vec(token).expect("offline token serializes");
    BASE64.encode(json)
}

/// Decodes a scanned code. Input without the `FC-ATTEND:` prefix is rejected
/// outright.
pub fn decode(raw: &str) -> Result<CheckInPayload, CheckInRejection> {
    let encoded = raw
        .trim()
        .strip_prefix(TOKEN_PREFIX)
        .ok_or(CheckInRejection::MalformedToken)?;
    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| CheckInRejection::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| CheckInRejection::MalformedToken)
}

/// Decodes either wire shape: a prefixed session payload or the prefix-less
/// offline synthetic token (which must carry `"offline": true`).
pub fn decode_any(raw: &str) -> Result<ScannedToken, CheckInRejection> {
    let raw = raw.trim();
    if raw.starts_with(TOKEN_PREFIX) {
        return decode(raw).map(ScannedToken::Session);
    }
    let bytes = BASE64
        .decode(raw)
        .map_err(|_| CheckInRejection::MalformedToken)?;
    let token: OfflineToken =
        serde_json::from_slice(&bytes).map_err(|_| CheckInRejection::MalformedToken)?;
    if !token.offline {
        return Err(CheckInRejection::MalformedToken);
    }
    Ok(ScannedToken::Offline(token))
}
