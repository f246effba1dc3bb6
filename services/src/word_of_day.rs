//! Deterministic daily shared secret. Issuer and validator agree on the word
//! without synchronization as long as they share the secret and the calendar
//! day (not time-of-day).

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Fixed ordered candidate list. Appending is safe; reordering or removing
/// entries changes every derived word.
pub const WORDS: &[&str] = &[
    "FAITH", "HOPE", "GRACE", "MERCY", "PEACE", "JOY", "LIGHT", "TRUTH", "SPIRIT", "GLORY",
    "PRAISE", "SHEPHERD", "COVENANT", "JUBILEE", "BELOVED", "REDEEMER",
];

/// Hashes `"<YYYY-MM-DD><secret>"` and indexes the word list by the first
/// eight digest bytes.
pub fn word_of_day(date: NaiveDate, secret: &str) -> &'static str {
    let mut hasher = Sha256::new();
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(secret.as_bytes());
    let digest = hasher.finalize();

    let n = u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ]);
    WORDS[(n % WORDS.len() as u64) as usize]
}
