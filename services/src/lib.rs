//! Attendance verification core: token codec, word-of-day derivation,
//! session management, check-in admission, offline queueing, and sync
//! reconciliation. Everything here is storage-technology-agnostic beyond a
//! SeaORM connection handle injected by the caller.

pub mod error;
pub mod offline_queue;
pub mod reconciler;
pub mod session;
pub mod token_codec;
pub mod validator;
pub mod word_of_day;

pub use error::{CheckInRejection, ServiceError};
pub use reconciler::SyncSummary;
