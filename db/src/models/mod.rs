pub mod attendance_record;
pub mod attendance_session;
pub mod offline_operation;
