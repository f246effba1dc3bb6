pub mod m202608250001_create_attendance_sessions;
pub mod m202608250002_create_attendance_records;
pub mod m202608250003_create_offline_operations;
