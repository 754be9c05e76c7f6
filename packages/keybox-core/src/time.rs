/// Clock utilities.
///
/// One-time-code verification and storage timestamps both key off the
/// current unix time; tests inject fixed timestamps instead of calling
/// these helpers.

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Returns the current time formatted for backup metadata
/// (`YYYY-MM-DD HH:MM:SS`, UTC).
pub fn now_display() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
