use std::fmt;

/// Result of one successful sync attempt.
///
/// Failures are reported as [`CalSyncError`](crate::CalSyncError) instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The change was propagated.
    Ok,
    /// Content is identical to the last snapshot.
    NoChange,
    /// The calendar is missing, or the server sent something that isn't one.
    NotFound,
    /// The debounce floor has not elapsed yet. Never shown to the user.
    TooSoon,
}

impl SyncOutcome {
    /// Whether this outcome is ever surfaced as a user notification.
    pub fn is_reportable(self) -> bool {
        matches!(self, SyncOutcome::Ok | SyncOutcome::NotFound)
    }

    /// Human-readable text used in notifications.
    pub fn message(self) -> String {
        match self {
            SyncOutcome::Ok => "OK".to_string(),
            SyncOutcome::NotFound => "not found".to_string(),
            other => format!("status {}", other.code()),
        }
    }

    fn code(self) -> u8 {
        match self {
            SyncOutcome::Ok => 0,
            SyncOutcome::NoChange => 1,
            SyncOutcome::NotFound => 2,
            SyncOutcome::TooSoon => 3,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            SyncOutcome::Ok => "OK",
            SyncOutcome::NoChange => "NOCHANGE",
            SyncOutcome::NotFound => "NOTFOUND",
            SyncOutcome::TooSoon => "TOOSOON",
        };
        write!(f, "{}", s)
    }
}
