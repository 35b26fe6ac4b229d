//! Error types for calsync.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration or syncing a calendar.
///
/// "Not found", "no change" and "too soon" are not errors; they are
/// [`SyncOutcome`](crate::SyncOutcome) values.
#[derive(Error, Debug)]
pub enum CalSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown calendar: {0}")]
    UnknownResource(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} failed with status {status}")]
    HttpStatus {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CalSyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CalSyncError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;
