//! Ensure only one calsync process works on a calendar directory.

use std::fs::{File, OpenOptions};
use std::io::Write;

use anyhow::{Context, Result};
use calsync_core::Paths;
use fs2::FileExt;

/// Holds the PID file lock until dropped.
pub struct PidLock {
    _file: File,
}

/// Lock `<base>/.work/PID` and record our PID in it.
///
/// Fails if another instance holds the lock. A PID file left behind by a
/// crashed process carries no lock and is simply taken over.
pub fn acquire(paths: &Paths) -> Result<PidLock> {
    let path = paths.pid_file();
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .context("Failed to open PID file")?;

    file.try_lock_exclusive().map_err(|_| {
        anyhow::anyhow!(
            "Another calsync instance is already running.\n\
            If you believe this is an error, remove: {}",
            path.display()
        )
    })?;

    // Only truncate once we own the lock, or we'd wipe the running instance's PID.
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    file.sync_all()?;

    Ok(PidLock { _file: file })
}
