//! Per-calendar on-disk state.
//!
//! Each calendar owns a scratch directory under the work dir:
//!
//! ```text
//! ~/.calsync/
//!     home.ics            <- current (the live calendar file)
//!     .work/home.d/
//!         last            <- snapshot of the payload last synced (read-only)
//!         temp            <- staging file
//!         log             <- latest request/response trace
//! ```
//!
//! Every write goes through `temp`: written, fsynced, then renamed into place,
//! so readers never see a half-written calendar.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::error::{CalSyncError, CalSyncResult};
use crate::fingerprint::{Fingerprint, fingerprint_file};

const LAST_FILE: &str = "last";
const TEMP_FILE: &str = "temp";
const LOG_FILE: &str = "log";

#[derive(Debug)]
pub struct ResourceStore {
    current: PathBuf,
    scratch: PathBuf,
}

impl ResourceStore {
    /// Open the store, creating the scratch directory if it doesn't exist.
    pub fn open(current: PathBuf, scratch: PathBuf) -> CalSyncResult<Self> {
        fs::create_dir_all(&scratch).map_err(|e| CalSyncError::io(&scratch, e))?;
        Ok(ResourceStore { current, scratch })
    }

    pub fn current_path(&self) -> &Path {
        &self.current
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch
    }

    pub fn last_synced_path(&self) -> PathBuf {
        self.scratch.join(LAST_FILE)
    }

    pub fn temp_path(&self) -> PathBuf {
        self.scratch.join(TEMP_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.scratch.join(LOG_FILE)
    }

    // READING:

    pub fn current_exists(&self) -> bool {
        self.current.exists()
    }

    pub fn last_synced_exists(&self) -> bool {
        self.last_synced_path().exists()
    }

    pub fn read_current(&self) -> CalSyncResult<Option<Vec<u8>>> {
        read_optional(&self.current)
    }

    pub fn read_last_synced(&self) -> CalSyncResult<Option<Vec<u8>>> {
        read_optional(&self.last_synced_path())
    }

    pub fn current_fingerprint(&self) -> CalSyncResult<Option<Fingerprint>> {
        fingerprint_file(&self.current).map_err(|e| CalSyncError::io(&self.current, e))
    }

    pub fn last_synced_fingerprint(&self) -> CalSyncResult<Option<Fingerprint>> {
        let last = self.last_synced_path();
        fingerprint_file(&last).map_err(|e| CalSyncError::io(&last, e))
    }

    pub fn current_mtime(&self) -> CalSyncResult<DateTime<Utc>> {
        mod_time_of(&self.current)
    }

    pub fn last_synced_mtime(&self) -> CalSyncResult<DateTime<Utc>> {
        mod_time_of(&self.last_synced_path())
    }

    // STAGING:

    /// Write `data` to the temp file, fsync it and make it read-only.
    pub fn stage_bytes(&self, data: &[u8]) -> CalSyncResult<()> {
        let temp = self.temp_path();
        drop(self.write_temp(data)?);
        set_read_only(&temp)
    }

    /// Copy the current file into temp, keeping its modification time.
    ///
    /// Returns the staged bytes, which stay stable even if the user keeps
    /// editing the current file.
    pub fn stage_current(&self) -> CalSyncResult<Vec<u8>> {
        let modified = fs::metadata(&self.current)
            .and_then(|m| m.modified())
            .map_err(|e| CalSyncError::io(&self.current, e))?;
        let data = fs::read(&self.current).map_err(|e| CalSyncError::io(&self.current, e))?;

        let temp = self.write_temp(&data)?;
        temp.set_modified(modified)
            .map_err(|e| CalSyncError::io(self.temp_path(), e))?;

        Ok(data)
    }

    fn write_temp(&self, data: &[u8]) -> CalSyncResult<File> {
        let temp = self.temp_path();
        remove_if_exists(&temp)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp)
            .map_err(|e| CalSyncError::io(&temp, e))?;
        file.write_all(data).map_err(|e| CalSyncError::io(&temp, e))?;
        file.sync_all().map_err(|e| CalSyncError::io(&temp, e))?;

        Ok(file)
    }

    // COMMITTING:

    /// Promote temp to the last-synced snapshot.
    pub fn commit_temp_as_last_synced(&self) -> CalSyncResult<()> {
        let temp = self.temp_path();
        let last = self.last_synced_path();

        make_writable(&last)?;
        fs::rename(&temp, &last).map_err(|e| CalSyncError::io(&last, e))?;
        set_read_only(&last)
    }

    /// Promote temp to the current file.
    ///
    /// The previous current file, if any, becomes the last-synced snapshot.
    pub fn commit_temp_as_current(&self) -> CalSyncResult<()> {
        let temp = self.temp_path();

        if self.current.exists() {
            let last = self.last_synced_path();
            make_writable(&last)?;
            copy_with_mtime(&self.current, &last)?;
            set_read_only(&last)?;
            make_writable(&self.current)?;
        }

        fs::rename(&temp, &self.current).map_err(|e| CalSyncError::io(&self.current, e))
    }

    /// Replace the calendar's request/response trace.
    pub fn write_log(&self, trace: &[u8]) -> CalSyncResult<()> {
        let log = self.log_path();
        fs::write(&log, trace).map_err(|e| CalSyncError::io(&log, e))
    }
}

/// Modification time of `path`, or the Unix epoch if it doesn't exist.
pub fn mod_time_of(path: &Path) -> CalSyncResult<DateTime<Utc>> {
    match fs::metadata(path) {
        Ok(meta) => {
            let modified = meta.modified().map_err(|e| CalSyncError::io(path, e))?;
            Ok(DateTime::<Utc>::from(modified))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(DateTime::<Utc>::from(SystemTime::UNIX_EPOCH))
        }
        Err(e) => Err(CalSyncError::io(path, e)),
    }
}

fn read_optional(path: &Path) -> CalSyncResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CalSyncError::io(path, e)),
    }
}

fn remove_if_exists(path: &Path) -> CalSyncResult<()> {
    if !path.exists() {
        return Ok(());
    }
    make_writable(path)?;
    fs::remove_file(path).map_err(|e| CalSyncError::io(path, e))
}

fn copy_with_mtime(from: &Path, to: &Path) -> CalSyncResult<()> {
    let modified = fs::metadata(from)
        .and_then(|m| m.modified())
        .map_err(|e| CalSyncError::io(from, e))?;

    fs::copy(from, to).map_err(|e| CalSyncError::io(to, e))?;

    // fs::copy carries over the source permissions, which may be read-only.
    make_writable(to)?;
    OpenOptions::new()
        .write(true)
        .open(to)
        .and_then(|f| f.set_modified(modified))
        .map_err(|e| CalSyncError::io(to, e))
}

#[cfg(unix)]
fn set_read_only(path: &Path) -> CalSyncResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| CalSyncError::io(path, e))?
        .permissions();
    perms.set_mode(perms.mode() & !0o222);
    fs::set_permissions(path, perms).map_err(|e| CalSyncError::io(path, e))
}

#[cfg(not(unix))]
fn set_read_only(path: &Path) -> CalSyncResult<()> {
    let mut perms = fs::metadata(path)
        .map_err(|e| CalSyncError::io(path, e))?
        .permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms).map_err(|e| CalSyncError::io(path, e))
}

/// Give the owner write access back. Missing files are ignored.
#[cfg(unix)]
fn make_writable(path: &Path) -> CalSyncResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let Ok(meta) = fs::metadata(path) else {
        return Ok(());
    };
    let mut perms = meta.permissions();
    perms.set_mode(perms.mode() | 0o200);
    fs::set_permissions(path, perms).map_err(|e| CalSyncError::io(path, e))
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path) -> CalSyncResult<()> {
    let Ok(meta) = fs::metadata(path) else {
        return Ok(());
    };
    let mut perms = meta.permissions();
    perms.set_readonly(false);
    fs::set_permissions(path, perms).map_err(|e| CalSyncError::io(path, e))
}
