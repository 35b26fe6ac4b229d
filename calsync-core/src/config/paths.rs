//! Locations of calsync's files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CalSyncError, CalSyncResult};

const DEFAULT_BASE_DIR_NAME: &str = ".calsync";

const WORK_DIR: &str = ".work";
const RESOURCE_LIST_FILE: &str = "config";
const SETTINGS_FILE: &str = "settings.toml";
const DAEMON_LOG_FILE: &str = "log";
const PID_FILE: &str = "PID";

/// The base directory holds the live `<name>.ics` files and the resource
/// list. Private state lives under `<base>/.work`.
#[derive(Clone, Debug)]
pub struct Paths {
    base: PathBuf,
}

impl Paths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Paths { base: base.into() }
    }

    /// Resolve the base directory from a `--dir` argument, expanding `~`.
    /// Defaults to `~/.calsync`.
    pub fn from_arg(dir: Option<&str>) -> CalSyncResult<Self> {
        match dir {
            Some(dir) => Ok(Paths::new(shellexpand::tilde(dir).into_owned())),
            None => Ok(Paths::new(Self::default_base_dir()?)),
        }
    }

    pub fn default_base_dir() -> CalSyncResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine home directory".into()))?;
        Ok(home.join(DEFAULT_BASE_DIR_NAME))
    }

    /// Create the base and work directories if needed.
    pub fn ensure_dirs(&self) -> CalSyncResult<()> {
        let work = self.work_dir();
        fs::create_dir_all(&work).map_err(|e| CalSyncError::io(&work, e))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn work_dir(&self) -> PathBuf {
        self.base.join(WORK_DIR)
    }

    pub fn resource_list(&self) -> PathBuf {
        self.base.join(RESOURCE_LIST_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base.join(SETTINGS_FILE)
    }

    pub fn daemon_log(&self) -> PathBuf {
        self.work_dir().join(DAEMON_LOG_FILE)
    }

    pub fn pid_file(&self) -> PathBuf {
        self.work_dir().join(PID_FILE)
    }

    /// The live calendar file for a sanitized calendar name.
    pub fn current_file(&self, token: &str) -> PathBuf {
        self.base.join(format!("{}.ics", token))
    }

    /// The private scratch directory for a sanitized calendar name.
    pub fn scratch_dir(&self, token: &str) -> PathBuf {
        self.work_dir().join(format!("{}.d", token))
    }
}
