//! Log to stderr and to the daemon log at `<base>/.work/log`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use calsync_core::Paths;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init(paths: &Paths) -> Result<()> {
    let log_path = paths.daemon_log();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file at {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init()
        .context("Failed to initialize logging")
}
