//! Daemon tuning, from `<base>/settings.toml` and `CALSYNC_*` variables.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use super::Paths;
use crate::error::{CalSyncError, CalSyncResult};

const DEFAULT_CYCLE: Duration = Duration::from_secs(10);
const DEFAULT_FULL_SYNC: Duration = Duration::from_secs(30 * 60);
const DEFAULT_NETWORK_GRACE: Duration = Duration::from_secs(10 * 60);
const DEFAULT_BUSY_POSTPONE: Duration = Duration::from_secs(60);
/// Long, so slow calendar servers get a chance to answer.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// All durations are humantime strings, e.g. `"30m"` or `"10s"`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Tick period, and how long a local edit must settle before it's pushed.
    #[serde(default = "default_cycle", deserialize_with = "humantime_duration")]
    pub cycle: Duration,

    /// Time between full syncs. A gap between ticks longer than this is
    /// taken to mean the machine was asleep.
    #[serde(default = "default_full_sync", deserialize_with = "humantime_duration")]
    pub full_sync: Duration,

    /// How long to hold off the next full sync once the network is back.
    #[serde(default = "default_network_grace", deserialize_with = "humantime_duration")]
    pub network_grace: Duration,

    /// How long to postpone a due full sync while local edits are queued.
    #[serde(default = "default_busy_postpone", deserialize_with = "humantime_duration")]
    pub busy_postpone: Duration,

    #[serde(default = "default_http_timeout", deserialize_with = "humantime_duration")]
    pub http_timeout: Duration,

    /// Also accept `application/octet-stream` from lenient servers.
    #[serde(default = "default_true")]
    pub accept_octet_stream: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_cycle() -> Duration {
    DEFAULT_CYCLE
}

fn default_full_sync() -> Duration {
    DEFAULT_FULL_SYNC
}

fn default_network_grace() -> Duration {
    DEFAULT_NETWORK_GRACE
}

fn default_busy_postpone() -> Duration {
    DEFAULT_BUSY_POSTPONE
}

fn default_http_timeout() -> Duration {
    DEFAULT_HTTP_TIMEOUT
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    concat!("calsync/", env!("CARGO_PKG_VERSION")).to_string()
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cycle: default_cycle(),
            full_sync: default_full_sync(),
            network_grace: default_network_grace(),
            busy_postpone: default_busy_postpone(),
            http_timeout: default_http_timeout(),
            accept_octet_stream: default_true(),
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    /// Load settings. A missing settings file means all defaults.
    pub fn load(paths: &Paths) -> CalSyncResult<Self> {
        Config::builder()
            .add_source(File::from(paths.settings_file()).required(false))
            .add_source(Environment::with_prefix("CALSYNC"))
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))
    }
}
