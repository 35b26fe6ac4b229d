//! Sync engine for calsync.
//!
//! Keeps named calendars in step between `~/.calsync/<name>.ics` and a URL:
//! - local calendars are pushed with PUT after the user edits them
//! - remote calendars are fetched and written locally
//!
//! The [`Scheduler`] debounces change events, interleaves queued syncs with
//! periodic full syncs, and holds off while the network is down.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod fingerprint;
pub mod gate;
pub mod outcome;
pub mod queue;
pub mod resource;
pub mod scheduler;
pub mod store;

pub use config::{Paths, ResourceSpec, Settings};
pub use endpoint::HttpClient;
pub use error::{CalSyncError, CalSyncResult};
pub use gate::{AlwaysOnline, NetworkGate, Notifier};
pub use outcome::SyncOutcome;
pub use resource::{Resource, ResourceKind};
pub use scheduler::{Scheduler, TickAction, TickReport};
