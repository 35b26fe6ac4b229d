//! A named calendar kept in sync between a local file and a URL.

use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::config::{Paths, ResourceSpec};
use crate::endpoint::{self, HttpClient};
use crate::error::CalSyncResult;
use crate::fingerprint::Fingerprint;
use crate::outcome::SyncOutcome;
use crate::store::ResourceStore;

/// Which direction a calendar syncs in. Fixed when the calendar is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// A local file the user edits, pushed to a URL with PUT.
    LocalPush,
    /// A calendar fetched from a URL and written to a local file.
    RemotePull,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceKind::LocalPush => write!(f, "local"),
            ResourceKind::RemotePull => write!(f, "remote"),
        }
    }
}

/// Strip characters that can't appear in a file name.
///
/// The token names the calendar's files on disk, so it must not change for
/// the lifetime of a calendar or its earlier state is orphaned.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '/' | '\\' | ':' | '.'))
        .collect()
}

#[derive(Debug)]
pub struct Resource {
    name: String,
    kind: ResourceKind,
    address: String,
    next_eligible: DateTime<Utc>,
    last_reported: SyncOutcome,
    /// Content of the current file as this process last wrote it.
    written: Option<Fingerprint>,
    store: ResourceStore,
}

impl Resource {
    pub fn new(spec: ResourceSpec, paths: &Paths) -> CalSyncResult<Self> {
        let token = sanitize_name(&spec.name);
        let store = ResourceStore::open(paths.current_file(&token), paths.scratch_dir(&token))?;

        Ok(Resource {
            name: spec.name,
            kind: spec.kind,
            address: spec.address,
            next_eligible: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH),
            last_reported: SyncOutcome::Ok,
            written: None,
            store,
        })
    }

    /// Build every calendar listed in the resource list, in file order.
    pub fn load_all(paths: &Paths) -> CalSyncResult<Vec<Resource>> {
        crate::config::load_resource_list(&paths.resource_list())?
            .into_iter()
            .map(|spec| Resource::new(spec, paths))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn next_eligible(&self) -> DateTime<Utc> {
        self.next_eligible
    }

    /// Refuse sync attempts until `until`.
    pub fn defer_until(&mut self, until: DateTime<Utc>) {
        self.next_eligible = until;
    }

    /// Run one sync attempt.
    ///
    /// Returns `TooSoon` without touching the disk or the network while the
    /// debounce floor is in effect.
    pub async fn sync(
        &mut self,
        http: &HttpClient,
        now: DateTime<Utc>,
    ) -> CalSyncResult<SyncOutcome> {
        if now < self.next_eligible {
            return Ok(SyncOutcome::TooSoon);
        }

        match self.kind {
            ResourceKind::LocalPush => endpoint::push(&self.store, &self.address, http).await,
            ResourceKind::RemotePull => {
                let outcome = endpoint::pull(&self.store, &self.address, http).await?;
                if outcome == SyncOutcome::Ok {
                    self.written = self.store.current_fingerprint()?;
                }
                Ok(outcome)
            }
        }
    }

    /// Whether the current file still holds exactly what the last pull wrote.
    ///
    /// A change event for such a file was caused by the pull itself.
    pub fn holds_own_write(&self) -> CalSyncResult<bool> {
        match &self.written {
            Some(written) => Ok(self.store.current_fingerprint()?.as_ref() == Some(written)),
            None => Ok(false),
        }
    }

    /// Record an outcome, returning the message to show if the user should hear about it.
    ///
    /// Repeats of the last reported status are suppressed so a missing
    /// calendar isn't announced on every cycle.
    pub fn report(&mut self, outcome: SyncOutcome) -> Option<String> {
        if !outcome.is_reportable() || outcome == self.last_reported {
            return None;
        }
        self.last_reported = outcome;
        Some(outcome.message())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
