//! The sync engine.
//!
//! One [`Scheduler::tick`] per cycle decides between four things:
//!
//! 1. The network is down, or the machine just woke up: do nothing, and push
//!    the next full sync out by the network grace period.
//! 2. A full sync isn't due yet: sync calendars whose queued changes have
//!    matured.
//! 3. A full sync is due but changes are still queued: postpone it briefly
//!    so a burst of edits isn't interrupted.
//! 4. Otherwise run a full sync over every calendar.
//!
//! Messages from the tick are collected into a single notification.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::endpoint::HttpClient;
use crate::error::{CalSyncError, CalSyncResult};
use crate::gate::{NetworkGate, Notifier};
use crate::queue::ChangeQueue;
use crate::resource::Resource;

pub const NOTIFICATION_TITLE: &str = "Calendar Sync";

/// Scheduler intervals, converted once from [`Settings`].
#[derive(Debug, Clone, Copy)]
struct Timing {
    debounce: TimeDelta,
    full_sync: TimeDelta,
    network_grace: TimeDelta,
    busy_postpone: TimeDelta,
}

impl Timing {
    fn from_settings(settings: &Settings) -> CalSyncResult<Self> {
        Ok(Timing {
            debounce: delta("cycle", settings.cycle)?,
            full_sync: delta("full_sync", settings.full_sync)?,
            network_grace: delta("network_grace", settings.network_grace)?,
            busy_postpone: delta("busy_postpone", settings.busy_postpone)?,
        })
    }
}

fn delta(name: &str, duration: Duration) -> CalSyncResult<TimeDelta> {
    TimeDelta::from_std(duration)
        .map_err(|_| CalSyncError::Config(format!("{} is out of range", name)))
}

/// `t + delta`, saturating at the latest representable instant.
fn later(t: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    t.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// What a tick decided to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickAction {
    AwaitingNetwork,
    DrainingQueue,
    PostponingFullSync,
    RunningFullSync,
}

#[derive(Debug)]
pub struct TickReport {
    pub action: TickAction,
    /// Calendars whose sync was attempted, in order.
    pub synced: Vec<String>,
    /// Lines shown to the user, if any.
    pub messages: Vec<String>,
}

pub struct Scheduler<G, N> {
    resources: Vec<Resource>,
    index: HashMap<PathBuf, usize>,
    queue: ChangeQueue,
    http: HttpClient,
    gate: G,
    notifier: N,
    timing: Timing,
    next_full_sync: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl<G: NetworkGate, N: Notifier> Scheduler<G, N> {
    pub fn new(
        resources: Vec<Resource>,
        http: HttpClient,
        settings: &Settings,
        gate: G,
        notifier: N,
    ) -> CalSyncResult<Self> {
        let index = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.store().current_path().to_path_buf(), i))
            .collect();

        Ok(Scheduler {
            resources,
            index,
            queue: ChangeQueue::new(),
            http,
            gate,
            notifier,
            timing: Timing::from_settings(settings)?,
            // The first tick with a network runs a full sync.
            next_full_sync: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH),
            last_seen: Utc::now(),
        })
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn next_full_sync(&self) -> DateTime<Utc> {
        self.next_full_sync
    }

    pub fn pending_changes(&self) -> usize {
        self.queue.len()
    }

    /// A file in the calendar directory changed.
    ///
    /// Holds the calendar off for one debounce interval and queues a retry
    /// for when it expires. Returns false for paths that aren't calendars.
    pub fn mark_changed(&mut self, path: &Path, now: DateTime<Utc>) -> bool {
        let Some(&i) = self.index.get(path) else {
            debug!(path = %path.display(), "ignoring change to unknown file");
            return false;
        };

        let resource = &mut self.resources[i];
        match resource.holds_own_write() {
            Ok(true) => {
                debug!(calendar = %resource, "ignoring change made by our own pull");
                return false;
            }
            Ok(false) => {}
            Err(e) => warn!(calendar = %resource, error = %e, "could not fingerprint changed file"),
        }

        let until = later(now, self.timing.debounce);
        resource.defer_until(until);
        self.queue.push(until, i);

        info!(
            calendar = %resource,
            until = %until.with_timezone(&Local).format("%H:%M:%S"),
            "queuing"
        );
        true
    }

    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport {
            action: TickAction::AwaitingNetwork,
            synced: Vec::new(),
            messages: Vec::new(),
        };

        let woke_up = now - self.last_seen > self.timing.full_sync;

        if woke_up || !self.gate.is_available().await {
            // Don't hog the network the moment it comes back.
            self.next_full_sync = self.next_full_sync.max(later(now, self.timing.network_grace));
            debug!(
                until = %self.next_full_sync.with_timezone(&Local),
                woke_up,
                "postponing full sync"
            );
        } else if now < self.next_full_sync {
            report.action = TickAction::DrainingQueue;
            for i in self.queue.drain_due(now) {
                self.sync_one(i, now, &mut report).await;
            }
        } else if !self.queue.is_empty() {
            report.action = TickAction::PostponingFullSync;
            self.next_full_sync = later(now, self.timing.busy_postpone);
            info!(
                until = %self.next_full_sync.with_timezone(&Local),
                "busy, postponing full sync"
            );
        } else {
            report.action = TickAction::RunningFullSync;
            info!("full sync");
            self.next_full_sync = later(now, self.timing.full_sync);
            for i in 0..self.resources.len() {
                self.sync_one(i, now, &mut report).await;
            }
        }

        if !report.messages.is_empty() {
            self.notifier.show(NOTIFICATION_TITLE, &report.messages.join("\n"));
        }

        self.last_seen = later(now, TimeDelta::from_std(started.elapsed()).unwrap_or_default());
        report
    }

    /// Sync one calendar. Errors become messages and never abort the tick.
    async fn sync_one(&mut self, i: usize, now: DateTime<Utc>, report: &mut TickReport) {
        let resource = &mut self.resources[i];
        report.synced.push(resource.name().to_string());

        match resource.sync(&self.http, now).await {
            Ok(outcome) => {
                info!(calendar = %resource, kind = %resource.kind(), %outcome, "synced");
                if let Some(msg) = resource.report(outcome) {
                    report.messages.push(format!("{} {}", resource, msg));
                }
            }
            Err(e) => {
                warn!(calendar = %resource, kind = %resource.kind(), error = %e, "sync failed");
                report.messages.push(format!("{} got exception {}", resource, e));
            }
        }
    }
}
