use anyhow::Result;
use calsync_core::{AlwaysOnline, HttpClient, NetworkGate, Notifier, Paths, Scheduler, Settings};
use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::require_resources;
use crate::network::NetworkManagerGate;
use crate::notifier::DesktopNotifier;
use crate::singleton;
use crate::watcher::ChangeWatcher;

pub async fn run(paths: &Paths, assume_online: bool) -> Result<()> {
    let _lock = singleton::acquire(paths)?;

    let settings = Settings::load(paths)?;
    let resources = require_resources(paths)?;
    let http = HttpClient::new(&settings)?;

    if assume_online {
        let scheduler = Scheduler::new(resources, http, &settings, AlwaysOnline, DesktopNotifier)?;
        serve(scheduler, paths, &settings).await
    } else {
        let gate = NetworkManagerGate::connect().await;
        let scheduler = Scheduler::new(resources, http, &settings, gate, DesktopNotifier)?;
        serve(scheduler, paths, &settings).await
    }
}

/// Tick on every cycle and queue file changes as they arrive, all on this task.
async fn serve<G: NetworkGate, N: Notifier>(
    mut scheduler: Scheduler<G, N>,
    paths: &Paths,
    settings: &Settings,
) -> Result<()> {
    let (_watcher, mut changes) = ChangeWatcher::start(paths.base_dir())?;

    let mut ticker = interval(settings.cycle);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        calendars = scheduler.resources().len(),
        dir = %paths.base_dir().display(),
        "calsync started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = scheduler.tick(Utc::now()).await;
                debug!(
                    action = ?report.action,
                    synced = report.synced.len(),
                    pending = scheduler.pending_changes(),
                    "tick"
                );
            }
            Some(path) = changes.recv() => {
                scheduler.mark_changed(&path, Utc::now());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
