//! Watch the calendar directory for edits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{error, trace, warn};

/// Forwards changed paths to the scheduler's task. Stops watching when dropped.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
}

impl ChangeWatcher {
    pub fn start(dir: &Path) -> Result<(Self, UnboundedReceiver<PathBuf>)> {
        let (tx, rx) = unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    for path in changed_paths(event) {
                        if tx.send(path).is_err() {
                            error!("Tried to send file change to a closed channel");
                        }
                    }
                }
                Err(e) => warn!(error = %e, "file watcher error"),
            },
            Config::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        Ok((ChangeWatcher { _watcher: watcher }, rx))
    }
}

/// Paths created, modified or removed by `event`.
///
/// Permission and timestamp changes don't alter a calendar's content.
fn changed_paths(event: Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => {
            trace!(paths = ?event.paths, "ignoring metadata change");
            Vec::new()
        }
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => event.paths,
        other => {
            trace!(kind = ?other, "ignoring file event");
            Vec::new()
        }
    }
}
