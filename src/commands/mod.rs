pub mod run;
pub mod status;
pub mod sync;

use anyhow::Result;
use calsync_core::{Paths, Resource};

/// Load the calendar list, refusing to continue without any calendars.
pub fn require_resources(paths: &Paths) -> Result<Vec<Resource>> {
    let resources = Resource::load_all(paths)?;
    if resources.is_empty() {
        anyhow::bail!(
            "No calendars configured.\n\
            Add `name = address` lines under LOCAL: or REMOTE: in {}",
            paths.resource_list().display()
        );
    }
    Ok(resources)
}
