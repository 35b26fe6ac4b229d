use std::time::SystemTime;

use anyhow::Result;
use calsync_core::{Paths, Resource};
use owo_colors::OwoColorize;

use super::require_resources;
use crate::render::Render;

pub fn run(paths: &Paths) -> Result<()> {
    let resources = require_resources(paths)?;

    for (i, resource) in resources.iter().enumerate() {
        println!("{}", resource.render());
        for line in describe(resource)? {
            println!("   {}", line);
        }

        if i < resources.len() - 1 {
            println!();
        }
    }

    Ok(())
}

fn describe(resource: &Resource) -> Result<Vec<String>> {
    let store = resource.store();
    let mut lines = Vec::new();

    let current = store.current_path().display().to_string();
    if store.current_exists() {
        lines.push(format!("file:     {}", current));
    } else {
        lines.push(format!("file:     {} {}", current, "(missing)".yellow()));
    }

    if !store.last_synced_exists() {
        lines.push(format!("snapshot: {}", "never synced".dimmed()));
        return Ok(lines);
    }

    let synced_at: SystemTime = store.last_synced_mtime()?.into();
    let age = SystemTime::now()
        .duration_since(synced_at)
        .map(|d| humantime::format_duration(std::time::Duration::from_secs(d.as_secs())).to_string())
        .unwrap_or_else(|_| "just now".to_string());
    lines.push(format!("snapshot: {} ago", age));

    if let Some(fingerprint) = store.last_synced_fingerprint()? {
        lines.push(format!("checksum: {}", fingerprint.to_string().dimmed()));
    }

    Ok(lines)
}
