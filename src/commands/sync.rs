use anyhow::Result;
use calsync_core::{CalSyncError, HttpClient, Paths, Settings};
use chrono::Utc;
use owo_colors::OwoColorize;

use super::require_resources;
use crate::render::Render;
use crate::singleton;

pub async fn run(paths: &Paths, only: Option<&str>) -> Result<()> {
    let _lock = singleton::acquire(paths)?;

    let settings = Settings::load(paths)?;
    let mut resources = require_resources(paths)?;

    if let Some(name) = only {
        let available: Vec<&str> = resources.iter().map(|r| r.name()).collect();
        if !available.contains(&name) {
            return Err(CalSyncError::UnknownResource(format!(
                "{} (available: {})",
                name,
                available.join(", ")
            ))
            .into());
        }
        resources.retain(|r| r.name() == name);
    }

    let http = HttpClient::new(&settings)?;
    let now = Utc::now();
    let mut failed = 0;

    for resource in &mut resources {
        match resource.sync(&http, now).await {
            Ok(outcome) => println!("{}  {}", resource.render(), outcome.render()),
            Err(e) => {
                failed += 1;
                println!("{}  {}", resource.render(), e.to_string().red());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} calendars failed to sync", failed, resources.len());
    }

    Ok(())
}
