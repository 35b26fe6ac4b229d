//! Colored terminal rendering for calsync types.

use calsync_core::endpoint::Address;
use calsync_core::{Resource, ResourceKind, SyncOutcome};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for SyncOutcome {
    fn render(&self) -> String {
        match self {
            SyncOutcome::Ok => "synced".green().to_string(),
            SyncOutcome::NoChange => "no change".dimmed().to_string(),
            SyncOutcome::NotFound => "not found".yellow().to_string(),
            SyncOutcome::TooSoon => "too soon".dimmed().to_string(),
        }
    }
}

impl Render for ResourceKind {
    fn render(&self) -> String {
        match self {
            ResourceKind::LocalPush => "↑ local".cyan().to_string(),
            ResourceKind::RemotePull => "↓ remote".blue().to_string(),
        }
    }
}

impl Render for Resource {
    fn render(&self) -> String {
        format!(
            "📅 {} {} {}",
            self.name().bold(),
            self.kind().render(),
            Address::parse(self.address()).masked().dimmed()
        )
    }
}
