//! Configuration for calsync.

mod paths;
mod resources;
mod settings;

pub use paths::Paths;
pub use resources::{ResourceSpec, load_resource_list, parse_resource_list};
pub use settings::Settings;
