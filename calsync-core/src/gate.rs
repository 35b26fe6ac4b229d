//! Seams between the scheduler and the desktop it runs on.

use std::future::Future;

/// Answers "is the network usable right now".
///
/// Implementations must fail open: if connectivity can't be determined,
/// report it as available.
pub trait NetworkGate {
    fn is_available(&self) -> impl Future<Output = bool> + Send;
}

/// Shows a notification to the user. Called at most once per tick.
pub trait Notifier {
    fn show(&self, title: &str, body: &str);
}

/// A gate for machines without a connectivity service.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl NetworkGate for AlwaysOnline {
    async fn is_available(&self) -> bool {
        true
    }
}
