use calsync_core::Notifier;
use notify_rust::Notification;
use tracing::warn;

const ICON: &str = "dialog-information";

/// Desktop notification popups.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn show(&self, title: &str, body: &str) {
        let title = title.to_string();
        let body = body.to_string();

        // Showing a notification is a blocking D-Bus call; keep it off the scheduler.
        tokio::task::spawn_blocking(move || {
            if let Err(e) = Notification::new()
                .appname("calsync")
                .summary(&title)
                .body(&body)
                .icon(ICON)
                .show()
            {
                warn!(error = %e, "Could not show notification");
            }
        });
    }
}
