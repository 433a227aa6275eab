//! Fire-and-forget status surface toward the host UI.
//!
//! The core never renders anything itself; it reports drain-level events and
//! link outcomes through this narrow capability and the host decides whether
//! that becomes a tray balloon, a toast, or nothing.

use tracing::info;

/// Capability: surface a short status message to the user.
pub trait Notifier: Send + Sync {
    /// Delivers a status message; implementations must not block or fail.
    fn notify(&self, title: &str, body: &str);
}

/// Default notifier: status messages become structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}
