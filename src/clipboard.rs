//! Clipboard capture capability.
//!
//! The core never touches hotkeys or clipboard timing itself; it receives
//! "the latest clipboard text" through this seam. The fragile wait-for-copy
//! dance after a simulated copy keypress belongs to the host layer, not
//! here.

use tracing::debug;

use crate::queue::{AddOutcome, QueueError, QueueStore};

/// Capability: return the most recent clipboard text, if any.
pub trait ClipboardSource: Send + Sync {
    /// Returns the current clipboard text; `None` when unavailable or empty.
    fn latest_text(&self) -> Option<String>;
}

/// System clipboard via `arboard`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSource for SystemClipboard {
    fn latest_text(&self) -> Option<String> {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
            Ok(text) => Some(text),
            Err(error) => {
                debug!(%error, "clipboard unavailable");
                None
            }
        }
    }
}

/// Captures the latest clipboard text and adds it to the queue.
///
/// A missing capture maps to [`AddOutcome::Empty`]; everything else follows
/// the queue's own validation.
///
/// # Errors
///
/// Returns [`QueueError`] when the queue's backing file cannot be accessed.
pub async fn capture_into_queue(
    source: &dyn ClipboardSource,
    queue: &QueueStore,
) -> Result<AddOutcome, QueueError> {
    let Some(text) = source.latest_text() else {
        return Ok(AddOutcome::Empty);
    };
    queue.add(&text).await
}
