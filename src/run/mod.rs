//! Single-flight drain state machine.
//!
//! The controller owns the only piece of shared mutable state in the core:
//! a run flag with two values, [`RunState::Idle`] and [`RunState::Draining`].
//! [`RunController::trigger`] flips the flag synchronously before spawning
//! the drain worker, closing the race between two rapid trigger events; the
//! flag is restored from the worker's completion path through a drop guard,
//! so an unexpected failure inside the loop still returns the state to idle.
//!
//! Within one drain, URLs are processed strictly in queue order and every
//! per-URL failure is downgraded to a reported outcome; nothing inside a
//! drain aborts the batch or the process.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::classify::SiteKind;
use crate::notify::Notifier;
use crate::queue::QueueStore;
use crate::strategy::RetrieveError;

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No drain in progress; a trigger will start one.
    Idle,
    /// A drain worker is alive; triggers are rejected.
    Draining,
}

/// Result of processing one queued URL.
#[derive(Debug)]
pub struct LinkOutcome {
    pub url: String,
    pub kind: SiteKind,
    pub result: Result<String, RetrieveError>,
}

/// Seam between the drain loop and classify-plus-strategy dispatch.
///
/// The production implementation is [`crate::strategy::StrategySet`]; tests
/// substitute stubs to drive the state machine deterministically.
#[async_trait]
pub trait LinkDispatcher: Send + Sync {
    /// Classifies `url` and runs the matching strategy, reporting the
    /// outcome rather than failing.
    async fn dispatch(&self, url: &str) -> LinkOutcome;
}

/// Aggregate counts for one completed drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    /// URLs taken from the queue and dispatched.
    pub processed: usize,
    /// Dispatched URLs whose outcome was a failure.
    pub failed: usize,
}

impl DrainSummary {
    /// URLs retrieved successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.processed - self.failed
    }
}

/// Result of a trigger attempt.
pub enum Trigger {
    /// A drain worker was spawned; the handle resolves to its summary.
    Started(JoinHandle<DrainSummary>),
    /// A drain is already active; no second run is queued.
    AlreadyRunning,
}

/// Coordinates "download all queued URLs" against concurrent triggers.
///
/// Clones share the run flag, so every handle sees the same single-flight
/// state.
#[derive(Clone)]
pub struct RunController {
    running: Arc<AtomicBool>,
    queue: QueueStore,
    dispatcher: Arc<dyn LinkDispatcher>,
    notifier: Arc<dyn Notifier>,
}

/// Restores the run flag to idle on every worker exit path.
struct IdleGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl RunController {
    #[must_use]
    pub fn new(
        queue: QueueStore,
        dispatcher: Arc<dyn LinkDispatcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            queue,
            dispatcher,
            notifier,
        }
    }

    /// Returns the current state for observability; may be stale by the time
    /// the caller inspects it.
    #[must_use]
    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::SeqCst) {
            RunState::Draining
        } else {
            RunState::Idle
        }
    }

    /// Starts a drain worker unless one is already active.
    ///
    /// The flag flips inside this call, before the worker is spawned, so two
    /// back-to-back triggers can never both start a worker.
    pub fn trigger(&self) -> Trigger {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("drain trigger ignored; a run is already active");
            self.notifier
                .notify("Download", "A download run is already in progress");
            return Trigger::AlreadyRunning;
        }

        let controller = self.clone();
        Trigger::Started(tokio::spawn(async move {
            let _guard = IdleGuard {
                flag: &controller.running,
            };
            controller.drain_once().await
        }))
    }

    /// Processes every currently queued URL, then clears the queue.
    ///
    /// The drain operates on the snapshot taken by `drain_all`; an add that
    /// lands while the drain runs is covered by the next drain, though the
    /// trailing `clear` can drop it (same exposure as single-writer use in
    /// practice). Queue read failures are treated as "nothing to do".
    pub async fn drain_once(&self) -> DrainSummary {
        let urls = match self.queue.drain_all().await {
            Ok(urls) => urls,
            Err(error) => {
                warn!(%error, "queue unreadable; nothing to do");
                self.notifier
                    .notify("Download", "Queue could not be read");
                return DrainSummary::default();
            }
        };

        if urls.is_empty() {
            info!("queue is empty; nothing to download");
            self.notifier.notify("Download", "Nothing queued");
            return DrainSummary::default();
        }

        info!(queued = urls.len(), "drain started");
        self.notifier.notify(
            "Download",
            &format!("Downloading {} queued link(s)", urls.len()),
        );

        let mut summary = DrainSummary::default();
        for url in urls {
            let outcome = self.dispatcher.dispatch(&url).await;
            summary.processed += 1;
            match &outcome.result {
                Ok(detail) => {
                    info!(url = %outcome.url, kind = %outcome.kind, detail, "link retrieved");
                }
                Err(error) => {
                    summary.failed += 1;
                    warn!(url = %outcome.url, kind = %outcome.kind, %error, "link failed");
                }
            }
        }

        if let Err(error) = self.queue.clear().await {
            warn!(%error, "queue could not be cleared after drain");
        }

        info!(
            processed = summary.processed,
            failed = summary.failed,
            "drain complete"
        );
        self.notifier.notify(
            "Download complete",
            &format!(
                "{} of {} link(s) retrieved",
                summary.succeeded(),
                summary.processed
            ),
        );
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::sync::Semaphore;

    struct RecordingNotifier {
        messages: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
            })
        }

        fn bodies(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .map(|(_, body)| body.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
        }
    }

    /// Dispatcher that records call order and optionally blocks on a gate
    /// until the test releases it.
    struct GatedDispatcher {
        calls: Mutex<Vec<String>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl GatedDispatcher {
        fn immediate() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                gate: None,
            })
        }

        fn gated(gate: Arc<Semaphore>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                gate: Some(gate),
            })
        }
    }

    #[async_trait]
    impl LinkDispatcher for GatedDispatcher {
        async fn dispatch(&self, url: &str) -> LinkOutcome {
            if let Some(gate) = &self.gate {
                let permit = gate.acquire().await.unwrap();
                permit.forget();
            }
            self.calls.lock().unwrap().push(url.to_string());
            LinkOutcome {
                url: url.to_string(),
                kind: SiteKind::Video,
                result: Ok("stubbed".to_string()),
            }
        }
    }

    fn queue_with(dir: &TempDir, urls: &[&str]) -> QueueStore {
        let path = dir.path().join("download-list.txt");
        let contents = urls
            .iter()
            .map(|url| format!("{url}\n"))
            .collect::<String>();
        std::fs::write(&path, contents).unwrap();
        QueueStore::new(path)
    }

    #[tokio::test]
    async fn test_drain_processes_in_queue_order_and_clears() {
        let dir = TempDir::new().unwrap();
        let queue = queue_with(&dir, &["https://a.test/1", "https://b.test/2", "https://c.test/3"]);
        let dispatcher = GatedDispatcher::immediate();
        let notifier = RecordingNotifier::new();
        let controller = RunController::new(
            queue.clone(),
            Arc::clone(&dispatcher) as Arc<dyn LinkDispatcher>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let summary = controller.drain_once().await;
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.failed, 0);

        assert_eq!(
            *dispatcher.calls.lock().unwrap(),
            vec![
                "https://a.test/1".to_string(),
                "https://b.test/2".to_string(),
                "https://c.test/3".to_string(),
            ]
        );
        assert!(queue.drain_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drain_on_empty_queue_reports_nothing_queued() {
        let dir = TempDir::new().unwrap();
        let queue = queue_with(&dir, &[]);
        let notifier = RecordingNotifier::new();
        let controller = RunController::new(
            queue,
            GatedDispatcher::immediate() as Arc<dyn LinkDispatcher>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let summary = controller.drain_once().await;
        assert_eq!(summary, DrainSummary::default());
        assert!(notifier.bodies().iter().any(|body| body == "Nothing queued"));
    }

    #[tokio::test]
    async fn test_second_trigger_while_draining_is_rejected() {
        let dir = TempDir::new().unwrap();
        let queue = queue_with(&dir, &["https://a.test/1"]);
        let gate = Arc::new(Semaphore::new(0));
        let dispatcher = GatedDispatcher::gated(Arc::clone(&gate));
        let notifier = RecordingNotifier::new();
        let controller = RunController::new(
            queue,
            Arc::clone(&dispatcher) as Arc<dyn LinkDispatcher>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let Trigger::Started(handle) = controller.trigger() else {
            panic!("first trigger must start a drain");
        };
        assert_eq!(controller.state(), RunState::Draining);

        // Second trigger while the worker is blocked on the gate.
        assert!(matches!(controller.trigger(), Trigger::AlreadyRunning));
        assert!(
            notifier
                .bodies()
                .iter()
                .any(|body| body.contains("already in progress"))
        );

        gate.add_permits(1);
        let summary = handle.await.unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(controller.state(), RunState::Idle);

        // Exactly one worker touched the queue.
        assert_eq!(dispatcher.calls.lock().unwrap().len(), 1);

        // Idle again: a new trigger starts (queue is now empty, drain is a no-op).
        let Trigger::Started(handle) = controller.trigger() else {
            panic!("controller must accept triggers after returning to idle");
        };
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_links_are_counted_not_fatal() {
        struct FailingDispatcher;

        #[async_trait]
        impl LinkDispatcher for FailingDispatcher {
            async fn dispatch(&self, url: &str) -> LinkOutcome {
                LinkOutcome {
                    url: url.to_string(),
                    kind: SiteKind::Unsupported,
                    result: Err(RetrieveError::Unsupported {
                        url: url.to_string(),
                    }),
                }
            }
        }

        let dir = TempDir::new().unwrap();
        let queue = queue_with(&dir, &["https://a.test/1", "https://b.test/2"]);
        let notifier = RecordingNotifier::new();
        let controller = RunController::new(
            queue.clone(),
            Arc::new(FailingDispatcher) as Arc<dyn LinkDispatcher>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let summary = controller.drain_once().await;
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.succeeded(), 0);

        // The queue is still cleared after a fully failed batch.
        assert!(queue.drain_all().await.unwrap().is_empty());
        assert!(
            notifier
                .bodies()
                .iter()
                .any(|body| body.contains("0 of 2"))
        );
    }

    #[tokio::test]
    async fn test_unreadable_queue_is_nothing_to_do() {
        let dir = TempDir::new().unwrap();
        // A directory at the queue path makes reads fail with an error other
        // than NotFound.
        let path = dir.path().join("download-list.txt");
        std::fs::create_dir(&path).unwrap();
        let notifier = RecordingNotifier::new();
        let controller = RunController::new(
            QueueStore::new(path),
            GatedDispatcher::immediate() as Arc<dyn LinkDispatcher>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let summary = controller.drain_once().await;
        assert_eq!(summary, DrainSummary::default());
        assert!(
            notifier
                .bodies()
                .iter()
                .any(|body| body.contains("could not be read"))
        );
    }
}
