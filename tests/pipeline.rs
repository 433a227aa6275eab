//! End-to-end pipeline tests: clipboard-style adds into the queue file,
//! then a full drain through the run controller and strategy set.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use linkstash::{
    AddOutcome, LinkDispatcher, Notifier, QueueStore, RetrieveError, RunController, SiteKind,
    Strategy, StrategySet, Trigger,
};
use tempfile::TempDir;

/// Strategy stub that records which URLs landed where.
struct RecordingStrategy {
    kind: SiteKind,
    calls: Arc<Mutex<Vec<(SiteKind, String, PathBuf)>>>,
}

#[async_trait]
impl Strategy for RecordingStrategy {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn kind(&self) -> SiteKind {
        self.kind
    }

    async fn retrieve(&self, url: &str, dest: &Path) -> Result<String, RetrieveError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.kind, url.to_string(), dest.to_path_buf()));
        Ok("recorded".to_string())
    }
}

struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

fn recording_set(
    dirs: &[(SiteKind, PathBuf)],
) -> (StrategySet, Arc<Mutex<Vec<(SiteKind, String, PathBuf)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let entries = dirs
        .iter()
        .map(|(kind, dest)| {
            (
                Box::new(RecordingStrategy {
                    kind: *kind,
                    calls: Arc::clone(&calls),
                }) as Box<dyn Strategy>,
                dest.clone(),
            )
        })
        .collect();
    (StrategySet::with_entries(entries), calls)
}

#[tokio::test]
async fn add_classify_drain_round_trip() {
    let dir = TempDir::new().unwrap();
    let queue = QueueStore::new(dir.path().join("download-list.txt"));
    queue.ensure_exists().await.unwrap();

    // Clipboard-style adds: invalid text and duplicates never reach the file.
    assert_eq!(queue.add("hello world").await.unwrap(), AddOutcome::InvalidNotAUrl);
    assert_eq!(
        queue.add("https://youtu.be/abc").await.unwrap(),
        AddOutcome::Added
    );
    assert_eq!(
        queue.add("https://youtu.be/abc").await.unwrap(),
        AddOutcome::DuplicateIgnored
    );
    assert_eq!(
        queue
            .add("https://www.youtube.com/playlist?list=PL1")
            .await
            .unwrap(),
        AddOutcome::Added
    );
    assert_eq!(
        queue.add("https://ru.pinterest.com/pin/1/").await.unwrap(),
        AddOutcome::Added
    );
    assert_eq!(
        queue
            .add("https://www.wildberries.ru/catalog/123456789/detail.aspx")
            .await
            .unwrap(),
        AddOutcome::Added
    );
    assert_eq!(
        queue.add("https://unknown.example/x").await.unwrap(),
        AddOutcome::Added
    );

    let videos = dir.path().join("Videos");
    let playlists = dir.path().join("Playlist Videos");
    let pictures = dir.path().join("Pictures");
    let catalog = dir.path().join("Wildberries");
    let (set, calls) = recording_set(&[
        (SiteKind::Playlist, playlists.clone()),
        (SiteKind::Video, videos.clone()),
        (SiteKind::ImageScrape, pictures.clone()),
        (SiteKind::ShardedCatalog, catalog.clone()),
    ]);

    let controller = RunController::new(
        queue.clone(),
        Arc::new(set) as Arc<dyn LinkDispatcher>,
        Arc::new(SilentNotifier) as Arc<dyn Notifier>,
    );

    let Trigger::Started(handle) = controller.trigger() else {
        panic!("trigger on idle controller must start a drain");
    };
    let summary = handle.await.unwrap();

    // Five queued links; the unsupported one is the only failure.
    assert_eq!(summary.processed, 5);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded(), 4);

    // Strategies ran in queue order with their own destination directories.
    let recorded = calls.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            (
                SiteKind::Video,
                "https://youtu.be/abc".to_string(),
                videos
            ),
            (
                SiteKind::Playlist,
                "https://www.youtube.com/playlist?list=PL1".to_string(),
                playlists
            ),
            (
                SiteKind::ImageScrape,
                "https://ru.pinterest.com/pin/1/".to_string(),
                pictures
            ),
            (
                SiteKind::ShardedCatalog,
                "https://www.wildberries.ru/catalog/123456789/detail.aspx".to_string(),
                catalog
            ),
        ]
    );

    // The drain cleared the store; a second drain has nothing to do.
    assert!(queue.drain_all().await.unwrap().is_empty());
    let Trigger::Started(handle) = controller.trigger() else {
        panic!("controller must be idle again after the drain");
    };
    let summary = handle.await.unwrap();
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn urls_added_after_snapshot_survive_for_next_drain() {
    let dir = TempDir::new().unwrap();
    let queue = QueueStore::new(dir.path().join("download-list.txt"));
    queue.add("https://youtu.be/first").await.unwrap();

    let (set, calls) = recording_set(&[(SiteKind::Video, dir.path().join("Videos"))]);
    let controller = RunController::new(
        queue.clone(),
        Arc::new(set) as Arc<dyn LinkDispatcher>,
        Arc::new(SilentNotifier) as Arc<dyn Notifier>,
    );

    controller.drain_once().await;
    assert_eq!(calls.lock().unwrap().len(), 1);

    // The queue is usable again immediately after a completed drain.
    assert_eq!(
        queue.add("https://youtu.be/second").await.unwrap(),
        AddOutcome::Added
    );
    let summary = controller.drain_once().await;
    assert_eq!(summary.processed, 1);
    assert_eq!(calls.lock().unwrap().len(), 2);
}
