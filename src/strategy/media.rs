//! Video and playlist strategies delegating to an external media engine.
//!
//! The engine itself is a capability trait so the strategies stay testable;
//! the production implementation shells out to the `yt-dlp` binary.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::classify::SiteKind;

use super::error::RetrieveError;
use super::Strategy;

/// Capability: given a URL and output directory, fetch media.
///
/// `playlist` selects between single-item and playlist-expansion modes.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Fetches `url` into `dest`, returning a detail string on success.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::MediaEngine`] when the engine reports
    /// failure and [`RetrieveError::Io`] when `dest` cannot be prepared.
    async fn fetch(&self, url: &str, dest: &Path, playlist: bool) -> Result<String, RetrieveError>;
}

/// Production media engine: the `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    /// Uses `yt-dlp` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("yt-dlp")
    }

    /// Uses an explicit engine binary; also handy for tests.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the engine argument list: best single format, mp4 merge, output
/// named from the resolved media title.
fn build_args(url: &str, dest: &Path, playlist: bool) -> Vec<OsString> {
    let mut template = dest.as_os_str().to_os_string();
    template.push("/%(title)s.%(ext)s");

    let mut args: Vec<OsString> = vec![
        "-f".into(),
        "best".into(),
        "--no-warnings".into(),
        "--merge-output-format".into(),
        "mp4".into(),
        "-o".into(),
        template,
    ];
    args.push(if playlist {
        "--yes-playlist".into()
    } else {
        "--no-playlist".into()
    });
    args.push(url.into());
    args
}

#[async_trait]
impl MediaDownloader for YtDlp {
    #[instrument(skip(self, dest), fields(url = %url, playlist))]
    async fn fetch(&self, url: &str, dest: &Path, playlist: bool) -> Result<String, RetrieveError> {
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|source| RetrieveError::io(dest, source))?;

        let args = build_args(url, dest, playlist);
        debug!(program = %self.program.display(), "launching media engine");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|error| RetrieveError::MediaEngine {
                detail: format!("failed to launch '{}': {error}", self.program.display()),
            })?;

        if output.status.success() {
            Ok(format!("media saved to {}", dest.display()))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("engine exited with failure status")
                .to_string();
            Err(RetrieveError::MediaEngine { detail })
        }
    }
}

/// Single-video retrieval via the media engine.
pub struct VideoStrategy {
    engine: Arc<dyn MediaDownloader>,
}

impl VideoStrategy {
    #[must_use]
    pub fn new(engine: Arc<dyn MediaDownloader>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Strategy for VideoStrategy {
    fn name(&self) -> &'static str {
        "video"
    }

    fn kind(&self) -> SiteKind {
        SiteKind::Video
    }

    async fn retrieve(&self, url: &str, dest: &Path) -> Result<String, RetrieveError> {
        self.engine.fetch(url, dest, false).await
    }
}

/// Playlist-expanded retrieval via the media engine; every resolved item
/// lands in the same destination directory.
pub struct PlaylistStrategy {
    engine: Arc<dyn MediaDownloader>,
}

impl PlaylistStrategy {
    #[must_use]
    pub fn new(engine: Arc<dyn MediaDownloader>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Strategy for PlaylistStrategy {
    fn name(&self) -> &'static str {
        "playlist"
    }

    fn kind(&self) -> SiteKind {
        SiteKind::Playlist
    }

    async fn retrieve(&self, url: &str, dest: &Path) -> Result<String, RetrieveError> {
        self.engine.fetch(url, dest, true).await
    }
}
