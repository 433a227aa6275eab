//! Flat-file download queue with an append/dedupe/drain protocol.
//!
//! The backing resource is a single UTF-8 text file, one URL per line, no
//! header and no trailing metadata; an empty file is an empty queue. Entries
//! are unique and non-empty at all times between operations. There is no
//! file lock: single-writer discipline comes from the run controller's
//! single-flight guarantee.
//!
//! # Overview
//!
//! - [`QueueStore`] - append-if-absent, read-all, truncate
//! - [`AddOutcome`] - result of one clipboard-add attempt
//! - [`QueueError`] - backing-file I/O failures

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use crate::util::compile_static_regex;

/// URL shape accepted into the queue: scheme required, no embedded whitespace.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)^https?://\S+$"));

/// Result of one attempt to add a captured string to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended and confirmed by re-reading the file.
    Added,
    /// Valid URL already present; the queue was not touched.
    DuplicateIgnored,
    /// The append completed but the re-read did not find the entry.
    ConfirmFailed,
    /// Text did not match `https?://` with no whitespace.
    InvalidNotAUrl,
    /// Nothing was captured (empty or whitespace-only text).
    Empty,
}

impl AddOutcome {
    /// Returns the stable string label used in logs and notifications.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::DuplicateIgnored => "duplicate_ignored",
            Self::ConfirmFailed => "confirm_failed",
            Self::InvalidNotAUrl => "invalid_not_a_url",
            Self::Empty => "empty",
        }
    }
}

/// Errors touching the queue's backing file.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Backing file unreadable or unwritable.
    #[error("queue file '{path}' could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Durable URL list backed by a flat text file.
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    /// Creates a store over the given backing file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the backing file empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] when the file cannot be created.
    pub async fn ensure_exists(&self) -> Result<()> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        fs::write(&self.path, b"")
            .await
            .map_err(|source| self.io_error(source))
    }

    /// Validates `text` and appends it if absent, confirming the write by
    /// re-reading the file afterwards.
    ///
    /// Duplicates and invalid input are reported as outcomes, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] when the backing file cannot be read or
    /// appended to.
    #[instrument(skip(self), fields(queue = %self.path.display()))]
    pub async fn add(&self, text: &str) -> Result<AddOutcome> {
        let url = text.trim();
        if url.is_empty() {
            return Ok(AddOutcome::Empty);
        }
        if !URL_RE.is_match(url) {
            return Ok(AddOutcome::InvalidNotAUrl);
        }

        let entries = self.read_entries().await?;
        if entries.iter().any(|entry| entry == url) {
            return Ok(AddOutcome::DuplicateIgnored);
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        file.write_all(format!("{url}\n").as_bytes())
            .await
            .map_err(|source| self.io_error(source))?;
        file.flush()
            .await
            .map_err(|source| self.io_error(source))?;

        // Every append is verified by re-reading the file; a write that
        // does not land surfaces as an explicit outcome.
        let confirmed = self
            .read_entries()
            .await
            .map(|after| after.iter().any(|entry| entry == url))
            .unwrap_or(false);
        if confirmed {
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::ConfirmFailed)
        }
    }

    /// Reads every non-empty trimmed line in file order.
    ///
    /// The caller is responsible for calling [`QueueStore::clear`] only after
    /// it has finished processing the returned snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] when the backing file exists but cannot be
    /// read.
    pub async fn drain_all(&self) -> Result<Vec<String>> {
        self.read_entries().await
    }

    /// Truncates the backing file to empty.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] when the truncate fails.
    pub async fn clear(&self) -> Result<()> {
        fs::write(&self.path, b"")
            .await
            .map_err(|source| self.io_error(source))
    }

    /// Reads current entries; a missing file is an empty queue.
    async fn read_entries(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> QueueError {
        QueueError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
