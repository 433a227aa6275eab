//! Linkstash Core Library
//!
//! This library implements the link classification and batch-retrieval
//! pipeline behind the linkstash utility: a URL captured from the clipboard
//! is classified by source site, queued in a flat text file, and later
//! drained in a single batch run that dispatches each URL to a
//! site-specific retrieval strategy.
//!
//! # Architecture
//!
//! - [`classify`] - Pure URL-to-site classification
//! - [`queue`] - Flat-file queue with append/dedupe/drain protocol
//! - [`strategy`] - Site-specific retrieval strategies (video, playlist,
//!   page-image scrape, sharded catalog)
//! - [`run`] - Single-flight drain state machine
//! - [`clipboard`] / [`notify`] - Capability seams toward the host UI
//! - [`config`] / [`paths`] - Hotkey config and on-disk layout plumbing

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod clipboard;
pub mod config;
pub mod notify;
pub mod paths;
pub mod queue;
pub mod run;
pub mod strategy;
mod util;

// Re-export commonly used types
pub use classify::{SiteKind, classify};
pub use clipboard::{ClipboardSource, SystemClipboard, capture_into_queue};
pub use config::{Config, ConfigError};
pub use notify::{LogNotifier, Notifier};
pub use paths::{InstanceLock, Layout};
pub use queue::{AddOutcome, QueueError, QueueStore};
pub use run::{DrainSummary, LinkDispatcher, LinkOutcome, RunController, RunState, Trigger};
pub use strategy::{
    CatalogStrategy, MediaDownloader, PageImageStrategy, PlaylistStrategy, RetrieveError,
    Strategy, StrategySet, VideoStrategy, YtDlp, build_http_client,
};
