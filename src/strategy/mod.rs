//! Site-specific retrieval strategies.
//!
//! Each strategy takes a URL and a destination directory and performs the
//! fetch, owning its own failure handling: expected failures come back as
//! [`RetrieveError`] values and are reported per URL by the drain loop,
//! never propagated as fatal errors.
//!
//! # Architecture
//!
//! - [`Strategy`] - Async trait individual strategies implement
//! - [`StrategySet`] - The four standard strategies paired with their
//!   destination directories; implements [`LinkDispatcher`] for the run
//!   controller
//! - [`VideoStrategy`] / [`PlaylistStrategy`] - Delegation to the external
//!   media engine
//! - [`PageImageStrategy`] - First-inline-image page scrape
//! - [`CatalogStrategy`] - Sharded catalog-image retrieval with host-pool
//!   probing

mod catalog;
mod error;
mod http;
mod media;
mod page_image;

pub use catalog::CatalogStrategy;
pub use error::RetrieveError;
pub use http::build_http_client;
pub use media::{MediaDownloader, PlaylistStrategy, VideoStrategy, YtDlp};
pub use page_image::PageImageStrategy;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use crate::classify::{SiteKind, classify};
use crate::paths::Layout;
use crate::run::{LinkDispatcher, LinkOutcome};

/// Trait that all retrieval strategies implement.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn Strategy>`. Rust 2024 native async traits are not object-safe,
/// so `async_trait` is required for the [`StrategySet`] pattern.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Returns the strategy's name (e.g. "video", "catalog").
    fn name(&self) -> &'static str;

    /// Returns the site kind this strategy handles.
    fn kind(&self) -> SiteKind;

    /// Fetches the media behind `url` into `dest`.
    ///
    /// On success returns a human-readable detail string for logs and
    /// notifications.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError`] for every expected failure mode; the caller
    /// reports it and continues with the next URL.
    async fn retrieve(&self, url: &str, dest: &Path) -> Result<String, RetrieveError>;
}

/// The configured strategies, each paired with its destination directory.
pub struct StrategySet {
    entries: Vec<(Box<dyn Strategy>, PathBuf)>,
}

impl StrategySet {
    /// Builds the standard production set: playlist before video so both can
    /// share the media engine, then the two scraping strategies.
    #[must_use]
    pub fn standard(client: &Client, engine: Arc<dyn MediaDownloader>, layout: &Layout) -> Self {
        Self::with_entries(vec![
            (
                Box::new(PlaylistStrategy::new(Arc::clone(&engine))) as Box<dyn Strategy>,
                layout.playlists.clone(),
            ),
            (Box::new(VideoStrategy::new(engine)), layout.videos.clone()),
            (
                Box::new(PageImageStrategy::new(client.clone())),
                layout.pictures.clone(),
            ),
            (
                Box::new(CatalogStrategy::new(client.clone())),
                layout.catalog.clone(),
            ),
        ])
    }

    /// Builds a set from explicit entries; used by tests to inject stubs.
    #[must_use]
    pub fn with_entries(entries: Vec<(Box<dyn Strategy>, PathBuf)>) -> Self {
        Self { entries }
    }

    /// Looks up the strategy and destination for a site kind.
    fn for_kind(&self, kind: SiteKind) -> Option<(&dyn Strategy, &Path)> {
        self.entries
            .iter()
            .find(|(strategy, _)| strategy.kind() == kind)
            .map(|(strategy, dest)| (strategy.as_ref(), dest.as_path()))
    }
}

#[async_trait]
impl LinkDispatcher for StrategySet {
    #[instrument(skip(self), fields(url = %url))]
    async fn dispatch(&self, url: &str) -> LinkOutcome {
        let kind = classify(url);
        let Some((strategy, dest)) = self.for_kind(kind) else {
            return LinkOutcome {
                url: url.to_string(),
                kind,
                result: Err(RetrieveError::Unsupported {
                    url: url.to_string(),
                }),
            };
        };

        let result = strategy.retrieve(url, dest).await;
        LinkOutcome {
            url: url.to_string(),
            kind,
            result,
        }
    }
}
