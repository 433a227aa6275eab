//! Site classification for captured URLs.
//!
//! [`classify`] is a pure, total function: any input string maps to exactly
//! one [`SiteKind`], and unmatched input yields [`SiteKind::Unsupported`]
//! rather than an error. Matching order is significant and first-match-wins;
//! the playlist marker must be checked before the general video-host rule
//! because playlist URLs live on the same host.

use url::Url;

/// Video site host (also matches subdomains like `m.youtube.com`).
const VIDEO_HOST: &str = "youtube.com";
/// Short-link domain for the video site.
const VIDEO_SHORT_HOST: &str = "youtu.be";
/// Marker identifying playlist URLs on the video site.
const PLAYLIST_MARKER: &str = "youtube.com/playlist";
/// Image host scraped for the first inline image.
const IMAGE_SCRAPE_HOST: &str = "pinterest.com";
/// Catalog site whose product images live on a sharded host pool.
const SHARDED_CATALOG_HOST: &str = "wildberries.ru";

/// Which retrieval strategy applies to a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// Single video download via the media engine.
    Video,
    /// Playlist-expanded download via the media engine.
    Playlist,
    /// Page scrape for the first inline image.
    ImageScrape,
    /// Vendor catalog with shard-discovered product images.
    ShardedCatalog,
    /// No known strategy applies.
    Unsupported,
}

impl SiteKind {
    /// Returns the stable string label used in logs and notifications.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Playlist => "playlist",
            Self::ImageScrape => "image-scrape",
            Self::ShardedCatalog => "sharded-catalog",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for SiteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a URL by source site. Pure and total; never fails.
///
/// Hostname comparison is case-insensitive and tolerant of subdomains. The
/// playlist check runs against the whole URL because the marker includes a
/// path component.
#[must_use]
pub fn classify(url: &str) -> SiteKind {
    let lowered = url.trim().to_ascii_lowercase();

    if lowered.contains(PLAYLIST_MARKER) {
        return SiteKind::Playlist;
    }

    let Some(host) = host_of(&lowered) else {
        return SiteKind::Unsupported;
    };

    if host_matches(&host, VIDEO_HOST) || host_matches(&host, VIDEO_SHORT_HOST) {
        SiteKind::Video
    } else if host_matches(&host, IMAGE_SCRAPE_HOST) {
        SiteKind::ImageScrape
    } else if host_matches(&host, SHARDED_CATALOG_HOST) {
        SiteKind::ShardedCatalog
    } else {
        SiteKind::Unsupported
    }
}

/// Extracts the lowercased host of `url`, or `None` when it does not parse.
fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
}

/// Returns true if `host` contains the registered domain (subdomains included).
fn host_matches(host: &str, registered: &str) -> bool {
    host.contains(registered)
}
