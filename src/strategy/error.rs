//! Error taxonomy for retrieval strategies.
//!
//! Every variant is an expected failure mode reported per URL; the drain
//! loop downgrades all of them to log lines and notifications, never
//! aborting the batch.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of one retrieval attempt.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// No known site matches the URL.
    #[error("no retrieval strategy applies to '{url}'")]
    Unsupported { url: String },

    /// URL matched the catalog site but carries no product id.
    #[error("no product id found in catalog URL '{url}'")]
    NoProductId { url: String },

    /// Transport-level request failure (connect, timeout, TLS, body read).
    #[error("request for '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status.
    #[error("'{url}' returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// None of the candidate shard hosts answered with product metadata.
    #[error("no shard host answered for product {product_id}; metadata unavailable")]
    ShardNotFound { product_id: u64 },

    /// The accepted shard answered, but the metadata document was unusable.
    #[error("product metadata for {product_id} could not be parsed: {detail}")]
    BadMetadata { product_id: u64, detail: String },

    /// Product metadata lists no photos.
    #[error("product {product_id} lists no photos")]
    NoPhotos { product_id: u64 },

    /// The scraped page contains no image element.
    #[error("no image element found on '{url}'")]
    ImageNotFound { url: String },

    /// The external media engine reported failure.
    #[error("media engine failed: {detail}")]
    MediaEngine { detail: String },

    /// Destination file or directory could not be written.
    #[error("could not write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RetrieveError {
    /// Wraps a reqwest failure with the URL it was issued against.
    pub(crate) fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }

    /// Wraps a non-success status with the URL that produced it.
    pub(crate) fn status(url: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self::Status {
            url: url.into(),
            status: status.as_u16(),
        }
    }

    /// Wraps a filesystem failure with the path being written.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
