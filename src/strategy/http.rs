//! Shared HTTP client construction policy for scraping strategies.
//!
//! Centralizes the networking defaults so both scraping strategies stay
//! consistent on connect timeout, user-agent, and compression. Per-request
//! read timeouts differ between metadata probes and image fetches, so they
//! are applied at the request site, not here.

use std::time::Duration;

use reqwest::Client;

/// Browser-style user agent; the scraped sites reject bare library UAs.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Builds the HTTP client shared by the scraping strategies.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when client construction fails;
/// this is an unrecoverable setup failure, not a per-URL outcome.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(BROWSER_USER_AGENT)
        .gzip(true)
        .build()
}
