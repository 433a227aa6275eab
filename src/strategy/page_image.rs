//! First-inline-image page scrape.
//!
//! Fetches the page HTML, selects the first `<img>` element, downloads its
//! `src` target, and writes it under the destination named after the image
//! URL's basename with any query string stripped.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::classify::SiteKind;
use crate::util::{absolutize_url, basename_without_query, compile_static_regex};

use super::error::RetrieveError;
use super::Strategy;

/// First `src` attribute of the first `<img>` tag on the page.
static IMG_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)<img[^>]+src\s*=\s*["']([^"']+)["']"#));

/// Fallback filename when the image URL yields no usable basename.
const FALLBACK_IMAGE_NAME: &str = "image";

/// Scrapes the first inline image from a page.
pub struct PageImageStrategy {
    client: Client,
}

impl PageImageStrategy {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_page(&self, url: &str) -> Result<(Url, String), RetrieveError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| RetrieveError::http(url, source))?;
        if !response.status().is_success() {
            return Err(RetrieveError::status(url, response.status()));
        }
        // Redirects may have moved us; relative img paths resolve against
        // the final URL, not the input.
        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|source| RetrieveError::http(url, source))?;
        Ok((final_url, html))
    }

    async fn fetch_image_bytes(&self, img_url: &str) -> Result<Vec<u8>, RetrieveError> {
        let response = self
            .client
            .get(img_url)
            .send()
            .await
            .map_err(|source| RetrieveError::http(img_url, source))?;
        if !response.status().is_success() {
            return Err(RetrieveError::status(img_url, response.status()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| RetrieveError::http(img_url, source))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Strategy for PageImageStrategy {
    fn name(&self) -> &'static str {
        "page-image"
    }

    fn kind(&self) -> SiteKind {
        SiteKind::ImageScrape
    }

    #[instrument(skip(self, dest), fields(url = %url))]
    async fn retrieve(&self, url: &str, dest: &Path) -> Result<String, RetrieveError> {
        let (final_url, html) = self.fetch_page(url).await?;

        let src = IMG_SRC_RE
            .captures(&html)
            .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
            .ok_or_else(|| RetrieveError::ImageNotFound {
                url: url.to_string(),
            })?;
        let img_url =
            absolutize_url(&src, &final_url).ok_or_else(|| RetrieveError::ImageNotFound {
                url: url.to_string(),
            })?;
        debug!(img_url = %img_url, "scraped image URL");

        let bytes = self.fetch_image_bytes(&img_url).await?;

        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|source| RetrieveError::io(dest, source))?;
        let out_path = dest.join(basename_without_query(&img_url, FALLBACK_IMAGE_NAME));
        tokio::fs::write(&out_path, &bytes)
            .await
            .map_err(|source| RetrieveError::io(&out_path, source))?;

        Ok(format!("saved {}", out_path.display()))
    }
}
