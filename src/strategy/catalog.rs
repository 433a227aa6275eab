//! Sharded catalog-image retrieval.
//!
//! Product metadata and images live on one host out of a fixed pool of 100
//! numbered shards; the assignment is not computable from the product id, so
//! the correct shard must be discovered by probing. Probing is a plain
//! bounded loop in strictly ascending host order with an accept-and-break on
//! the first HTTP 200; shard acceptance may depend on that ordering, so it
//! is never parallelized.
//!
//! Routing values derive from floor division on the decimal product id:
//! `vol = id / 100_000`, `part = id / 1_000` (the vendor's documented rule).

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::classify::SiteKind;
use crate::util::compile_static_regex;

use super::error::RetrieveError;
use super::Strategy;

/// Numeric product id embedded in the catalog URL path.
static PRODUCT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"/catalog/(\d+)/"));

/// Characters stripped from product titles before they become directories.
const ILLEGAL_TITLE_CHARS: &str = "\\/:*?\"<>|";

const BASKET_DOMAIN: &str = "wbbasket.ru";
const HOST_POOL_SIZE: usize = 100;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Product metadata document served by the accepted shard.
#[derive(Debug, Deserialize)]
struct ProductCard {
    imt_name: Option<String>,
    media: Option<ProductMedia>,
}

#[derive(Debug, Deserialize)]
struct ProductMedia {
    photo_count: Option<u32>,
}

/// Routing values shared by every URL built for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShardRouting {
    volume: u64,
    part: u64,
}

impl ShardRouting {
    fn for_product(product_id: u64) -> Self {
        Self {
            volume: product_id / 100_000,
            part: product_id / 1_000,
        }
    }
}

/// Retrieves every product image from the sharded catalog site.
pub struct CatalogStrategy {
    client: Client,
    hosts: Vec<String>,
}

impl CatalogStrategy {
    /// Uses the production pool of 100 numbered basket hosts.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_hosts(client, default_basket_hosts())
    }

    /// Uses an explicit host pool; tests point every entry at a stub server.
    #[must_use]
    pub fn with_hosts(client: Client, hosts: Vec<String>) -> Self {
        Self { client, hosts }
    }

    /// Probes the host pool in ascending order and accepts the first shard
    /// answering HTTP 200; the accepted host serves all later image fetches.
    async fn discover_card(
        &self,
        product_id: u64,
        routing: ShardRouting,
    ) -> Result<(String, ProductCard), RetrieveError> {
        for host in &self.hosts {
            let card_url = format!(
                "{host}/vol{vol}/part{part}/{product_id}/info/ru/card.json",
                vol = routing.volume,
                part = routing.part,
            );
            let response = match self
                .client
                .get(&card_url)
                .timeout(PROBE_TIMEOUT)
                .send()
                .await
            {
                Ok(response) => response,
                Err(error) => {
                    debug!(card_url = %card_url, %error, "shard probe failed");
                    continue;
                }
            };
            if response.status() != StatusCode::OK {
                debug!(card_url = %card_url, status = %response.status(), "shard probe miss");
                continue;
            }

            // First 200 is authoritative; a bad body here is a retrieval
            // failure, not a reason to keep probing.
            let card = response
                .json::<ProductCard>()
                .await
                .map_err(|error| RetrieveError::BadMetadata {
                    product_id,
                    detail: error.to_string(),
                })?;
            return Ok((host.clone(), card));
        }

        Err(RetrieveError::ShardNotFound { product_id })
    }

    async fn fetch_image(&self, img_url: &str) -> Result<Vec<u8>, RetrieveError> {
        let response = self
            .client
            .get(img_url)
            .timeout(IMAGE_TIMEOUT)
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
impl Strategy for CatalogStrategy {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn kind(&self) -> SiteKind {
        SiteKind::ShardedCatalog
    }

    #[instrument(skip(self, dest), fields(url = %url))]
    async fn retrieve(&self, url: &str, dest: &Path) -> Result<String, RetrieveError> {
        let product_id = extract_product_id(url).ok_or_else(|| RetrieveError::NoProductId {
            url: url.to_string(),
        })?;
        let routing = ShardRouting::for_product(product_id);

        let (host, card) = self.discover_card(product_id, routing).await?;
        debug!(host = %host, product_id, "shard accepted");

        let title = card
            .imt_name
            .unwrap_or_else(|| format!("wb_{product_id}"));
        let mut dir_name = sanitize_title(&title);
        if dir_name.is_empty() {
            dir_name = format!("wb_{product_id}");
        }
        let product_dir = dest.join(dir_name);
        tokio::fs::create_dir_all(&product_dir)
            .await
            .map_err(|source| RetrieveError::io(&product_dir, source))?;

        let photo_count = card.media.and_then(|media| media.photo_count).unwrap_or(0);
        if photo_count == 0 {
            return Err(RetrieveError::NoPhotos { product_id });
        }

        let mut saved = 0_u32;
        for index in 1..=photo_count {
            let img_url = format!(
                "{host}/vol{vol}/part{part}/{product_id}/images/big/{index}.webp",
                vol = routing.volume,
                part = routing.part,
            );
            let bytes = match self.fetch_image(&img_url).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(img_url = %img_url, %error, "product image skipped");
                    continue;
                }
            };
            let out_path = product_dir.join(format!("{index}.webp"));
            match tokio::fs::write(&out_path, &bytes).await {
                Ok(()) => saved += 1,
                Err(error) => warn!(path = %out_path.display(), %error, "image write skipped"),
            }
        }

        Ok(format!(
            "saved {saved}/{photo_count} images to {}",
            product_dir.display()
        ))
    }
}

/// Production host pool: `basket-00` through `basket-99`, ascending.
fn default_basket_hosts() -> Vec<String> {
    (0..HOST_POOL_SIZE)
        .map(|index| format!("https://basket-{index:02}.{BASKET_DOMAIN}"))
        .collect()
}

/// Extracts the numeric product id from the catalog URL path.
fn extract_product_id(url: &str) -> Option<u64> {
    PRODUCT_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|id| id.as_str().parse().ok())
}

/// Strips filesystem-illegal characters from a product title.
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !ILLEGAL_TITLE_CHARS.contains(*c))
        .collect()
}
