use std::path::PathBuf;

use anyhow::Context;
use scraper::{Html, Selector};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::config::CONFIG;
use crate::utils::http::get_http_client;

/// Substring-matched against image URLs, deliberately permissive so query
/// strings and cache-buster suffixes still qualify.
pub const RECOGNIZED_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to fetch the page (status code: {0})")]
    Status(reqwest::StatusCode),
    #[error("error scraping images: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("no images found on the page")]
    NoImages,
}

/// An image URL lifted from a gallery page, already resolved to an absolute
/// form. Lives only as long as the caller's selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub url: String,
}

impl ImageReference {
    /// Extension inferred from the URL alone: `.png` is checked before
    /// `.jpeg`, with `.jpg` as the fallback. Substring checks, so the
    /// priority order matters when a URL mentions more than one extension.
    pub fn extension(&self) -> &'static str {
        let lowered = self.url.to_ascii_lowercase();
        if lowered.contains(".png") {
            "png"
        } else if lowered.contains(".jpeg") {
            "jpeg"
        } else {
            "jpg"
        }
    }
}

fn has_recognized_extension(src: &str) -> bool {
    let lowered = src.to_ascii_lowercase();
    RECOGNIZED_EXTENSIONS
        .iter()
        .any(|extension| lowered.contains(extension))
}

/// Pulls qualifying `<img src>` values out of gallery markup, in document
/// order, without de-duplication. Scheme-less references get the fixed site
/// origin prefixed rather than full resolution against the page base.
fn extract_image_urls(html: &str, origin: &str) -> Vec<ImageReference> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img").expect("valid img selector");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| has_recognized_extension(src))
        .map(|src| {
            let url = if src.starts_with("http") {
                src.to_string()
            } else {
                format!("{origin}{src}")
            };
            ImageReference { url }
        })
        .collect()
}

/// Fetches a gallery page and returns every qualifying image reference on
/// it. Transport failures and non-2xx statuses come back as error values;
/// a page without any qualifying image is `ScrapeError::NoImages`.
pub async fn scrape_images(page_url: &str) -> Result<Vec<ImageReference>, ScrapeError> {
    // Reject malformed input before any network work.
    Url::parse(page_url)?;

    let response = get_http_client().get(page_url).send().await?;
    if !response.status().is_success() {
        return Err(ScrapeError::Status(response.status()));
    }

    let body = response.text().await?;
    let images = extract_image_urls(&body, &CONFIG.gallery_origin);
    debug!("Scraped {} image reference(s) from {page_url}", images.len());

    if images.is_empty() {
        return Err(ScrapeError::NoImages);
    }
    Ok(images)
}

/// Streams one image to a fresh temporary file and returns its path. Any
/// failure is logged and swallowed: the caller treats `None` as "skip this
/// item" and carries on with the rest of the batch.
pub async fn download_image(image_url: &str) -> Option<PathBuf> {
    match try_download(image_url).await {
        Ok(path) => Some(path),
        Err(err) => {
            warn!("Failed to download image {image_url}: {err:#}");
            None
        }
    }
}

async fn try_download(image_url: &str) -> anyhow::Result<PathBuf> {
    let reference = ImageReference {
        url: image_url.to_string(),
    };

    let mut response = get_http_client().get(image_url).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("status code {}", response.status());
    }

    let temp_file = tempfile::Builder::new()
        .prefix("gallery-")
        .suffix(&format!(".{}", reference.extension()))
        .tempfile()
        .context("failed to create temporary file")?;
    // The caller renames the file into its numbered slot, so it must
    // outlive the handle.
    let (file, path) = temp_file
        .keep()
        .context("failed to persist temporary file")?;

    let mut file = tokio::fs::File::from_std(file);
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(path)
}
