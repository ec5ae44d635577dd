//! Website content extraction.
//!
//! Turns a sitemap URL into one text buffer suitable for summarization.
//! Extraction follows a two-phase pattern:
//!
//! 1. **Indexing** ([`sitemap`]): fetch the sitemap, collect `<loc>` entries,
//!    drop images, keep the first [`MAX_PAGES`]
//! 2. **Fetching** ([`page`]): download each page and pull its heading and
//!    paragraph text
//!
//! Page texts are then accumulated under a per-page header line until the
//! buffer holds [`WORD_CAP`] words. Every failure along the way is reported
//! and skipped; an empty buffer means no content was available.

pub mod page;
pub mod sitemap;

use crate::report::Reporter;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Hard cap on pages fetched per sitemap.
pub const MAX_PAGES: usize = 5;

/// Soft cap on accumulated words.
pub const WORD_CAP: usize = 1000;

/// Source of site content for the summarizer.
pub trait ContentSource {
    /// Produce the accumulated page text for a sitemap, or an empty string
    /// when nothing could be extracted.
    async fn extract(&self, sitemap_url: &Url, reporter: &dyn Reporter) -> String;
}

/// Append page texts under `Content from {url}:` headers while the buffer is
/// below `word_cap` words.
///
/// The cap is checked before each append, so the last page appended may push
/// the total past it. Pages with no text (`None`) are skipped.
pub fn accumulate(pages: &[(String, Option<String>)], word_cap: usize) -> String {
    let mut buffer = String::new();
    for (url, text) in pages {
        let Some(text) = text else {
            continue;
        };
        if crate::utils::word_count(&buffer) >= word_cap {
            debug!(%url, "Word cap reached; page text not accumulated");
            continue;
        }
        buffer.push_str(&format!("\n---\nContent from {url}:\n{text}\n"));
    }
    buffer
}

/// Sitemap-driven extractor over HTTP.
#[derive(Debug, Clone)]
pub struct SitemapExtractor {
    client: Client,
    max_pages: usize,
    word_cap: usize,
    page_timeout: Duration,
}

impl Default for SitemapExtractor {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl SitemapExtractor {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_pages: MAX_PAGES,
            word_cap: WORD_CAP,
            page_timeout: page::PAGE_TIMEOUT,
        }
    }
}

impl ContentSource for SitemapExtractor {
    #[instrument(level = "info", skip(self, reporter), fields(%sitemap_url))]
    async fn extract(&self, sitemap_url: &Url, reporter: &dyn Reporter) -> String {
        let urls = sitemap::fetch_page_urls(&self.client, sitemap_url, reporter).await;
        if !urls.is_empty() {
            reporter.info(
                "extract.pages_selected",
                &format!(
                    "{} URLs found. Extracting content from the first {}.",
                    urls.len(),
                    urls.len().min(self.max_pages)
                ),
            );
        }

        // Pages are fetched one at a time, in sitemap order.
        let pages: Vec<(String, Option<String>)> = stream::iter(urls.into_iter().take(self.max_pages))
            .then(|url| async move {
                let text =
                    page::fetch_page_text(&self.client, &url, self.page_timeout, reporter).await;
                (url, text)
            })
            .collect()
            .await;

        let content = accumulate(&pages, self.word_cap);
        reporter.info(
            "extract.completed",
            &format!(
                "Extraction complete: {} pages read, {} words kept.",
                pages.iter().filter(|(_, text)| text.is_some()).count(),
                crate::utils::word_count(&content)
            ),
        );
        content
    }
}
