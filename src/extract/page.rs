//! Single-page fetching and visible text extraction.

use crate::report::Reporter;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode, header};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::instrument;

/// Desktop browser user agent sent with page requests.
pub const PAGE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Per-page request timeout.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Stand-in for a page that loaded but had no headings or paragraphs.
pub const NO_CONTENT_EXTRACTED: &str = "No content extracted.";

static HEADINGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3").expect("static heading selector"));
static PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static paragraph selector"));

/// Extract visible text: all `h1`-`h3` headings in document order, then all
/// paragraphs, each trimmed, joined with newlines. Empty elements are skipped.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&HEADINGS)
        .chain(document.select(&PARAGRAPHS))
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fetch one page and return its visible text.
///
/// `None` means the page could not be fetched (transport error, timeout, or a
/// non-200 status) and has already been reported.
#[instrument(level = "info", skip(client, reporter), fields(%url))]
pub async fn fetch_page_text(
    client: &Client,
    url: &str,
    timeout: Duration,
    reporter: &dyn Reporter,
) -> Option<String> {
    let res = client
        .get(url)
        .header(header::USER_AGENT, PAGE_USER_AGENT)
        .header(header::REFERER, url)
        .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
        .timeout(timeout)
        .send()
        .await;

    let res = match res {
        Ok(res) => res,
        Err(e) => {
            reporter.warn("extract.page_failed", &format!("Exception fetching {url}: {e}"));
            return None;
        }
    };

    if res.status() != StatusCode::OK {
        reporter.warn(
            "extract.page_failed",
            &format!("Failed to fetch page ({}): {url}", res.status().as_u16()),
        );
        return None;
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(e) => {
            reporter.warn("extract.page_failed", &format!("Exception reading {url}: {e}"));
            return None;
        }
    };

    let text = visible_text(&body);
    let text = if text.is_empty() {
        NO_CONTENT_EXTRACTED.to_string()
    } else {
        text
    };
    reporter.info(
        "extract.page_fetched",
        &format!("Extracted {} bytes from {url}", text.len()),
    );
    Some(text)
}
