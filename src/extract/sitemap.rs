//! Sitemap fetching and `<loc>` extraction.

use crate::report::Reporter;
use crate::utils::truncate_for_log;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::{Client, StatusCode, header};
use tracing::{debug, instrument, warn};
use url::Url;

/// User agent sent with the sitemap request.
pub const SITEMAP_USER_AGENT: &str = "Mozilla/5.0";

/// Extensions of sitemap entries that point at images rather than pages.
pub const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Collect the text of every `<loc>` element, in document order.
///
/// Namespaced variants such as `<image:loc>` are included; they are dropped
/// later by the image filter. Parsing stops at the first malformed construct
/// and keeps whatever was collected before it.
pub fn parse_locs(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut locs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Ok(Event::Text(e)) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(buf) = current.as_mut() {
                    let name = String::from_utf8_lossy(&e);
                    match resolve_entity(&name) {
                        Some(c) => buf.push(c),
                        None => {
                            buf.push('&');
                            buf.push_str(&name);
                            buf.push(';');
                        }
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                if let Some(buf) = current.take() {
                    let loc = buf.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(
                    error = %e,
                    position = reader.buffer_position(),
                    collected = locs.len(),
                    "Malformed sitemap; keeping entries read so far"
                );
                break;
            }
            _ => {}
        }
    }
    locs
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Whether a sitemap entry points at an image, judged by its path (or by the
/// raw text when it is not a valid URL), case-insensitive.
pub fn is_image_url(loc: &str) -> bool {
    let path = match Url::parse(loc) {
        Ok(url) => url.path().to_lowercase(),
        Err(_) => loc.to_lowercase(),
    };
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Drop image entries and keep at most `max` of the rest, in document order.
pub fn select_page_urls(locs: Vec<String>, max: usize) -> Vec<String> {
    locs.into_iter()
        .filter(|loc| !is_image_url(loc))
        .take(max)
        .collect()
}

/// Fetch a sitemap and return its non-image `<loc>` entries.
///
/// Fails soft: a transport error or a non-200 status yields an empty list.
#[instrument(level = "info", skip(client, reporter), fields(%sitemap_url))]
pub async fn fetch_page_urls(
    client: &Client,
    sitemap_url: &Url,
    reporter: &dyn Reporter,
) -> Vec<String> {
    let res = match client
        .get(sitemap_url.clone())
        .header(header::USER_AGENT, SITEMAP_USER_AGENT)
        .send()
        .await
    {
        Ok(res) => res,
        Err(e) => {
            reporter.warn(
                "extract.sitemap_failed",
                &format!("Error fetching sitemap {sitemap_url}: {e}"),
            );
            return Vec::new();
        }
    };

    if res.status() != StatusCode::OK {
        reporter.warn(
            "extract.sitemap_failed",
            &format!(
                "Failed to fetch sitemap {sitemap_url}. Status code: {}",
                res.status().as_u16()
            ),
        );
        return Vec::new();
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(e) => {
            reporter.warn(
                "extract.sitemap_failed",
                &format!("Error reading sitemap {sitemap_url}: {e}"),
            );
            return Vec::new();
        }
    };
    debug!(preview = %truncate_for_log(&body, 200), "Sitemap body");

    let urls = select_page_urls(parse_locs(&body), usize::MAX);
    reporter.info(
        "extract.sitemap_fetched",
        &format!("{} URLs found in sitemap.", urls.len()),
    );
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url>
    <loc>https://example.com/</loc>
    <image:image><image:loc>https://example.com/hero.PNG</image:loc></image:image>
  </url>
  <url><loc> https://example.com/pricing </loc></url>
  <url><loc>https://example.com/search?q=a&amp;b=c</loc></url>
  <url><loc>https://example.com/logo.svg</loc></url>
</urlset>"#;

    #[test]
    fn test_parse_locs_document_order() {
        let locs = parse_locs(SITEMAP);
        assert_eq!(
            locs,
            vec![
                "https://example.com/",
                "https://example.com/hero.PNG",
                "https://example.com/pricing",
                "https://example.com/search?q=a&b=c",
                "https://example.com/logo.svg",
            ]
        );
    }

    #[test]
    fn test_parse_locs_malformed_keeps_prefix() {
        let xml = "<urlset><url><loc>https://a.com/1</loc></url><url><loc>https://a.com/2</url>";
        let locs = parse_locs(xml);
        assert_eq!(locs, vec!["https://a.com/1"]);
    }

    #[test]
    fn test_parse_locs_numeric_entities() {
        let xml = "<urlset><url><loc>https://a.com/caf&#233;?x=1&#x26;y=2</loc></url></urlset>";
        assert_eq!(parse_locs(xml), vec!["https://a.com/café?x=1&y=2"]);
    }

    #[test]
    fn test_is_image_url() {
        assert!(is_image_url("https://example.com/a.JPG"));
        assert!(is_image_url("https://example.com/a.webp?w=300"));
        assert!(is_image_url("/relative/pic.jpeg"));
        assert!(!is_image_url("https://example.com/gallery"));
        assert!(!is_image_url("https://example.com/png-guide"));
    }

    #[test]
    fn test_select_page_urls_counts() {
        // N entries, K images: result is min(N - K, max)
        for (pages, images) in [(0usize, 0usize), (3, 2), (5, 5), (9, 1)] {
            let mut locs = Vec::new();
            for i in 0..pages {
                locs.push(format!("https://example.com/page-{i}"));
            }
            for i in 0..images {
                locs.insert(i.min(locs.len()), format!("https://example.com/img-{i}.gif"));
            }
            let selected = select_page_urls(locs, 5);
            assert_eq!(selected.len(), pages.min(5));
            assert!(selected.iter().all(|u| !is_image_url(u)));
        }
    }

    #[test]
    fn test_select_page_urls_keeps_order() {
        let locs = (0..8).map(|i| format!("https://example.com/{i}")).collect();
        let selected = select_page_urls(locs, 5);
        assert_eq!(selected.first().map(String::as_str), Some("https://example.com/0"));
        assert_eq!(selected.last().map(String::as_str), Some("https://example.com/4"));
    }

    #[tokio::test]
    async fn test_fetch_page_urls_filters_images() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .and(header_eq("user-agent", SITEMAP_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(SITEMAP))
            .mount(&server)
            .await;

        let reporter = RecordingReporter::new();
        let url = Url::parse(&format!("{}/sitemap.xml", server.uri())).unwrap();
        let urls = fetch_page_urls(&Client::new(), &url, &reporter).await;

        assert_eq!(urls.len(), 3);
        assert_eq!(reporter.count("extract.sitemap_fetched"), 1);
    }

    #[tokio::test]
    async fn test_fetch_page_urls_non_200_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let reporter = RecordingReporter::new();
        let url = Url::parse(&format!("{}/sitemap.xml", server.uri())).unwrap();
        let urls = fetch_page_urls(&Client::new(), &url, &reporter).await;

        assert!(urls.is_empty());
        assert_eq!(reporter.kinds(), vec!["extract.sitemap_failed"]);
    }
}
