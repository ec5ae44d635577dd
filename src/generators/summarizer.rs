//! Site content summarization.

use crate::api::{ChatModel, complete_timed};
use crate::config::ApiKey;
use crate::report::Reporter;
use tracing::instrument;

/// Marker that upstream content is known to be empty.
pub const NO_CONTENT_SENTINEL: &str = "No meaningful content found";

/// Summary returned without an LLM call when there is nothing to summarize.
pub const NO_CONTENT_SUMMARY: &str = "No content available to summarize.";

pub fn summary_prompt(content: &str) -> String {
    format!(
        "You are a professional content summarizer.\n\n\
         Summarize the following content into a concise, clear, and insightful overview:\n\n\
         {content}\n\n\
         Provide a detailed summary highlighting key points, product overviews, and relevant information."
    )
}

/// Summarize extracted site content.
///
/// Blank or sentinel content short-circuits to [`NO_CONTENT_SUMMARY`]. `None`
/// means the LLM call failed or returned no text.
#[instrument(level = "info", skip_all, fields(bytes = content.len()))]
pub async fn summarize<M: ChatModel>(
    model: &M,
    credential: &ApiKey,
    content: &str,
    reporter: &dyn Reporter,
) -> Option<String> {
    if content.trim().is_empty() || content.contains(NO_CONTENT_SENTINEL) {
        reporter.warn(
            "summary.skipped",
            "No meaningful content extracted from the sitemap.",
        );
        return Some(NO_CONTENT_SUMMARY.to_string());
    }

    reporter.info("summary.started", "Summarizing extracted content...");
    match complete_timed(model, credential, &summary_prompt(content)).await {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => {
            reporter.error("summary.failed", "LLM returned an empty summary.");
            None
        }
        Err(e) => {
            reporter.error("summary.failed", &format!("Summary generation error: {e}"));
            None
        }
    }
}
