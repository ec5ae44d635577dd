//! Campaign topic generation and parsing.
//!
//! # Line grammar
//!
//! The LLM is asked for one topic per line. Each line of the response is
//! trimmed and then:
//!
//! - skipped when blank or when it contains `here are` (any case), which
//!   catches preamble such as "Here are 5 new campaign topics:"
//! - accepted when it starts with a marker: `-`, `•`, `*`, a number followed
//!   by `.` (`1.`, `12.`), or the literal `Topic:`; the rest of the line,
//!   trimmed, is the topic
//! - dropped otherwise
//!
//! Accepted topics equal (case-sensitive) to an existing campaign name are
//! dropped. Duplicates within one response are kept.

use crate::api::{ChatModel, complete_timed};
use crate::config::ApiKey;
use crate::report::Reporter;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

static TOPIC_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-•*]|\d+\.|Topic:)\s*(.*)").expect("static topic regex"));

pub fn topics_prompt(template: &str, summary: &str, existing: &[String]) -> String {
    let existing = if existing.is_empty() {
        "None".to_string()
    } else {
        existing.join("\n")
    };
    format!(
        "{template}\n\
         {summary}\n\n\
         Here are the existing campaigns that you should NOT generate again:\n\
         {existing}\n\n\
         Generate only **new, unique campaign topics** not in the above list.\n\
         Only provide topic names, one per line, with no additional details."
    )
}

/// Extract topics from a free-text LLM response, in line order.
pub fn parse_topics(text: &str, existing: &[String]) -> Vec<String> {
    let mut topics = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.to_lowercase().contains("here are") {
            continue;
        }
        let Some(caps) = TOPIC_LINE.captures(line) else {
            debug!(%line, "Line matches no topic marker");
            continue;
        };
        let topic = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if !topic.is_empty() && !existing.iter().any(|e| e == topic) {
            topics.push(topic.to_string());
        }
    }
    topics
}

/// Ask the LLM for new campaign topics that avoid `existing`.
///
/// Returns an empty list when the call fails or yields no text.
#[instrument(level = "info", skip_all, fields(existing = existing.len()))]
pub async fn generate_topics<M: ChatModel>(
    model: &M,
    credential: &ApiKey,
    template: &str,
    summary: &str,
    existing: &[String],
    reporter: &dyn Reporter,
) -> Vec<String> {
    let prompt = topics_prompt(template, summary, existing);
    let text = match complete_timed(model, credential, &prompt).await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => {
            reporter.warn("topics.failed", "LLM returned no campaign topics.");
            return Vec::new();
        }
        Err(e) => {
            reporter.warn("topics.failed", &format!("Topic generation error: {e}"));
            return Vec::new();
        }
    };

    let topics = parse_topics(&text, existing);
    reporter.info(
        "topics.generated",
        &format!("{} new campaign topics generated.", topics.len()),
    );
    topics
}
