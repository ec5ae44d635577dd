//! Email and LinkedIn sequence generation for one campaign topic.
//!
//! Both sequences are requested independently and must parse as JSON. The
//! stored text is the canonical re-serialization (compact, object keys
//! sorted), not the raw LLM output.

use crate::api::{ChatModel, LlmError, complete_timed};
use crate::config::ApiKey;
use crate::models::SequenceMessage;
use crate::report::Reporter;
use crate::utils::{looks_truncated, truncate_for_log};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{instrument, warn};

/// Number of posts requested for the LinkedIn series.
pub const LINKEDIN_POSTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Email,
    Linkedin,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceKind::Email => f.write_str("email"),
            SequenceKind::Linkedin => f.write_str("LinkedIn"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("Invalid JSON format in {kind} sequence: {source}")]
    InvalidJson {
        kind: SequenceKind,
        source: serde_json::Error,
    },

    #[error("{kind} sequence generation failed: {source}")]
    Completion {
        kind: SequenceKind,
        source: LlmError,
    },
}

/// Validated sequences for one topic, as canonical JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequences {
    pub email: String,
    pub linkedin: String,
}

pub fn email_prompt(template: &str, topic: &str) -> String {
    format!("{template} {topic}")
}

pub fn linkedin_prompt(topic: &str) -> String {
    format!(
        "Create a 3-part LinkedIn post series for the topic below in **valid JSON format only** with no comments.\n\
         Output must start and end with `[` and `]`.\n\n\
         **Topic:** {topic}\n\n\
         **JSON Format:**\n\
         [\n\
         {{\"content\": \"First LinkedIn post with CTA\"}},\n\
         {{\"content\": \"Second LinkedIn post with insights\"}},\n\
         {{\"content\": \"Third LinkedIn post with a strong CTA\"}}\n\
         ]"
    )
}

fn parse(kind: SequenceKind, text: &str) -> Result<Value, SequenceError> {
    serde_json::from_str(text).map_err(|source| {
        warn!(
            %kind,
            truncated = looks_truncated(&source),
            response_preview = %truncate_for_log(text, 300),
            "Sequence response is not valid JSON"
        );
        SequenceError::InvalidJson { kind, source }
    })
}

/// Whether a value is a non-empty array of `{"content": string}` objects.
fn messages(value: &Value) -> Option<Vec<SequenceMessage>> {
    serde_json::from_value::<Vec<SequenceMessage>>(value.clone())
        .ok()
        .filter(|m| !m.is_empty())
}

/// Generate and validate both sequences for `topic`.
///
/// Either response failing to parse fails the whole topic. Shape deviations
/// (not an array of message objects, wrong LinkedIn post count) are only
/// reported.
#[instrument(level = "info", skip(model, credential, template, reporter))]
pub async fn generate_sequences<M: ChatModel>(
    model: &M,
    credential: &ApiKey,
    template: &str,
    topic: &str,
    reporter: &dyn Reporter,
) -> Result<Sequences, SequenceError> {
    reporter.info(
        "sequences.generating",
        &format!("Generating sequences for: {topic}"),
    );

    // Both requests are always issued; failures are only looked at afterwards.
    let email_res = complete_timed(model, credential, &email_prompt(template, topic)).await;
    let linkedin_res = complete_timed(model, credential, &linkedin_prompt(topic)).await;

    let email_text = email_res.map_err(|source| SequenceError::Completion {
        kind: SequenceKind::Email,
        source,
    })?;
    let linkedin_text = linkedin_res.map_err(|source| SequenceError::Completion {
        kind: SequenceKind::Linkedin,
        source,
    })?;

    let email = parse(SequenceKind::Email, &email_text)?;
    let linkedin = parse(SequenceKind::Linkedin, &linkedin_text)?;

    if messages(&email).is_none() {
        reporter.warn(
            "sequences.unexpected_shape",
            &format!("Email sequence for {topic} is not a list of messages."),
        );
    }
    match messages(&linkedin) {
        Some(posts) if posts.len() == LINKEDIN_POSTS => {}
        _ => reporter.warn(
            "sequences.unexpected_shape",
            &format!("LinkedIn sequence for {topic} is not {LINKEDIN_POSTS} posts."),
        ),
    }

    Ok(Sequences {
        email: email.to_string(),
        linkedin: linkedin.to_string(),
    })
}
