//! LLM API interaction.
//!
//! This module talks to an OpenAI-compatible chat completion endpoint (Groq
//! by default).
//!
//! # Architecture
//!
//! - [`ChatModel`]: Core trait defining one completion call
//! - [`OpenAiCompatClient`]: `reqwest` implementation, constructed once per run
//! - [`complete_timed`]: Wraps any [`ChatModel`] call with timing logs
//!
//! The credential is passed per call rather than baked into the client, so a
//! single client can serve whatever key the website record supplies.

use crate::config::{ApiKey, LlmSettings};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// A single completion request.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub prompt: &'a str,
    /// Rendered as `You are a {role}.`
    pub system_role: &'a str,
    pub max_tokens: u32,
}

/// Trait for LLM text completion.
pub trait ChatModel {
    /// Send one prompt and return the trimmed response text.
    ///
    /// An empty string means the model answered with no text.
    async fn complete(&self, credential: &ApiKey, request: ChatRequest<'_>)
    -> Result<String, LlmError>;

    /// Default system role for requests built by the generators.
    fn system_role(&self) -> &str {
        crate::config::DEFAULT_SYSTEM_ROLE
    }

    /// Default output token bound for requests built by the generators.
    fn max_tokens(&self) -> u32 {
        crate::config::DEFAULT_MAX_TOKENS
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessageOwned,
}

#[derive(Deserialize)]
struct CompletionMessageOwned {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: Client,
    settings: LlmSettings,
}

impl OpenAiCompatClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

impl ChatModel for OpenAiCompatClient {
    #[instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    async fn complete(
        &self,
        credential: &ApiKey,
        request: ChatRequest<'_>,
    ) -> Result<String, LlmError> {
        let system = format!("You are a {}.", request.system_role);
        let body = CompletionRequest {
            model: &self.settings.model,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: &system,
                },
                CompletionMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
        };

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let parsed: CompletionResponse = res.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        debug!(bytes = text.len(), "Completion received");
        Ok(text.trim().to_string())
    }

    fn system_role(&self) -> &str {
        &self.settings.system_role
    }

    fn max_tokens(&self) -> u32 {
        self.settings.max_tokens
    }
}

/// Run one completion with the model's default role and token bound,
/// logging elapsed time.
#[instrument(level = "info", skip_all)]
pub async fn complete_timed<M: ChatModel>(
    model: &M,
    credential: &ApiKey,
    prompt: &str,
) -> Result<String, LlmError> {
    let t0 = Instant::now();
    let request = ChatRequest {
        prompt,
        system_role: model.system_role(),
        max_tokens: model.max_tokens(),
    };
    let res = model.complete(credential, request).await;
    let dt = t0.elapsed();

    match &res {
        Ok(text) => info!(
            elapsed_ms = dt.as_millis() as u64,
            bytes = text.len(),
            "LLM completion succeeded"
        ),
        Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "LLM completion failed"),
    }
    res
}
