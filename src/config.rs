//! Runtime configuration.
//!
//! Two layers:
//! - [`Settings`]: endpoint and model settings, optionally loaded from a
//!   YAML file passed with `--config`. Every key has a default.
//! - [`RunConfig`]: per-run values taken from the website record and
//!   read once at pipeline entry. Problems are reported, never fatal.

use crate::models::{
    CAMPAIGN_PROMPT_FIELD, EMAIL_PROMPT_FIELD, LLM_KEY_FIELD, WEBSITE_URL_FIELD, WebsiteRecord,
};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_SYSTEM_ROLE: &str = "Marketing Strategist";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_STORE_BASE_URL: &str = "https://api.airtable.com/v0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("website record {record_id} is missing `{field}`")]
    MissingField {
        record_id: String,
        field: &'static str,
    },

    #[error("website record {record_id} has an invalid sitemap URL {value:?}: {source}")]
    InvalidSitemapUrl {
        record_id: String,
        value: String,
        source: url::ParseError,
    },
}

/// An API credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// LLM endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    pub model: String,
    /// Rendered into the system message as `You are a {role}.`
    pub system_role: String,
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            system_role: DEFAULT_SYSTEM_ROLE.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Tabular store endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub base_url: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STORE_BASE_URL.to_string(),
        }
    }
}

/// Contents of the optional YAML settings file.
///
/// ```yaml
/// llm:
///   base_url: https://api.groq.com/openai/v1
///   model: llama3-70b-8192
///   system_role: Marketing Strategist
///   max_tokens: 4000
/// store:
///   base_url: https://api.airtable.com/v0
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub store: StoreSettings,
}

impl Settings {
    pub fn from_yaml(path: &str, text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load settings from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = tokio::fs::read_to_string(Path::new(path))
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let settings = Self::from_yaml(path, &text)?;
        info!(model = %settings.llm.model, llm = %settings.llm.base_url, "Loaded settings");
        Ok(settings)
    }
}

/// Per-run configuration derived from a website record.
///
/// Building one never fails. An unusable field is recorded in `problems`
/// and replaced by a neutral value, so the run can still finish.
#[derive(Debug)]
pub struct RunConfig {
    /// Parsed sitemap URL; `None` when extraction is skipped for this run or
    /// the record's URL is blank or unparseable.
    pub sitemap_url: Option<Url>,
    /// Empty when the record has no template.
    pub campaign_generation_prompt: String,
    /// Empty when the record has no template.
    pub email_sequences_prompt: String,
    /// `None` disables every LLM-backed step.
    pub llm_key: Option<ApiKey>,
    /// Record-scoped store credential. `None` means the operator key.
    pub store_key: Option<ApiKey>,
    pub problems: Vec<ConfigError>,
}

impl RunConfig {
    /// Read the record's loosely-typed fields.
    ///
    /// The sitemap URL is only looked at when the record still needs content
    /// extraction.
    pub fn from_record(record: &WebsiteRecord) -> Self {
        let mut problems = Vec::new();
        let missing = |field: &'static str| ConfigError::MissingField {
            record_id: record.id.clone(),
            field,
        };

        let mut sitemap_url = None;
        if record.campaign_generated.needs_content() {
            let raw = record.website_url.trim();
            if raw.is_empty() {
                problems.push(missing(WEBSITE_URL_FIELD));
            } else {
                match Url::parse(raw) {
                    Ok(url) => sitemap_url = Some(url),
                    Err(source) => problems.push(ConfigError::InvalidSitemapUrl {
                        record_id: record.id.clone(),
                        value: raw.to_string(),
                        source,
                    }),
                }
            }
        }

        let campaign_generation_prompt = record.campaign_generation_prompt.clone();
        if campaign_generation_prompt.is_none() {
            problems.push(missing(CAMPAIGN_PROMPT_FIELD));
        }
        let email_sequences_prompt = record.email_sequences_prompt.clone();
        if email_sequences_prompt.is_none() {
            problems.push(missing(EMAIL_PROMPT_FIELD));
        }
        let llm_key = record.llm_api_key.clone();
        if llm_key.is_none() {
            problems.push(missing(LLM_KEY_FIELD));
        }

        RunConfig {
            sitemap_url,
            campaign_generation_prompt: campaign_generation_prompt.unwrap_or_default(),
            email_sequences_prompt: email_sequences_prompt.unwrap_or_default(),
            llm_key,
            store_key: record.store_api_key.clone(),
            problems,
        }
    }
}
