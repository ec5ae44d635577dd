//! Data models for website and campaign records.
//!
//! This module defines the record shapes exchanged with the tabular store:
//! - [`StoreRecord`]: A raw row as returned by the store (id + loose fields)
//! - [`WebsiteRecord`]: The typed view of a row in the websites table
//! - [`CampaignRecord`]: One generated campaign, ready to be created
//! - [`GenerationStatus`]: The tri-state `campaign_generated` flag
//!
//! Field names on the wire are the store's column names, exposed as the
//! `*_FIELD` constants.

use crate::config::ApiKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const WEBSITE_URL_FIELD: &str = "website_url";
pub const CAMPAIGN_PROMPT_FIELD: &str = "campaign_generation_prompt";
pub const EMAIL_PROMPT_FIELD: &str = "email_sequences_prompt";
pub const PAGE_PARSED_FIELD: &str = "page_parsed";
pub const CAMPAIGN_GENERATED_FIELD: &str = "campaign_generated";
pub const STORE_KEY_FIELD: &str = "airtable_api_key";
pub const LLM_KEY_FIELD: &str = "llm_api_key";

pub const WEBSITE_RECORD_ID_FIELD: &str = "website_record_id";
pub const CAMPAIGN_NAME_FIELD: &str = "campaign_name";
pub const EMAIL_SEQUENCES_FIELD: &str = "email_sequences";
pub const LINKEDIN_SEQUENCES_FIELD: &str = "linkedin_sequences";

/// Field values written to the store.
pub type Fields = BTreeMap<String, String>;

/// A row as returned by the store.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreRecord {
    /// Store-assigned record id.
    pub id: String,
    /// Column values; absent columns are simply missing.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl StoreRecord {
    /// Text value of a column, if present and a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// The `campaign_generated` flag on a website record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// Explicitly `"No"`: content has not been extracted yet.
    No,
    /// `"Yes"`: at least one batch of campaigns was saved.
    Yes,
    /// Missing, empty, or any other value.
    Unset,
}

impl GenerationStatus {
    /// Stored value for [`GenerationStatus::No`].
    pub const NO: &'static str = "No";
    /// Stored value for [`GenerationStatus::Yes`].
    pub const YES: &'static str = "Yes";

    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some(Self::NO) => GenerationStatus::No,
            Some(Self::YES) => GenerationStatus::Yes,
            _ => GenerationStatus::Unset,
        }
    }

    /// Only an explicit `"No"` triggers sitemap extraction and summarization.
    pub fn needs_content(&self) -> bool {
        matches!(self, GenerationStatus::No)
    }
}

/// Typed view of a websites-table row.
#[derive(Debug, Clone)]
pub struct WebsiteRecord {
    pub id: String,
    /// Sitemap URL, unvalidated.
    pub website_url: String,
    pub campaign_generation_prompt: Option<String>,
    pub email_sequences_prompt: Option<String>,
    /// Stored summary from an earlier run, if any.
    pub page_parsed: Option<String>,
    pub campaign_generated: GenerationStatus,
    /// Pass-through store credential.
    pub store_api_key: Option<ApiKey>,
    /// Pass-through LLM credential.
    pub llm_api_key: Option<ApiKey>,
}

impl WebsiteRecord {
    pub fn from_store(record: &StoreRecord) -> Self {
        let owned = |field: &str| {
            record
                .text(field)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };
        WebsiteRecord {
            id: record.id.clone(),
            website_url: record.text(WEBSITE_URL_FIELD).unwrap_or_default().to_string(),
            campaign_generation_prompt: owned(CAMPAIGN_PROMPT_FIELD),
            email_sequences_prompt: owned(EMAIL_PROMPT_FIELD),
            page_parsed: owned(PAGE_PARSED_FIELD),
            campaign_generated: GenerationStatus::from_field(record.text(CAMPAIGN_GENERATED_FIELD)),
            store_api_key: owned(STORE_KEY_FIELD).map(ApiKey::new),
            llm_api_key: owned(LLM_KEY_FIELD).map(ApiKey::new),
        }
    }
}

/// One generated campaign.
///
/// `email_sequences` and `linkedin_sequences` hold canonical JSON text; the
/// pipeline never looks inside them after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignRecord {
    pub website_record_id: String,
    pub campaign_name: String,
    pub email_sequences: String,
    pub linkedin_sequences: String,
}

impl CampaignRecord {
    pub fn to_fields(&self) -> Fields {
        Fields::from([
            (WEBSITE_RECORD_ID_FIELD.to_string(), self.website_record_id.clone()),
            (CAMPAIGN_NAME_FIELD.to_string(), self.campaign_name.clone()),
            (EMAIL_SEQUENCES_FIELD.to_string(), self.email_sequences.clone()),
            (LINKEDIN_SEQUENCES_FIELD.to_string(), self.linkedin_sequences.clone()),
        ])
    }
}

/// One post or email in a generated sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SequenceMessage {
    pub content: String,
}
