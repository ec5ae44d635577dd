//! Campaign generation pipeline.
//!
//! Drives one website record from load to a terminal state in a single pass:
//!
//! ```text
//! LOADED ─┬─ campaign_generated == "No" ─► CONTENT_PENDING ─┐
//!         └─ otherwise ─────────────────► CONTENT_SKIPPED ──┴─► TOPICS_GENERATED
//!                                        ─► SEQUENCES_GENERATED ─► PERSISTED
//! ```
//!
//! Only a missing record id and a website record that cannot be loaded abort
//! the run. Every other failure, including unusable fields on the record, is
//! reported and turned into an empty or neutral value so the run always ends
//! in either "campaigns saved" or "no new campaigns generated".
//!
//! The record is loaded with the operator's store key. Every later store call
//! uses the record's own `airtable_api_key` when it has one.
//!
//! Campaign creation is at-least-once: names are deduplicated against the
//! store only when topics are generated, so re-running after a partially
//! failed batch may recreate campaigns that were already saved.

use crate::api::ChatModel;
use crate::config::{ApiKey, RunConfig};
use crate::extract::ContentSource;
use crate::generators::sequences::{SequenceError, generate_sequences};
use crate::generators::summarizer::summarize;
use crate::generators::topics::generate_topics;
use crate::models::{
    CAMPAIGN_GENERATED_FIELD, CAMPAIGN_NAME_FIELD, CampaignRecord, Fields, GenerationStatus,
    PAGE_PARSED_FIELD, StoreRecord, WEBSITE_RECORD_ID_FIELD, WebsiteRecord,
};
use crate::report::Reporter;
use crate::store::{RecordStore, StoreError};
use itertools::Itertools;
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub const DEFAULT_WEBSITES_TABLE: &str = "websites";
pub const DEFAULT_CAMPAIGNS_TABLE: &str = "campaigns_table";

/// Conditions that halt the pipeline before any campaign work.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing record id")]
    MissingRecordId,

    #[error("website record {0} not found")]
    RecordNotFound(String),

    #[error("failed to load website record {id}: {source}")]
    Load { id: String, source: StoreError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Loaded,
    ContentPending,
    ContentSkipped,
    TopicsGenerated,
    SequencesGenerated,
    Persisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one campaign was generated and submitted to the store.
    CampaignsSaved,
    /// Nothing to save; `campaign_generated` was left untouched.
    NoNewCampaigns,
}

/// What one run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub record_id: String,
    pub outcome: Outcome,
    pub stage: PipelineStage,
    /// Whether the content stage ran (extraction plus summary).
    pub extracted: bool,
    pub summary_saved: bool,
    pub existing_campaigns: usize,
    pub topics: usize,
    /// Campaigns that passed sequence validation, in topic order.
    pub campaigns: Vec<CampaignRecord>,
    pub created: usize,
    pub create_failures: usize,
    pub status_updated: bool,
}

/// Table names used by the pipeline.
#[derive(Debug, Clone)]
pub struct Tables {
    pub websites: String,
    pub campaigns: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            websites: DEFAULT_WEBSITES_TABLE.to_string(),
            campaigns: DEFAULT_CAMPAIGNS_TABLE.to_string(),
        }
    }
}

/// Whether a campaign row belongs to `record_id`. The foreign key may be a
/// plain id or a linked-record list of ids.
fn belongs_to(record: &StoreRecord, record_id: &str) -> bool {
    match record.fields.get(WEBSITE_RECORD_ID_FIELD) {
        Some(Value::String(id)) => id == record_id,
        Some(Value::Array(ids)) => ids.iter().any(|v| v.as_str() == Some(record_id)),
        _ => false,
    }
}

/// The pipeline's collaborators, borrowed for one run.
pub struct CampaignPipeline<'a, S, X, M> {
    store: &'a S,
    extractor: &'a X,
    model: &'a M,
    tables: Tables,
    reporter: &'a dyn Reporter,
}

impl<'a, S, X, M> CampaignPipeline<'a, S, X, M>
where
    S: RecordStore,
    X: ContentSource,
    M: ChatModel,
{
    pub fn new(
        store: &'a S,
        extractor: &'a X,
        model: &'a M,
        tables: Tables,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            store,
            extractor,
            model,
            tables,
            reporter,
        }
    }

    /// Run the pipeline for one website record.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self, record_id: &str) -> Result<RunSummary, PipelineError> {
        let t0 = Instant::now();
        let record_id = record_id.trim();
        if record_id.is_empty() {
            self.reporter
                .error("pipeline.failed", "Missing record_id; nothing to do.");
            return Err(PipelineError::MissingRecordId);
        }
        self.reporter
            .info("pipeline.started", &format!("Fetched Record ID: {record_id}"));

        let website = self.load_website(record_id).await?;
        let config = RunConfig::from_record(&website);
        for problem in &config.problems {
            self.reporter.warn("record.invalid_field", &problem.to_string());
        }
        let store_key = config.store_key.as_ref();
        let mut stage = PipelineStage::Loaded;
        debug!(?stage, status = ?website.campaign_generated, "Pipeline stage");

        let mut summary = RunSummary {
            record_id: record_id.to_string(),
            outcome: Outcome::NoNewCampaigns,
            stage,
            extracted: false,
            summary_saved: false,
            existing_campaigns: 0,
            topics: 0,
            campaigns: Vec::new(),
            created: 0,
            create_failures: 0,
            status_updated: false,
        };

        let page_summary = if website.campaign_generated.needs_content() {
            stage = PipelineStage::ContentPending;
            debug!(?stage, "Pipeline stage");
            summary.extracted = true;

            let content = match &config.sitemap_url {
                Some(sitemap_url) => self.extractor.extract(sitemap_url, self.reporter).await,
                None => {
                    self.reporter.warn(
                        "extract.sitemap_failed",
                        "No usable sitemap URL on the record; no pages to read.",
                    );
                    String::new()
                }
            };
            let summarized = match &config.llm_key {
                Some(key) => summarize(self.model, key, &content, self.reporter).await,
                None => {
                    self.reporter
                        .error("summary.failed", "No LLM key on the record; content not summarized.");
                    None
                }
            };
            match summarized {
                Some(text) => {
                    summary.summary_saved = self.save_summary(record_id, &text, store_key).await;
                    text
                }
                None => website.page_parsed.clone().unwrap_or_default(),
            }
        } else {
            stage = PipelineStage::ContentSkipped;
            debug!(?stage, "Pipeline stage");
            self.reporter.info(
                "content.already_parsed",
                "Page content already parsed and summarized.",
            );
            website.page_parsed.clone().unwrap_or_default()
        };

        let existing = self.existing_campaign_names(record_id, store_key).await;
        summary.existing_campaigns = existing.len();

        match &config.llm_key {
            Some(key) => {
                self.generate_campaigns(key, &config, &page_summary, &existing, &mut summary)
                    .await
            }
            None => self
                .reporter
                .warn("topics.failed", "No LLM key on the record; no topics generated."),
        }
        stage = PipelineStage::SequencesGenerated;
        debug!(?stage, campaigns = summary.campaigns.len(), "Pipeline stage");

        if summary.campaigns.is_empty() {
            summary.stage = stage;
            self.reporter
                .info("pipeline.completed", "No new campaigns generated.");
            info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Pipeline finished");
            return Ok(summary);
        }

        for campaign in &summary.campaigns {
            if self.save_campaign(campaign, store_key).await {
                summary.created += 1;
            } else {
                summary.create_failures += 1;
            }
        }
        summary.status_updated = self.mark_generated(record_id, store_key).await;
        stage = PipelineStage::Persisted;
        summary.stage = stage;
        summary.outcome = Outcome::CampaignsSaved;

        self.reporter.info(
            "pipeline.completed",
            &format!(
                "{} campaigns saved, {} failed.",
                summary.created, summary.create_failures
            ),
        );
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            created = summary.created,
            failed = summary.create_failures,
            "Pipeline finished"
        );
        Ok(summary)
    }

    async fn load_website(&self, record_id: &str) -> Result<WebsiteRecord, PipelineError> {
        let record = match self.store.get(&self.tables.websites, record_id, None).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.reporter.error("record.not_found", "No record found.");
                return Err(PipelineError::RecordNotFound(record_id.to_string()));
            }
            Err(source) => {
                self.reporter
                    .error("record.load_failed", &format!("Store connection error: {source}"));
                return Err(PipelineError::Load {
                    id: record_id.to_string(),
                    source,
                });
            }
        };
        self.reporter
            .info("record.loaded", "Website record fetched successfully!");
        Ok(WebsiteRecord::from_store(&record))
    }

    /// Topics for the summary, then both sequences per topic. Topics whose
    /// sequences fail are reported and dropped.
    async fn generate_campaigns(
        &self,
        key: &ApiKey,
        config: &RunConfig,
        page_summary: &str,
        existing: &[String],
        summary: &mut RunSummary,
    ) {
        let topics = generate_topics(
            self.model,
            key,
            &config.campaign_generation_prompt,
            page_summary,
            existing,
            self.reporter,
        )
        .await;
        summary.topics = topics.len();
        debug!(stage = ?PipelineStage::TopicsGenerated, topics = topics.len(), "Pipeline stage");

        for topic in &topics {
            match generate_sequences(
                self.model,
                key,
                &config.email_sequences_prompt,
                topic,
                self.reporter,
            )
            .await
            {
                Ok(sequences) => summary.campaigns.push(CampaignRecord {
                    website_record_id: summary.record_id.clone(),
                    campaign_name: topic.clone(),
                    email_sequences: sequences.email,
                    linkedin_sequences: sequences.linkedin,
                }),
                Err(e @ SequenceError::InvalidJson { .. }) => {
                    self.reporter
                        .error("sequences.invalid_json", &format!("{topic}: {e}"));
                }
                Err(e @ SequenceError::Completion { .. }) => {
                    self.reporter.error("sequences.failed", &format!("{topic}: {e}"));
                }
            }
        }
    }

    async fn save_summary(&self, record_id: &str, text: &str, key: Option<&ApiKey>) -> bool {
        let fields = Fields::from([(PAGE_PARSED_FIELD.to_string(), text.to_string())]);
        match self
            .store
            .update(&self.tables.websites, record_id, &fields, key)
            .await
        {
            Ok(_) => {
                self.reporter
                    .info("summary.saved", "Summary saved to the store successfully.");
                true
            }
            Err(e) => {
                self.reporter
                    .error("summary.save_failed", &format!("Failed to save summary: {e}"));
                false
            }
        }
    }

    /// Names of campaigns already stored for this record, first occurrence
    /// order. A failed listing is reported and treated as no campaigns.
    async fn existing_campaign_names(&self, record_id: &str, key: Option<&ApiKey>) -> Vec<String> {
        let records = match self.store.list(&self.tables.campaigns, key).await {
            Ok(records) => records,
            Err(e) => {
                self.reporter.error(
                    "campaigns.existing_failed",
                    &format!("Failed to fetch existing campaigns: {e}"),
                );
                return Vec::new();
            }
        };

        let names: Vec<String> = records
            .iter()
            .filter(|r| belongs_to(r, record_id))
            .filter_map(|r| r.text(CAMPAIGN_NAME_FIELD))
            .unique()
            .map(str::to_string)
            .collect();
        self.reporter.info(
            "campaigns.existing_loaded",
            &format!("{} existing campaigns found.", names.len()),
        );
        names
    }

    async fn save_campaign(&self, campaign: &CampaignRecord, key: Option<&ApiKey>) -> bool {
        match self
            .store
            .create(&self.tables.campaigns, &campaign.to_fields(), key)
            .await
        {
            Ok(_) => {
                self.reporter
                    .info("campaign.created", &format!("Saved: {}", campaign.campaign_name));
                true
            }
            Err(e) => {
                self.reporter.error(
                    "campaign.create_failed",
                    &format!("Failed to save {}: {e}", campaign.campaign_name),
                );
                false
            }
        }
    }

    async fn mark_generated(&self, record_id: &str, key: Option<&ApiKey>) -> bool {
        let fields = Fields::from([(
            CAMPAIGN_GENERATED_FIELD.to_string(),
            GenerationStatus::YES.to_string(),
        )]);
        match self
            .store
            .update(&self.tables.websites, record_id, &fields, key)
            .await
        {
            Ok(_) => {
                self.reporter
                    .info("record.status_updated", "Campaign status updated to 'Yes'.");
                true
            }
            Err(e) => {
                self.reporter.error(
                    "record.status_update_failed",
                    &format!("Failed to update campaign status: {e}"),
                );
                false
            }
        }
    }
}
