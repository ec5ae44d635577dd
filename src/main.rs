//! # Campaign Forge
//!
//! Turns a website's sitemap into ready-to-send marketing campaigns: the
//! site's pages are scraped and summarized by an LLM, new campaign topics are
//! proposed against the ones already stored, and every topic gets an email
//! sequence and a three-post LinkedIn series. Results land in Airtable.
//!
//! ## Usage
//!
//! ```sh
//! RECORD_ID=recXXXX AIRTABLE_API_KEY=pat... AIRTABLE_BASE_ID=app... campaign_forge
//! ```
//!
//! ## Architecture
//!
//! One run processes one website record:
//! 1. **Load**: Fetch the record and validate its prompts and LLM key
//! 2. **Extract**: Read up to five sitemap pages and summarize them (only while
//!    `campaign_generated` is `"No"`)
//! 3. **Generate**: Propose new topics, then email and LinkedIn sequences per topic
//! 4. **Persist**: Create campaign rows and flag the record as generated

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod extract;
mod generators;
mod models;
mod pipeline;
mod report;
mod store;
mod utils;

use api::OpenAiCompatClient;
use cli::Cli;
use config::{ApiKey, Settings};
use extract::SitemapExtractor;
use pipeline::{CampaignPipeline, Outcome, Tables};
use report::TracingReporter;
use store::AirtableStore;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("campaign_forge starting up");

    let args = Cli::parse();
    debug!(
        record_id = %args.record_id,
        websites_table = %args.websites_table,
        campaigns_table = %args.campaigns_table,
        "Parsed CLI arguments"
    );

    let settings = Settings::load(args.config.as_deref()).await?;

    let store = AirtableStore::new(
        &settings.store.base_url,
        &args.airtable_base_id,
        ApiKey::new(args.airtable_api_key),
    );
    let model = OpenAiCompatClient::new(settings.llm);
    let extractor = SitemapExtractor::default();
    let reporter = TracingReporter;
    let tables = Tables {
        websites: args.websites_table,
        campaigns: args.campaigns_table,
    };

    let pipeline = CampaignPipeline::new(&store, &extractor, &model, tables, &reporter);
    let summary = match pipeline.run(&args.record_id).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Campaign generation aborted");
            return Err(e.into());
        }
    };

    debug!(
        stage = ?summary.stage,
        summary_saved = summary.summary_saved,
        existing_campaigns = summary.existing_campaigns,
        campaigns = summary.campaigns.len(),
        "Run summary"
    );

    let elapsed = start_time.elapsed();
    match summary.outcome {
        Outcome::CampaignsSaved => info!(
            ?elapsed,
            record_id = %summary.record_id,
            topics = summary.topics,
            created = summary.created,
            failed = summary.create_failures,
            status_updated = summary.status_updated,
            "Execution complete"
        ),
        Outcome::NoNewCampaigns => info!(
            ?elapsed,
            record_id = %summary.record_id,
            extracted = summary.extracted,
            "Execution complete; no new campaigns"
        ),
    }

    Ok(())
}
