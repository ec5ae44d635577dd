//! Command-line interface definitions for Campaign Forge.
//!
//! Every option can be provided as a flag or through an environment
//! variable, so the binary can run unattended from a scheduler or webhook
//! runner that only sets `RECORD_ID`.

use clap::Parser;

use crate::pipeline::{DEFAULT_CAMPAIGNS_TABLE, DEFAULT_WEBSITES_TABLE};

/// Command-line arguments for one pipeline run.
///
/// # Examples
///
/// ```sh
/// # Credentials from the environment
/// RECORD_ID=recXXXX campaign_forge
///
/// # Custom tables and an LLM config file
/// campaign_forge -r recXXXX --campaigns-table campaigns -c ./config.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Website record to process
    #[arg(short, long, env = "RECORD_ID", default_value = "")]
    pub record_id: String,

    /// Airtable personal access token
    #[arg(long, env = "AIRTABLE_API_KEY", hide_env_values = true)]
    pub airtable_api_key: String,

    /// Airtable base id
    #[arg(long, env = "AIRTABLE_BASE_ID")]
    pub airtable_base_id: String,

    /// Table holding website records
    #[arg(long, env = "WEBSITES_TABLE", default_value = DEFAULT_WEBSITES_TABLE)]
    pub websites_table: String,

    /// Table receiving generated campaigns
    #[arg(long, env = "CAMPAIGNS_TABLE", default_value = DEFAULT_CAMPAIGNS_TABLE)]
    pub campaigns_table: String,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,
}
