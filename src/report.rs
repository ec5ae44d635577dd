//! Progress and diagnostic event reporting.
//!
//! Each pipeline component receives a `&dyn Reporter` and describes the
//! outcome of every step through it instead of writing to a UI directly.
//! Events carry a dotted `event_kind` so they can be filtered or forwarded.
//!
//! # Events
//!
//! | Event Kind | Level | Description |
//! |------------|-------|-------------|
//! | `pipeline.started` | info | Record id accepted, run begins |
//! | `pipeline.failed` | error | Run refused: no record id |
//! | `record.loaded` | info | Website record fetched from the store |
//! | `record.not_found` / `record.load_failed` | error | Run aborted before any work |
//! | `record.invalid_field` | warn | Unusable record field replaced by a neutral value |
//! | `extract.sitemap_fetched` | info | Sitemap parsed, page URLs counted |
//! | `extract.pages_selected` | info | Page URLs capped for fetching |
//! | `extract.sitemap_failed` | warn | Sitemap unavailable; no pages to read |
//! | `extract.page_fetched` | info | One page scraped |
//! | `extract.page_failed` | warn | One page skipped |
//! | `extract.completed` | info | Accumulated buffer ready |
//! | `summary.skipped` | warn | No meaningful content to summarize |
//! | `summary.started` | info | Summary LLM call issued |
//! | `summary.failed` | error | LLM call failed while summarizing |
//! | `summary.saved` / `summary.save_failed` | info / error | `page_parsed` write |
//! | `content.already_parsed` | info | Extraction short-circuited |
//! | `campaigns.existing_loaded` / `campaigns.existing_failed` | info / error | Existing names |
//! | `topics.generated` / `topics.failed` | info / warn | Topic generation |
//! | `sequences.generating` | info | Sequence generation for one topic |
//! | `sequences.invalid_json` / `sequences.failed` | error | Topic dropped |
//! | `sequences.unexpected_shape` | warn | Parsed, but not the requested shape |
//! | `campaign.created` / `campaign.create_failed` | info / error | One campaign write |
//! | `record.status_updated` / `record.status_update_failed` | info / error | Final flag |
//! | `pipeline.completed` | info | Terminal state reached |

#[cfg(test)]
use std::sync::Mutex;
use tracing::Level;

/// Sink for pipeline progress events.
pub trait Reporter {
    /// Record a single event.
    fn emit(&self, level: Level, kind: &'static str, message: &str);

    fn info(&self, kind: &'static str, message: &str) {
        self.emit(Level::INFO, kind, message);
    }

    fn warn(&self, kind: &'static str, message: &str) {
        self.emit(Level::WARN, kind, message);
    }

    fn error(&self, kind: &'static str, message: &str) {
        self.emit(Level::ERROR, kind, message);
    }
}

/// Forwards every event to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn emit(&self, level: Level, kind: &'static str, message: &str) {
        if level == Level::ERROR {
            tracing::error!(event_kind = kind, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(event_kind = kind, "{message}");
        } else if level == Level::INFO {
            tracing::info!(event_kind = kind, "{message}");
        } else {
            tracing::debug!(event_kind = kind, "{message}");
        }
    }
}

/// A captured event.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedEvent {
    pub level: Level,
    pub kind: &'static str,
    pub message: String,
}

/// Keeps every event in memory. Also forwards to tracing so test output
/// stays readable with `RUST_LOG`.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportedEvent>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far, in emission order.
    pub fn events(&self) -> Vec<ReportedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Event kinds in emission order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    /// Number of events with the given kind.
    pub fn count(&self, kind: &str) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn emit(&self, level: Level, kind: &'static str, message: &str) {
        TracingReporter.emit(level, kind, message);
        if let Ok(mut events) = self.events.lock() {
            events.push(ReportedEvent {
                level,
                kind,
                message: message.to_string(),
            });
        }
    }
}
