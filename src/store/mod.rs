//! Tabular record store access.
//!
//! The pipeline never owns record storage; it reads and writes through the
//! [`RecordStore`] trait.
//!
//! Every call takes an optional credential. `None` means the store's own
//! operator credential; `Some` overrides it for that call only, which lets a
//! record carry the key used for writes that concern it.
//!
//! # Implementations
//!
//! | Store | Module | Notes |
//! |-------|--------|-------|
//! | Airtable | [`airtable`] | REST API, bearer auth, paginated listing |
//! | In-memory | `memory` | Test double with call counters |

pub mod airtable;
#[cfg(test)]
pub mod memory;

use crate::config::ApiKey;
use crate::models::{Fields, StoreRecord};
use thiserror::Error;

pub use airtable::AirtableStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status} for {table}: {body}")]
    Status {
        table: String,
        status: u16,
        body: String,
    },
}

/// Read/update/create operations on named tables.
pub trait RecordStore {
    /// Fetch one record; `Ok(None)` when it does not exist.
    async fn get(
        &self,
        table: &str,
        id: &str,
        credential: Option<&ApiKey>,
    ) -> Result<Option<StoreRecord>, StoreError>;

    /// Every record in the table.
    async fn list(
        &self,
        table: &str,
        credential: Option<&ApiKey>,
    ) -> Result<Vec<StoreRecord>, StoreError>;

    /// Create a record with the given column values.
    async fn create(
        &self,
        table: &str,
        fields: &Fields,
        credential: Option<&ApiKey>,
    ) -> Result<StoreRecord, StoreError>;

    /// Overwrite the given columns of an existing record.
    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: &Fields,
        credential: Option<&ApiKey>,
    ) -> Result<StoreRecord, StoreError>;
}
