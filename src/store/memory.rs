//! In-memory store used by tests.

use super::{RecordStore, StoreError};
use crate::config::ApiKey;
use crate::models::{Fields, StoreRecord};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    tables: BTreeMap<String, Vec<StoreRecord>>,
    next_id: usize,
    creates: usize,
    updates: Vec<(String, String, Fields)>,
}

/// Tables held in memory, with optional failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// Tables whose `create` calls fail.
    failing_creates: HashSet<String>,
    /// Tables whose `update` calls fail.
    failing_updates: HashSet<String>,
    /// Tables whose `list` calls fail.
    failing_lists: HashSet<String>,
}

fn rejected(table: &str) -> StoreError {
    StoreError::Status {
        table: table.to_string(),
        status: 422,
        body: "rejected by test store".to_string(),
    }
}

fn merge(target: &mut Map<String, Value>, fields: &Fields) {
    for (k, v) in fields {
        target.insert(k.clone(), Value::String(v.clone()));
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: &str, id: &str, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut inner = self.inner.lock().unwrap();
        inner.tables.entry(table.to_string()).or_default().push(StoreRecord {
            id: id.to_string(),
            fields,
        });
    }

    pub fn fail_creates(mut self, table: &str) -> Self {
        self.failing_creates.insert(table.to_string());
        self
    }

    pub fn fail_updates(mut self, table: &str) -> Self {
        self.failing_updates.insert(table.to_string());
        self
    }

    pub fn fail_lists(mut self, table: &str) -> Self {
        self.failing_lists.insert(table.to_string());
        self
    }

    pub fn records(&self, table: &str) -> Vec<StoreRecord> {
        let inner = self.inner.lock().unwrap();
        inner.tables.get(table).cloned().unwrap_or_default()
    }

    pub fn record(&self, table: &str, id: &str) -> Option<StoreRecord> {
        self.records(table).into_iter().find(|r| r.id == id)
    }

    /// Successful and failed `create` calls.
    pub fn create_calls(&self) -> usize {
        self.inner.lock().unwrap().creates
    }

    /// Every `update` call, including failed ones.
    pub fn update_calls(&self) -> Vec<(String, String, Fields)> {
        self.inner.lock().unwrap().updates.clone()
    }
}

impl RecordStore for MemoryStore {
    async fn get(
        &self,
        table: &str,
        id: &str,
        _credential: Option<&ApiKey>,
    ) -> Result<Option<StoreRecord>, StoreError> {
        Ok(self.record(table, id))
    }

    async fn list(
        &self,
        table: &str,
        _credential: Option<&ApiKey>,
    ) -> Result<Vec<StoreRecord>, StoreError> {
        if self.failing_lists.contains(table) {
            return Err(rejected(table));
        }
        Ok(self.records(table))
    }

    async fn create(
        &self,
        table: &str,
        fields: &Fields,
        _credential: Option<&ApiKey>,
    ) -> Result<StoreRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.creates += 1;
        if self.failing_creates.contains(table) {
            return Err(rejected(table));
        }
        inner.next_id += 1;
        let mut record = StoreRecord {
            id: format!("recMem{}", inner.next_id),
            fields: Map::new(),
        };
        merge(&mut record.fields, fields);
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: &Fields,
        _credential: Option<&ApiKey>,
    ) -> Result<StoreRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .updates
            .push((table.to_string(), id.to_string(), fields.clone()));
        if self.failing_updates.contains(table) {
            return Err(rejected(table));
        }
        let record = inner
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::Status {
                table: table.to_string(),
                status: 404,
                body: format!("no record {id}"),
            })?;
        merge(&mut record.fields, fields);
        Ok(record.clone())
    }
}
