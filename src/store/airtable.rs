//! Airtable REST API store.
//!
//! Records live at `{base_url}/{base_id}/{table}/{record_id}`. Listing is
//! paginated: each page may carry an `offset` cursor that is sent back to
//! fetch the next page.

use super::{RecordStore, StoreError};
use crate::config::ApiKey;
use crate::models::{Fields, StoreRecord};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

#[derive(Deserialize)]
struct ListPage {
    #[serde(default)]
    records: Vec<StoreRecord>,
    offset: Option<String>,
}

#[derive(Serialize)]
struct FieldsBody<'a> {
    fields: &'a Fields,
}

/// Airtable base accessed with a personal access token.
#[derive(Debug, Clone)]
pub struct AirtableStore {
    client: Client,
    base_url: String,
    base_id: String,
    api_key: ApiKey,
}

impl AirtableStore {
    pub fn new(base_url: &str, base_id: &str, api_key: ApiKey) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            base_id: base_id.to_string(),
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(&self.base_id),
            urlencoding::encode(table)
        )
    }

    fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{}", self.table_url(table), urlencoding::encode(id))
    }

    /// Bearer auth with `credential`, or the operator key when absent.
    fn authorized(&self, builder: RequestBuilder, credential: Option<&ApiKey>) -> RequestBuilder {
        builder.bearer_auth(credential.unwrap_or(&self.api_key).expose())
    }

    async fn check(table: &str, res: Response) -> Result<Response, StoreError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(StoreError::Status {
            table: table.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

impl RecordStore for AirtableStore {
    #[instrument(level = "info", skip(self, credential))]
    async fn get(
        &self,
        table: &str,
        id: &str,
        credential: Option<&ApiKey>,
    ) -> Result<Option<StoreRecord>, StoreError> {
        let res = self
            .authorized(self.client.get(self.record_url(table, id)), credential)
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            debug!("Record not found");
            return Ok(None);
        }
        let res = Self::check(table, res).await?;
        Ok(Some(res.json().await?))
    }

    #[instrument(level = "info", skip(self, credential))]
    async fn list(
        &self,
        table: &str,
        credential: Option<&ApiKey>,
    ) -> Result<Vec<StoreRecord>, StoreError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut req = self.client.get(self.table_url(table));
            if let Some(cursor) = &offset {
                req = req.query(&[("offset", cursor.as_str())]);
            }
            let res = Self::check(table, self.authorized(req, credential).send().await?).await?;
            let page: ListPage = res.json().await?;
            pages += 1;
            records.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        info!(count = records.len(), pages, "Listed records");
        Ok(records)
    }

    #[instrument(level = "info", skip_all, fields(%table))]
    async fn create(
        &self,
        table: &str,
        fields: &Fields,
        credential: Option<&ApiKey>,
    ) -> Result<StoreRecord, StoreError> {
        let req = self
            .client
            .post(self.table_url(table))
            .json(&FieldsBody { fields });
        let res = Self::check(table, self.authorized(req, credential).send().await?).await?;
        Ok(res.json().await?)
    }

    #[instrument(level = "info", skip(self, fields, credential))]
    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: &Fields,
        credential: Option<&ApiKey>,
    ) -> Result<StoreRecord, StoreError> {
        let req = self
            .client
            .patch(self.record_url(table, id))
            .json(&FieldsBody { fields });
        let res = Self::check(table, self.authorized(req, credential).send().await?).await?;
        Ok(res.json().await?)
    }
}
