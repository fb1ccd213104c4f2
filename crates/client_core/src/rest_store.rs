use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::IgnoredAny, Deserialize};
use shared::{
    domain::{PersonRecord, RecordFields, RecordId},
    error::{StoreFailure, StoreOperation},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::store::RecordStore;

pub const DEFAULT_TABLE: &str = "personal_details";
const REST_PREFIX: &str = "rest/v1/";
const ORDER_BY_DISPLAY_ID: &str = "display_id.asc";
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub table: String,
    pub request_timeout: Option<Duration>,
}

impl StoreConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            table: DEFAULT_TABLE.to_string(),
            request_timeout: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Error)]
pub enum StoreSetupError {
    #[error("invalid store endpoint for table '{table}': {source}")]
    InvalidEndpoint {
        table: String,
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// PostgREST error object, e.g. `{"code":"23505","message":"duplicate key ..."}`.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// [`RecordStore`] backed by a PostgREST-compatible HTTP endpoint.
pub struct RestRecordStore {
    http: Client,
    table_url: Url,
    api_key: Option<String>,
}

impl RestRecordStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreSetupError> {
        let table_url = table_url(&config.base_url, &config.table).map_err(|source| {
            StoreSetupError::InvalidEndpoint {
                table: config.table.clone(),
                source,
            }
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            table_url,
            api_key: config.api_key,
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let builder = self.http.request(method, self.table_url.clone());
        match &self.api_key {
            Some(key) => builder.header("apikey", key).bearer_auth(key),
            None => builder,
        }
    }

    async fn send(
        &self,
        operation: StoreOperation,
        builder: RequestBuilder,
    ) -> Result<Response, StoreFailure> {
        let response = builder
            .send()
            .await
            .map_err(|err| StoreFailure::new(operation, err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = describe_rejection(status, &body);
        warn!(%operation, %status, "record store rejected request");
        Err(StoreFailure::new(operation, message))
    }
}

fn table_url(base_url: &Url, table: &str) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(REST_PREFIX)?.join(table)
}

fn describe_rejection(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    match serde_json::from_str::<RemoteErrorBody>(body) {
        Ok(RemoteErrorBody {
            message: Some(message),
            details: Some(details),
        }) => format!("{status}: {message} ({details})"),
        Ok(RemoteErrorBody {
            message: Some(message),
            ..
        }) => format!("{status}: {message}"),
        _ if body.is_empty() => status.to_string(),
        _ => format!("{status}: {body}"),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    operation: StoreOperation,
    response: Response,
) -> Result<T, StoreFailure> {
    response
        .json::<T>()
        .await
        .map_err(|err| StoreFailure::new(operation, format!("malformed response: {err}")))
}

fn id_filter(id: &RecordId) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn fetch_all(&self) -> Result<Vec<PersonRecord>, StoreFailure> {
        let operation = StoreOperation::FetchAll;
        let request = self
            .request(Method::GET)
            .query(&[("select", "*"), ("order", ORDER_BY_DISPLAY_ID)]);
        let records: Vec<PersonRecord> = decode(operation, self.send(operation, request).await?).await?;
        debug!(count = records.len(), "fetched records");
        Ok(records)
    }

    async fn create(&self, fields: &RecordFields) -> Result<PersonRecord, StoreFailure> {
        let operation = StoreOperation::Create;
        let request = self
            .request(Method::POST)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(fields);
        let rows: Vec<PersonRecord> = decode(operation, self.send(operation, request).await?).await?;
        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreFailure::new(operation, "store returned no created row"))?;
        debug!(id = %created.id, display_id = %created.display_id, "created record");
        Ok(created)
    }

    async fn update(&self, id: &RecordId, fields: &RecordFields) -> Result<(), StoreFailure> {
        let operation = StoreOperation::Update;
        let request = self
            .request(Method::PATCH)
            .query(&id_filter(id))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(fields);
        let rows: Vec<IgnoredAny> = decode(operation, self.send(operation, request).await?).await?;
        if rows.is_empty() {
            return Err(StoreFailure::new(operation, format!("no record with id {id}")));
        }
        debug!(%id, "updated record");
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreFailure> {
        let operation = StoreOperation::Delete;
        let request = self
            .request(Method::DELETE)
            .query(&id_filter(id))
            .header("Prefer", RETURN_REPRESENTATION);
        let rows: Vec<IgnoredAny> = decode(operation, self.send(operation, request).await?).await?;
        // Zero matched rows counts as deleted.
        debug!(%id, removed = rows.len(), "deleted record");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/rest_store_tests.rs"]
mod tests;
