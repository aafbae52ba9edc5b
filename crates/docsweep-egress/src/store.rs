//! HTTP document store connector
//!
//! Talks to a content lake over its HTTP API:
//! - `GET  {base}/{version}/data/query/{dataset}?query=...`
//! - `POST {base}/{version}/data/mutate/{dataset}` with a list of delete mutations

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, create_client},
};
use async_trait::async_trait;
use docsweep_core::{DocumentStore, SearchResult, StoreResult};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const DEFAULT_API_VERSION: &str = "v2021-10-21";

/// Distinct type tags across the dataset
const TYPES_QUERY: &str = "array::unique(*[]._type)";

/// HTTP store configuration
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    pub project_id: String,

    pub dataset: String,

    /// Dated API version, e.g. `v2021-10-21`
    pub api_version: String,

    /// Bearer token; reads of a public dataset work without one
    pub token: Option<String>,

    /// Base URL (default: https://<project_id>.api.sanity.io)
    pub base_url: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl HttpStoreConfig {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            base_url: format!("https://{}.api.sanity.io", project_id),
            project_id,
            dataset: dataset.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
            client_config: HttpClientConfig::default(),
        }
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the API version; a missing `v` prefix is added
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        let api_version = api_version.into();
        self.api_version = if api_version.starts_with('v') {
            api_version
        } else {
            format!("v{}", api_version)
        };
        self
    }

    fn endpoint(&self, kind: &str) -> String {
        format!(
            "{}/{}/data/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            kind,
            self.dataset
        )
    }

    fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(EgressError::ConfigError("project_id is required".to_string()));
        }
        if self.dataset.trim().is_empty() {
            return Err(EgressError::ConfigError("dataset is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct MutationRequest<'a> {
    mutations: Vec<Mutation<'a>>,
}

#[derive(Debug, Serialize)]
struct Mutation<'a> {
    delete: DeleteById<'a>,
}

#[derive(Debug, Serialize)]
struct DeleteById<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationResponse {
    #[serde(default)]
    transaction_id: Option<String>,
}

/// Error body shapes returned by the API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Object {
        description: Option<String>,
        message: Option<String>,
    },
}

/// HTTP document store
pub struct HttpDocumentStore {
    config: HttpStoreConfig,
    client: Client,
}

impl HttpDocumentStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self> {
        config.validate()?;
        let client = create_client(&config.client_config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HttpStoreConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Run a query and return the raw `result` value
    async fn query_raw(&self, query: &str) -> Result<serde_json::Value> {
        let url = Url::parse_with_params(&self.config.endpoint("query"), &[("query", query)])
            .map_err(|e| EgressError::ConfigError(format!("Invalid query URL: {}", e)))?;

        let response = self.authorize(self.client.get(url)).send().await?;
        let response = check_status(response).await?;

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| EgressError::ParseError(format!("Failed to parse query response: {}", e)))?;
        Ok(body.result)
    }
}

/// Turn a non-2xx response into an error carrying the API's message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let status_code = status.as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());
    Err(EgressError::StoreError {
        status_code,
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let message = parsed.and_then(|b| match b.error {
        Some(ErrorDetail::Text(text)) => Some(text),
        Some(ErrorDetail::Object {
            description,
            message,
        }) => description.or(message),
        None => b.message,
    });

    match message {
        Some(m) if !m.trim().is_empty() => m,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}

/// Normalize a query result into rows; a single object becomes one row
fn into_rows(result: serde_json::Value) -> Result<Vec<SearchResult>> {
    let rows = match result {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        other => {
            return Err(EgressError::ParseError(format!(
                "query result is not a list of documents: {}",
                other
            )));
        }
    };

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| {
                EgressError::ParseError(format!("result row is not a document: {}", e))
            })
        })
        .collect()
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    #[instrument(skip(self, query), fields(dataset = %self.config.dataset))]
    async fn fetch(&self, query: &str) -> StoreResult<Vec<SearchResult>> {
        debug!(query, "Sending query");
        let result = self.query_raw(query).await?;
        let rows = into_rows(result)?;
        debug!(rows = rows.len(), "Query returned");
        Ok(rows)
    }

    #[instrument(skip(self, ids), fields(dataset = %self.config.dataset, count = ids.len()))]
    async fn delete_transaction(&self, ids: &[String]) -> StoreResult<()> {
        let body = MutationRequest {
            mutations: ids
                .iter()
                .map(|id| Mutation {
                    delete: DeleteById { id: id.as_str() },
                })
                .collect(),
        };
        let url = format!(
            "{}?returnIds=true&visibility=sync",
            self.config.endpoint("mutate")
        );

        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(EgressError::from)?;
        let response = check_status(response).await?;

        let committed: MutationResponse = response.json().await.map_err(|e| {
            EgressError::ParseError(format!("Failed to parse mutation response: {}", e))
        })?;
        debug!(
            transaction_id = committed.transaction_id.as_deref().unwrap_or("unknown"),
            "Delete transaction committed"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(dataset = %self.config.dataset))]
    async fn list_types(&self) -> StoreResult<Vec<String>> {
        let result = self.query_raw(TYPES_QUERY).await?;
        let types = match result {
            serde_json::Value::Null => Vec::new(),
            value => serde_json::from_value::<Vec<Option<String>>>(value)
                .map_err(|e| EgressError::ParseError(format!("type list is not strings: {}", e)))?
                .into_iter()
                .flatten()
                .collect(),
        };
        Ok(types)
    }
}
