//! Pipeline CRUD against the Flowdeck pipeline service.
//!
//! This module provides the [`PipelineApi`] contract and its HTTP
//! implementation. The service speaks JSON over a small REST surface;
//! rejected saves come back as a structured message the editor can show
//! line by line.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use flowdeck_graph::{FlowDocument, FlowId, GraphResult, PipelinePayload};

use crate::auth::TokenProvider;
use crate::error::{ClientError, ClientResult};

/// First line of every save rejection message
pub const REJECTION_PREFIX: &str = "Pipeline is incomplete or broken:";

/// A save the service refused, broken into displayable pieces
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRejection {
    /// The full message as the service sent it
    pub message: String,

    /// Individual problems, one per line after the prefix
    pub errors: Vec<String>,

    /// Service-side log output, when the service included any
    pub logs: Option<String>,
}

/// Shape of service error bodies. Older deployments send plain text, so
/// this is only a best effort.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    logs: Option<String>,
}

impl SaveRejection {
    /// Parse a response body into a rejection, if that is what it is.
    /// Anything not carrying the rejection prefix is left to the generic
    /// error path.
    pub fn from_body(body: &str) -> Option<Self> {
        let (message, logs) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => (parsed.message, parsed.logs),
            Err(_) => (body.trim().to_string(), None),
        };

        if !message.starts_with(REJECTION_PREFIX) {
            return None;
        }

        let errors = message
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self {
            message,
            errors,
            logs,
        })
    }
}

/// Response of a successful create or update
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaveOutcome {
    /// Service-side pipeline id
    pub id: String,

    /// Log output of the save, when the service included any
    #[serde(default)]
    pub logs: Option<String>,
}

/// Page selector for listings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageQuery {
    /// One-based page number
    pub page: u32,

    /// Entries per page
    pub size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

/// One pipeline as it appears in listings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub task_count: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A full pipeline as returned by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineDetail {
    /// Service-side pipeline id
    pub id: String,

    /// The pipeline content, in the same shape saves are sent in
    #[serde(flatten)]
    pub payload: PipelinePayload,
}

impl PipelineDetail {
    /// Turn the fetched pipeline back into an editable document
    pub fn into_document(self) -> GraphResult<FlowDocument> {
        let flow_id = FlowId(self.id);
        self.payload.into_document(flow_id)
    }
}

/// Trait defining the contract for pipeline service clients
#[async_trait]
pub trait PipelineApi: Send + Sync + Debug {
    /// Create a new pipeline from a payload
    async fn create_pipeline(&self, payload: &PipelinePayload) -> ClientResult<SaveOutcome>;

    /// Replace an existing pipeline with a payload
    async fn update_pipeline(
        &self,
        pipeline_id: &str,
        payload: &PipelinePayload,
    ) -> ClientResult<SaveOutcome>;

    /// Fetch a pipeline with all its tasks
    async fn get_pipeline(&self, pipeline_id: &str) -> ClientResult<PipelineDetail>;

    /// Delete a pipeline
    async fn delete_pipeline(&self, pipeline_id: &str) -> ClientResult<()>;

    /// List pipelines, newest first
    async fn list_pipelines(&self, query: PageQuery) -> ClientResult<Page<PipelineSummary>>;
}

/// HTTP implementation of PipelineApi
#[derive(Debug, Clone)]
pub struct HttpPipelineClient {
    /// Base URL of the pipeline service
    base_url: String,

    /// Source of bearer tokens
    tokens: Arc<dyn TokenProvider>,

    /// HTTP client
    client: Client,
}

impl HttpPipelineClient {
    /// Create a new client against a service base URL
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into();

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            client,
        })
    }

    /// Get the base URL for the pipelines API
    fn pipelines_url(&self) -> String {
        format!("{}/api/v1/pipelines", self.base_url)
    }

    /// Get the URL for a specific pipeline
    fn pipeline_url(&self, pipeline_id: &str) -> String {
        format!("{}/{}", self.pipelines_url(), pipeline_id)
    }

    /// Get the URL for streamed result previews
    pub(crate) fn explore_url(&self) -> String {
        format!("{}/api/v1/explore", self.base_url)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Attach the current bearer token, when one is configured
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.token() {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

/// Map a non-success response to the matching error
pub(crate) async fn error_for(pipeline_id: Option<&str>, response: Response) -> ClientError {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ClientError::Unauthorized;
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(pipeline_id) = pipeline_id {
            return ClientError::NotFound(pipeline_id.to_string());
        }
    }

    let body = response.text().await.unwrap_or_default();
    if let Some(rejection) = SaveRejection::from_body(&body) {
        return ClientError::Rejected(rejection);
    }

    ClientError::Api {
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl PipelineApi for HttpPipelineClient {
    async fn create_pipeline(&self, payload: &PipelinePayload) -> ClientResult<SaveOutcome> {
        info!(name = %payload.name, "Creating pipeline");

        let response = self
            .authorize(self.client.post(self.pipelines_url()).json(payload))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for(None, response).await);
        }

        let outcome: SaveOutcome = response.json().await?;
        debug!(pipeline_id = %outcome.id, "Pipeline created");
        Ok(outcome)
    }

    async fn update_pipeline(
        &self,
        pipeline_id: &str,
        payload: &PipelinePayload,
    ) -> ClientResult<SaveOutcome> {
        info!(%pipeline_id, "Saving pipeline");

        let response = self
            .authorize(self.client.put(self.pipeline_url(pipeline_id)).json(payload))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for(Some(pipeline_id), response).await);
        }

        let outcome: SaveOutcome = response.json().await?;
        debug!(%pipeline_id, "Pipeline saved");
        Ok(outcome)
    }

    async fn get_pipeline(&self, pipeline_id: &str) -> ClientResult<PipelineDetail> {
        debug!(%pipeline_id, "Fetching pipeline");

        let response = self
            .authorize(self.client.get(self.pipeline_url(pipeline_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for(Some(pipeline_id), response).await);
        }

        Ok(response.json().await?)
    }

    async fn delete_pipeline(&self, pipeline_id: &str) -> ClientResult<()> {
        info!(%pipeline_id, "Deleting pipeline");

        let response = self
            .authorize(self.client.delete(self.pipeline_url(pipeline_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for(Some(pipeline_id), response).await);
        }

        Ok(())
    }

    async fn list_pipelines(&self, query: PageQuery) -> ClientResult<Page<PipelineSummary>> {
        debug!(page = query.page, size = query.size, "Listing pipelines");

        let response = self
            .authorize(
                self.client
                    .get(self.pipelines_url())
                    .query(&[("page", query.page), ("size", query.size)]),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for(None, response).await);
        }

        Ok(response.json().await?)
    }
}
