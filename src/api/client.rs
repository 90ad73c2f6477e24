//! HTTP implementation of [`JobApi`] using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiError, JobApi, JobQuery, Listing, RescheduleRequest};
use crate::core::form::CreateJobRequest;
use crate::core::models::{Health, Job, JobId, JobRun, RunId, Stats};

/// Upper bound on a single request, connect through body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Job API client for a single Chronos server.
#[derive(Debug, Clone)]
pub struct HttpJobApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

/// Error body shape; only `message` is consumed.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl HttpJobApi {
    /// `base_url` is the server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/jobs{}", self.base_url, path)
    }

    fn monitoring_url(&self, path: &str) -> String {
        format!("{}/api/monitoring{}", self.base_url, path)
    }

    /// Send a request and return the raw body of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.timeout(self.timeout).send().await?;
        Self::check_status(response).await
    }

    async fn check_status(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, ApiError> {
        debug!(?query, "GET /api/jobs");
        let listing: Listing<Job> = self
            .get_json(self.client.get(self.url("")).query(query))
            .await?;
        Ok(listing.into_vec())
    }

    async fn get_job(&self, id: JobId) -> Result<Job, ApiError> {
        debug!(job_id = id, "GET /api/jobs/{{id}}");
        self.get_json(self.client.get(self.url(&format!("/{id}"))))
            .await
    }

    async fn list_runs(&self, id: JobId) -> Result<Vec<JobRun>, ApiError> {
        debug!(job_id = id, "GET /api/jobs/{{id}}/runs");
        let listing: Listing<JobRun> = self
            .get_json(self.client.get(self.url(&format!("/{id}/runs"))))
            .await?;
        Ok(listing.into_vec())
    }

    async fn get_run(&self, id: JobId, run_id: RunId) -> Result<JobRun, ApiError> {
        debug!(job_id = id, run_id, "GET /api/jobs/{{id}}/runs/{{runId}}");
        self.get_json(self.client.get(self.url(&format!("/{id}/runs/{run_id}"))))
            .await
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<(), ApiError> {
        debug!(name = %request.name, job_type = %request.job_type, "POST /api/jobs");
        self.send(self.client.post(self.url("")).json(request))
            .await?;
        Ok(())
    }

    async fn trigger_run(&self, id: JobId) -> Result<(), ApiError> {
        debug!(job_id = id, "POST /api/jobs/{{id}}/run");
        self.send(self.client.post(self.url(&format!("/{id}/run"))))
            .await?;
        Ok(())
    }

    async fn cancel_job(&self, id: JobId) -> Result<(), ApiError> {
        debug!(job_id = id, "POST /api/jobs/{{id}}/cancel");
        self.send(self.client.post(self.url(&format!("/{id}/cancel"))))
            .await?;
        Ok(())
    }

    async fn reschedule_job(
        &self,
        id: JobId,
        request: &RescheduleRequest,
    ) -> Result<Job, ApiError> {
        debug!(job_id = id, schedule = %request.schedule, "POST /api/jobs/{{id}}/reschedule");
        self.get_json(
            self.client
                .post(self.url(&format!("/{id}/reschedule")))
                .json(request),
        )
        .await
    }

    async fn stats(&self) -> Result<Stats, ApiError> {
        debug!("GET /api/monitoring/stats");
        self.get_json(self.client.get(self.monitoring_url("/stats")))
            .await
    }

    async fn health(&self) -> Result<Health, ApiError> {
        debug!("GET /api/monitoring/health");
        self.get_json(self.client.get(self.monitoring_url("/health")))
            .await
    }
}
