//! Client side of the Chronos job API.
//!
//! The dashboard only talks to the scheduler through the [`JobApi`] trait;
//! [`HttpJobApi`] is the reqwest-backed implementation used at runtime.
//!
//! ## Endpoints
//!
//! - `GET  /api/jobs` - job list, bare array or `{content: [...]}` page
//! - `POST /api/jobs` - create a job
//! - `GET  /api/jobs/{id}` - single job
//! - `GET  /api/jobs/{id}/runs` - run history
//! - `POST /api/jobs/{id}/run` - trigger an ad-hoc run
//! - `POST /api/jobs/{id}/cancel` - cancel a job
//! - `POST /api/jobs/{id}/reschedule` - change schedule
//! - `GET  /api/jobs/{id}/runs/{runId}` - single run
//! - `GET  /api/monitoring/stats` - job and run counters
//! - `GET  /api/monitoring/health` - liveness

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::form::CreateJobRequest;
use crate::core::models::{Health, Job, JobId, JobRun, RunId, Stats};

pub use client::HttpJobApi;

/// Errors returned by job API operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure (connect, TLS, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("job API returned HTTP {status}: {body}")]
    Status {
        status: u16,
        /// `message` field of the error body, when the server sent one.
        message: Option<String>,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Text suitable for showing to the user: the server's own message when
    /// it sent one, otherwise this error's description.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A list endpoint response: either a bare array or a paginated envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Page { content: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Page { content: items } => items,
        }
    }
}

/// Query string for `GET /api/jobs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl JobQuery {
    /// Zero-based page index; an unset page is the first page.
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(0)
    }

    pub fn next_page(&mut self) {
        self.page = Some(self.page_number().saturating_add(1));
    }

    /// Step back one page. No-op on the first page.
    pub fn prev_page(&mut self) {
        if let Some(page) = self.page {
            self.page = Some(page.saturating_sub(1));
        }
    }
}

/// Body of `POST /api/jobs/{id}/reschedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub schedule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
}

/// Operations the dashboard needs from the scheduler.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, ApiError>;

    async fn get_job(&self, id: JobId) -> Result<Job, ApiError>;

    async fn list_runs(&self, id: JobId) -> Result<Vec<JobRun>, ApiError>;

    async fn get_run(&self, id: JobId, run_id: RunId) -> Result<JobRun, ApiError>;

    async fn create_job(&self, request: &CreateJobRequest) -> Result<(), ApiError>;

    /// Ask the scheduler to run a job now. Only success/failure matters.
    async fn trigger_run(&self, id: JobId) -> Result<(), ApiError>;

    async fn cancel_job(&self, id: JobId) -> Result<(), ApiError>;

    async fn reschedule_job(
        &self,
        id: JobId,
        request: &RescheduleRequest,
    ) -> Result<Job, ApiError>;

    async fn stats(&self) -> Result<Stats, ApiError>;

    async fn health(&self) -> Result<Health, ApiError>;
}
