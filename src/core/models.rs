//! Job and run records as served by the Chronos job API.
//!
//! These are read-only snapshots: the dashboard never edits them in place,
//! it re-fetches after every mutation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned job identifier.
pub type JobId = i64;

/// Server-assigned run identifier.
pub type RunId = i64;

/// The fixed set of job kinds the scheduler knows how to execute.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    #[default]
    HttpRequest,
    ShellScript,
    JavaClass,
    PythonScript,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::HttpRequest,
        JobType::ShellScript,
        JobType::JavaClass,
        JobType::PythonScript,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpRequest => "HTTP_REQUEST",
            Self::ShellScript => "SHELL_SCRIPT",
            Self::JavaClass => "JAVA_CLASS",
            Self::PythonScript => "PYTHON_SCRIPT",
        }
    }

    /// Next type in selection order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous type in selection order, wrapping around.
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// HTTP verbs offered for `HTTP_REQUEST` jobs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 4] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lifecycle state reported by the scheduler.
///
/// Unknown values are kept verbatim in `Other` so that a newer server never
/// breaks list decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
    Retrying,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Scheduled => "SCHEDULED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Retrying => "RETRYING",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => Self::Pending,
            "SCHEDULED" => Self::Scheduled,
            "RUNNING" => Self::Running,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            "RETRYING" => Self::Retrying,
            _ => Self::Other(raw),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A job as listed by `GET /api/jobs`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub owner: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub max_retries: Option<i32>,
    #[serde(default)]
    pub current_retries: Option<i32>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_run_time: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub next_run_time: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub updated_at: Option<NaiveDateTime>,
    /// Most recent first.
    #[serde(default, deserialize_with = "nullable_vec")]
    pub recent_runs: Vec<JobRun>,
}

/// One execution of a job.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    #[serde(default)]
    pub id: Option<RunId>,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub retry_attempt: Option<i32>,
    #[serde(default)]
    pub worker_id: Option<String>,
}

/// Aggregate counters from `GET /api/monitoring/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub jobs: JobCounts,
    #[serde(default)]
    pub runs: RunCounts,
    #[serde(default)]
    pub health: Health,
}

/// Job counts keyed by lower-case status name, plus the overall total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(flatten)]
    pub by_status: BTreeMap<String, u64>,
}

impl JobCounts {
    /// Count for one status; statuses the server did not report count as 0.
    pub fn count(&self, status: &JobStatus) -> u64 {
        self.by_status
            .get(&status.as_str().to_lowercase())
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_status: BTreeMap<String, u64>,
}

/// Service health, from `GET /api/monitoring/health` or embedded in [`Stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub status: String,
    /// Everything else the server reports (`service`, `database`, ...).
    #[serde(flatten)]
    pub details: BTreeMap<String, String>,
}

impl Health {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lenient timestamp decoding.
///
/// The scheduler emits zone-less local date-times; RFC 3339 values are also
/// accepted and converted to local time.
pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer, de};

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Local).naive_local());
        }
        raw.parse::<NaiveDateTime>().ok()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }
}
