//! Presentation helpers shared by the TUI and the one-shot CLI commands.

use chrono::NaiveDateTime;

use super::models::{Job, JobStatus, JobType};

/// Placeholder shown when the latest run produced neither output nor error.
pub const NO_OUTPUT: &str = "No output";

/// Job types whose run output is shown by default in the last-outcome panel.
pub const DEFAULT_TEXTUAL_TYPES: [JobType; 2] = [JobType::HttpRequest, JobType::ShellScript];

/// Display category for a job status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Success,
    Error,
    Running,
    Info,
    Default,
}

impl StatusCategory {
    /// Map a raw status string to its category. Total: unknown input,
    /// including the empty string, maps to `Default`.
    pub fn from_status(status: &str) -> Self {
        match status {
            "COMPLETED" => Self::Success,
            "FAILED" => Self::Error,
            "RUNNING" => Self::Running,
            "SCHEDULED" => Self::Info,
            _ => Self::Default,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Running => "running",
            Self::Info => "info",
            Self::Default => "default",
        }
    }
}

impl JobStatus {
    pub fn category(&self) -> StatusCategory {
        StatusCategory::from_status(self.as_str())
    }
}

/// Text for the last-outcome panel, or `None` when the panel is hidden.
///
/// The panel is shown only for jobs with at least one run whose type is in
/// `textual_types`. The most recent run's error wins over its output.
pub fn last_outcome<'a>(job: &'a Job, textual_types: &[JobType]) -> Option<&'a str> {
    if !textual_types.contains(&job.job_type) {
        return None;
    }
    let latest = job.recent_runs.first()?;
    Some(
        latest
            .error
            .as_deref()
            .filter(|e| !e.is_empty())
            .or_else(|| latest.output.as_deref().filter(|o| !o.is_empty()))
            .unwrap_or(NO_OUTPUT),
    )
}

/// Format an optional run time, falling back to `missing` when unset.
pub fn format_run_time(time: Option<NaiveDateTime>, missing: &str) -> String {
    match time {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => missing.to_string(),
    }
}

pub fn format_last_run(job: &Job) -> String {
    format_run_time(job.last_run_time, "Never")
}

pub fn format_next_run(job: &Job) -> String {
    format_run_time(job.next_run_time, "Not scheduled")
}
