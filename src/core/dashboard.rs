//! Dashboard controller: the job list, its refresh workflow, and the
//! run-now / create / cancel commands.
//!
//! All state lives here and is mutated only from the UI loop. Every network
//! call runs in a spawned task and reports back as a [`DashboardEvent`] on a
//! channel which the loop drains and feeds to [`Dashboard::handle_event`], so
//! a slow or silent server never stalls input handling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{ApiError, JobApi, JobQuery};

use super::form::{CreateJobRequest, JobForm};
use super::models::{Job, JobId, JobRun, JobType, Stats};
use super::status::{self, DEFAULT_TEXTUAL_TYPES};

/// Delay between a settled run trigger and the list refresh that follows it.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1000);

const LOAD_ERROR: &str = "Failed to fetch jobs";
const TRIGGER_ERROR: &str = "Failed to trigger job";

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub refresh_delay: Duration,
    /// Job types whose last run output is shown on the job card.
    pub textual_output_types: Vec<JobType>,
    pub query: JobQuery,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_delay: DEFAULT_REFRESH_DELAY,
            textual_output_types: DEFAULT_TEXTUAL_TYPES.to_vec(),
            query: JobQuery::default(),
        }
    }
}

/// Completions delivered back to the UI loop.
#[derive(Debug)]
pub enum DashboardEvent {
    /// A list fetch finished. Responses are applied in arrival order.
    JobsLoaded(Result<Vec<Job>, ApiError>),
    /// Monitoring counters for the header.
    StatsLoaded(Result<Stats, ApiError>),
    JobCreated {
        name: String,
        result: Result<(), ApiError>,
    },
    JobCancelled {
        job_id: JobId,
        result: Result<(), ApiError>,
    },
    DetailLoaded {
        job_id: JobId,
        result: Result<JobDetail, ApiError>,
    },
    /// A run-now request finished, successfully or not.
    RunSettled {
        job_id: JobId,
        result: Result<(), ApiError>,
    },
    /// The post-trigger settle delay elapsed.
    RefreshDue,
}

/// A job with its run history, for the detail view.
#[derive(Debug, Clone)]
pub struct JobDetail {
    pub job: Job,
    pub runs: Vec<JobRun>,
}

pub struct Dashboard {
    api: Arc<dyn JobApi>,
    settings: DashboardSettings,
    events_tx: mpsc::UnboundedSender<DashboardEvent>,
    jobs: Vec<Job>,
    loading: bool,
    pending_loads: usize,
    error: Option<String>,
    stats: Option<Stats>,
    /// Single slot: at most one run trigger is tracked at a time.
    triggering: Option<JobId>,
    form: Option<JobForm>,
    creating: bool,
    notice: Option<String>,
    /// Job whose detail view is open, whether or not it has arrived yet.
    detail_target: Option<JobId>,
    detail: Option<JobDetail>,
}

impl Dashboard {
    /// Create a controller and the receiver its events arrive on.
    pub fn new(
        api: Arc<dyn JobApi>,
        settings: DashboardSettings,
    ) -> (Self, mpsc::UnboundedReceiver<DashboardEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let dashboard = Self {
            api,
            settings,
            events_tx,
            jobs: Vec::new(),
            loading: true,
            pending_loads: 0,
            error: None,
            stats: None,
            triggering: None,
            form: None,
            creating: false,
            notice: None,
            detail_target: None,
            detail: None,
        };
        (dashboard, events_rx)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Banner text for the last failed list fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    pub fn triggering(&self) -> Option<JobId> {
        self.triggering
    }

    pub fn is_triggering(&self, job_id: JobId) -> bool {
        self.triggering == Some(job_id)
    }

    /// Blocking notice awaiting acknowledgement.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Show a blocking notice from the input surface (e.g. missing fields).
    pub fn raise_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    pub fn form(&self) -> Option<&JobForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut JobForm> {
        self.form.as_mut()
    }

    pub fn is_form_open(&self) -> bool {
        self.form.is_some()
    }

    /// A create request is in flight.
    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn detail(&self) -> Option<&JobDetail> {
        self.detail.as_ref()
    }

    /// The detail view is open (possibly still loading).
    pub fn is_detail_open(&self) -> bool {
        self.detail_target.is_some()
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Last-outcome text for a job card, if the panel applies.
    pub fn last_outcome<'a>(&self, job: &'a Job) -> Option<&'a str> {
        status::last_outcome(job, &self.settings.textual_output_types)
    }

    /// Start a list fetch (and a stats fetch for the header).
    ///
    /// Results arrive as [`DashboardEvent::JobsLoaded`]; on failure the
    /// previous list is kept and the error banner is set.
    pub fn load_jobs(&mut self) {
        self.pending_loads += 1;
        self.loading = true;

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        let query = self.settings.query.clone();
        tokio::spawn(async move {
            let result = api.list_jobs(&query).await;
            let _ = tx.send(DashboardEvent::JobsLoaded(result));
        });

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.stats().await;
            let _ = tx.send(DashboardEvent::StatsLoaded(result));
        });
    }

    /// Move to the next page of the job list.
    pub fn next_page(&mut self) {
        self.settings.query.next_page();
        self.load_jobs();
    }

    /// Move to the previous page. No-op on the first page.
    pub fn prev_page(&mut self) {
        if self.settings.query.page_number() == 0 {
            return;
        }
        self.settings.query.prev_page();
        self.load_jobs();
    }

    /// Open the creation form with a fresh draft. An already open draft is
    /// left as is.
    pub fn open_form(&mut self) {
        if self.form.is_none() {
            self.form = Some(JobForm::new());
        }
    }

    /// Close the creation form, discarding the draft.
    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Assemble the open draft and submit it.
    pub fn submit_form(&mut self) {
        let Some(form) = &self.form else {
            return;
        };
        match form.submit() {
            Ok(request) => self.create_job(request),
            Err(e) => {
                warn!(error = %e, "Draft job could not be assembled");
                self.notice = Some(format!("Failed to create job: {e}"));
            }
        }
    }

    /// Submit a new job. Success closes the form and reloads the list;
    /// failure keeps the form and its contents for another attempt.
    /// Ignored while a previous create is still in flight.
    pub fn create_job(&mut self, request: CreateJobRequest) {
        if self.creating {
            debug!(name = %request.name, "Create already in flight");
            return;
        }

        self.creating = true;
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.create_job(&request).await;
            let _ = tx.send(DashboardEvent::JobCreated {
                name: request.name,
                result,
            });
        });
    }

    /// Start a run-now request for `job_id` without waiting for it.
    ///
    /// The outcome arrives later as [`DashboardEvent::RunSettled`]. Triggering
    /// the job that is already in flight is ignored; triggering another job
    /// takes over the single in-flight slot.
    pub fn trigger_run(&mut self, job_id: JobId) {
        if self.is_triggering(job_id) {
            debug!(job_id, "Run already being triggered");
            return;
        }

        self.triggering = Some(job_id);
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.trigger_run(job_id).await;
            let _ = tx.send(DashboardEvent::RunSettled { job_id, result });
        });
    }

    /// Cancel a job; the list (and an open detail view) reload on success.
    pub fn cancel_job(&mut self, job_id: JobId) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.cancel_job(job_id).await;
            let _ = tx.send(DashboardEvent::JobCancelled { job_id, result });
        });
    }

    /// Open the detail view for one job and fetch it with its run history.
    pub fn load_detail(&mut self, job_id: JobId) {
        if self.detail.as_ref().is_some_and(|d| d.job.id != job_id) {
            self.detail = None;
        }
        self.detail_target = Some(job_id);

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = fetch_detail(api.as_ref(), job_id).await;
            let _ = tx.send(DashboardEvent::DetailLoaded { job_id, result });
        });
    }

    pub fn clear_detail(&mut self) {
        self.detail_target = None;
        self.detail = None;
    }

    pub fn handle_event(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::JobsLoaded(result) => {
                self.pending_loads = self.pending_loads.saturating_sub(1);
                self.loading = self.pending_loads > 0;
                match result {
                    Ok(jobs) => {
                        debug!(count = jobs.len(), "Job list refreshed");
                        self.jobs = jobs;
                        self.error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to fetch jobs");
                        self.error = Some(LOAD_ERROR.to_string());
                    }
                }
            }
            DashboardEvent::StatsLoaded(result) => match result {
                Ok(stats) => self.stats = Some(stats),
                Err(e) => debug!(error = %e, "Monitoring stats unavailable"),
            },
            DashboardEvent::JobCreated { name, result } => {
                self.creating = false;
                match result {
                    Ok(()) => {
                        info!(%name, "Job created");
                        self.form = None;
                        self.load_jobs();
                    }
                    Err(e) => {
                        warn!(%name, error = %e, "Failed to create job");
                        self.notice = Some(format!("Failed to create job: {}", e.user_message()));
                    }
                }
            }
            DashboardEvent::JobCancelled { job_id, result } => match result {
                Ok(()) => {
                    info!(job_id, "Job cancelled");
                    self.load_jobs();
                    if self.detail_target == Some(job_id) {
                        self.load_detail(job_id);
                    }
                }
                Err(e) => {
                    warn!(job_id, error = %e, "Failed to cancel job");
                    self.notice = Some(format!("Failed to cancel job: {}", e.user_message()));
                }
            },
            DashboardEvent::DetailLoaded { job_id, result } => {
                if self.detail_target != Some(job_id) {
                    debug!(job_id, "Dropping detail for a closed view");
                    return;
                }
                match result {
                    Ok(detail) => self.detail = Some(detail),
                    Err(e) => {
                        warn!(job_id, error = %e, "Failed to fetch job");
                        self.notice = Some(format!("Failed to fetch job: {}", e.user_message()));
                        // Keep a stale view on refresh failures; close a view that never loaded.
                        if self.detail.is_none() {
                            self.detail_target = None;
                        }
                    }
                }
            }
            DashboardEvent::RunSettled { job_id, result } => {
                self.triggering = None;
                match result {
                    Ok(()) => info!(job_id, "Run triggered"),
                    Err(e) => {
                        warn!(job_id, error = %e, "Failed to trigger job");
                        self.notice = Some(TRIGGER_ERROR.to_string());
                    }
                }
                self.schedule_refresh();
            }
            DashboardEvent::RefreshDue => {
                self.load_jobs();
                if let Some(job_id) = self.detail_target {
                    self.load_detail(job_id);
                }
            }
        }
    }

    fn schedule_refresh(&self) {
        let tx = self.events_tx.clone();
        let delay = self.settings.refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(DashboardEvent::RefreshDue);
        });
    }
}

/// Fetch a job and its runs. The history endpoint is optional; the
/// embedded `recentRuns` stand in when it fails.
async fn fetch_detail(api: &dyn JobApi, job_id: JobId) -> Result<JobDetail, ApiError> {
    let job = api.get_job(job_id).await?;
    let runs = match api.list_runs(job_id).await {
        Ok(runs) => runs,
        Err(e) => {
            debug!(job_id, error = %e, "Run history unavailable");
            job.recent_runs.clone()
        }
    };
    Ok(JobDetail { job, runs })
}
