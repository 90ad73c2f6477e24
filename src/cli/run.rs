//! One-shot "run now" for the command line.

use std::time::Duration;

use tracing::{info, warn};

use crate::api::{ApiError, JobApi};
use crate::core::models::{Job, JobId};

/// What happened to a triggered run once the settle delay passed.
#[derive(Debug)]
pub struct RunReport {
    pub trigger: Result<(), ApiError>,
    /// The job as fetched after the delay, whether or not the trigger worked.
    pub job: Result<Job, ApiError>,
}

/// Trigger a run, wait `settle`, then fetch the job.
///
/// The wait and fetch happen even when the trigger fails, so the caller can
/// show the job's current state next to the error.
pub async fn run_and_settle(api: &dyn JobApi, id: JobId, settle: Duration) -> RunReport {
    let trigger = api.trigger_run(id).await;
    match &trigger {
        Ok(()) => info!(job_id = id, "Run triggered"),
        Err(e) => warn!(job_id = id, error = %e, "Run trigger failed"),
    }

    tokio::time::sleep(settle).await;

    let job = api.get_job(id).await;
    RunReport { trigger, job }
}
