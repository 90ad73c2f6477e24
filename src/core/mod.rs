pub mod dashboard;
pub mod form;
pub mod models;
pub mod status;

pub use dashboard::{Dashboard, DashboardEvent, DashboardSettings, JobDetail};
pub use form::{CreateJobRequest, FormError, JobForm};
pub use models::{HttpMethod, Job, JobId, JobRun, JobStatus, JobType};
pub use status::StatusCategory;
