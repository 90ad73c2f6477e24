use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chronos_dash::api::{HttpJobApi, JobApi, RescheduleRequest};
use chronos_dash::config::AppConfig;
use chronos_dash::core::form::{FormField, JobForm};
use chronos_dash::cli::run::run_and_settle;
use chronos_dash::core::models::{HttpMethod, Job, JobId, JobRun, JobType, RunId};
use chronos_dash::core::status;
use chronos_dash::logging::{self, LogConfig, LogTarget};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "chronos-dash")]
#[command(about = "Dashboard for the Chronos job scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ./chronos-dash.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: GlobalArgs,
}

/// Flags that override configuration values.
#[derive(Args, Serialize)]
struct GlobalArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    verbose: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    json_logs: Option<bool>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Tui,
    /// Print the job list
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print one job with its recent runs
    Show {
        id: JobId,
        /// Print only this run
        #[arg(long)]
        run: Option<RunId>,
    },
    /// Create a job
    Create(CreateArgs),
    /// Trigger a run and print the job once it has settled
    Run { id: JobId },
    /// Cancel a job
    Cancel { id: JobId },
    /// Print scheduler counters and service health
    Stats,
    /// Change a job's schedule
    Reschedule {
        id: JobId,
        #[arg(long)]
        schedule: String,
        #[arg(long)]
        recurring: Option<bool>,
    },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    owner: String,
    #[arg(long = "type", value_enum)]
    job_type: JobType,
    #[arg(long)]
    url: Option<String>,
    #[arg(long, value_enum)]
    method: Option<HttpMethod>,
    #[arg(long)]
    timeout: Option<u32>,
    /// Shell command, or inline source for Python jobs
    #[arg(long)]
    script: Option<String>,
    #[arg(long)]
    class_name: Option<String>,
    #[arg(long)]
    script_path: Option<String>,
    /// Cron expression when recurring, otherwise an ISO date-time
    #[arg(long)]
    schedule: String,
    #[arg(long)]
    recurring: bool,
    #[arg(long)]
    max_retries: Option<u32>,
    #[arg(long)]
    retry_delay: Option<u32>,
    #[arg(long)]
    description: Option<String>,
}

impl CreateArgs {
    fn into_form(self) -> JobForm {
        let mut form = JobForm::new();
        form.common.name = self.name;
        form.common.owner = self.owner;
        form.common.schedule = self.schedule;
        form.common.is_recurring = self.recurring;
        form.select_type(self.job_type);

        if let Some(description) = self.description {
            form.common.description = description;
        }
        if let Some(max_retries) = self.max_retries {
            form.common.max_retries = max_retries.to_string();
        }
        if let Some(retry_delay) = self.retry_delay {
            form.advanced.retry_delay = retry_delay.to_string();
        }

        let details = &mut form.details;
        if let Some(url) = self.url {
            details.http.url = url;
        }
        if let Some(method) = self.method {
            details.http.method = method;
        }
        if let Some(timeout) = self.timeout {
            details.http.timeout = timeout.to_string();
        }
        if let Some(class_name) = self.class_name {
            details.java.class_name = class_name;
        }
        if let Some(script_path) = self.script_path {
            details.python.script_path = script_path;
        }
        if let Some(script) = self.script {
            match self.job_type {
                JobType::PythonScript => details.python.script = script,
                _ => details.shell.script = script,
            }
        }
        form
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides))?;
    let command = cli.command.unwrap_or(Commands::Tui);

    let target = match (&command, &config.log_file) {
        (Commands::Tui, Some(path)) => LogTarget::File(path.clone()),
        (Commands::Tui, None) => LogTarget::Off,
        _ => LogTarget::Stderr,
    };
    logging::init(LogConfig {
        json: config.json_logs,
        verbose: config.verbose,
        target,
    })?;

    let api: Arc<dyn JobApi> = Arc::new(
        HttpJobApi::new(config.api_url.as_str()).with_timeout(config.request_timeout()),
    );

    match command {
        Commands::Tui => chronos_dash::cli::tui::run(&config)
            .await
            .context("Dashboard exited with an error")?,
        Commands::List { owner } => run_list(api.as_ref(), &config, owner)
            .await
            .context("Failed to list jobs")?,
        Commands::Show { id, run: None } => run_show(api.as_ref(), id)
            .await
            .with_context(|| format!("Failed to show job {}", id))?,
        Commands::Show {
            id,
            run: Some(run_id),
        } => {
            let run = api
                .get_run(id, run_id)
                .await
                .with_context(|| format!("Failed to show run {} of job {}", run_id, id))?;
            print_run(&run);
        }
        Commands::Stats => run_stats(api.as_ref())
            .await
            .context("Failed to fetch scheduler stats")?,
        Commands::Create(args) => run_create(api.as_ref(), args)
            .await
            .context("Failed to create job")?,
        Commands::Run { id } => run_now(api.as_ref(), &config, id)
            .await
            .with_context(|| format!("Failed to run job {}", id))?,
        Commands::Cancel { id } => {
            api.cancel_job(id)
                .await
                .with_context(|| format!("Failed to cancel job {}", id))?;
            info!(job_id = id, "Job cancelled");
            println!("Cancelled job {}", id);
        }
        Commands::Reschedule {
            id,
            schedule,
            recurring,
        } => {
            let request = RescheduleRequest {
                schedule,
                is_recurring: recurring,
            };
            let job = api
                .reschedule_job(id, &request)
                .await
                .with_context(|| format!("Failed to reschedule job {}", id))?;
            print_job(&job, &config);
        }
    }

    Ok(())
}

async fn run_list(api: &dyn JobApi, config: &AppConfig, owner: Option<String>) -> Result<()> {
    let mut query = config.job_query();
    if owner.is_some() {
        query.owner = owner;
    }

    let jobs = api.list_jobs(&query).await?;
    if jobs.is_empty() {
        println!("No jobs found");
        return Ok(());
    }

    for job in &jobs {
        print_job(job, config);
    }
    Ok(())
}

fn print_job(job: &Job, config: &AppConfig) {
    println!(
        "#{:<5} {:<28} {:<10} [{}]",
        job.id,
        job.name,
        job.status,
        job.status.category().label()
    );
    println!(
        "       {} / {}  last: {}  next: {}",
        job.job_type,
        job.owner,
        status::format_last_run(job),
        status::format_next_run(job)
    );
    if let Some(outcome) = status::last_outcome(job, &config.textual_output_types) {
        println!("       outcome: {}", outcome.lines().next().unwrap_or_default());
    }
}

async fn run_show(api: &dyn JobApi, id: JobId) -> Result<()> {
    let job = api.get_job(id).await?;
    let runs = match api.list_runs(id).await {
        Ok(runs) => runs,
        Err(e) => {
            warn!(job_id = id, error = %e, "Run history unavailable");
            job.recent_runs.clone()
        }
    };

    println!("Job #{}: {}", job.id, job.name);
    println!("  Owner:       {}", job.owner);
    println!("  Type:        {}", job.job_type);
    println!(
        "  Status:      {} [{}]",
        job.status,
        job.status.category().label()
    );
    println!("  Schedule:    {}", job.schedule.as_deref().unwrap_or("-"));
    println!(
        "  Recurring:   {}",
        if job.is_recurring.unwrap_or(false) { "yes" } else { "no" }
    );
    println!("  Last Run:    {}", status::format_last_run(&job));
    println!("  Next Run:    {}", status::format_next_run(&job));
    if let Some(description) = job.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  Description: {}", description);
    }

    println!();
    if runs.is_empty() {
        println!("No runs yet");
    }
    for run in &runs {
        print_run(run);
    }
    Ok(())
}

fn print_run(run: &JobRun) {
    let id = run.id.map(|id| format!("#{} ", id)).unwrap_or_default();
    println!(
        "  {}{}  {}",
        id,
        status::format_run_time(run.started_at, "-"),
        run.status
    );
    if let Some(error) = run.error.as_deref().filter(|e| !e.is_empty()) {
        println!("      error: {}", error);
    } else if let Some(output) = run.output.as_deref().filter(|o| !o.is_empty()) {
        println!("      {}", output);
    }
}

async fn run_create(api: &dyn JobApi, args: CreateArgs) -> Result<()> {
    let form = args.into_form();

    let missing: Vec<&str> = form
        .missing_fields()
        .into_iter()
        .map(|field: FormField| form.label(field))
        .collect();
    if !missing.is_empty() {
        bail!("Missing required fields: {}", missing.join(", "));
    }

    let request = form.submit()?;
    api.create_job(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    info!(name = %request.name, job_type = %request.job_type, "Job created");
    println!("Created job {}", request.name);
    Ok(())
}

async fn run_now(api: &dyn JobApi, config: &AppConfig, id: JobId) -> Result<()> {
    println!("Triggering job {}, waiting for it to settle...", id);
    let report = run_and_settle(api, id, config.refresh_delay()).await;

    match &report.job {
        Ok(job) => print_job(job, config),
        Err(e) => warn!(job_id = id, error = %e, "Could not refresh job"),
    }
    report.trigger.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    report.job?;
    Ok(())
}

async fn run_stats(api: &dyn JobApi) -> Result<()> {
    let stats = api.stats().await?;

    println!("Jobs:  {} total", stats.jobs.total);
    for (status, count) in &stats.jobs.by_status {
        println!("  {:<12} {}", status, count);
    }
    println!("Runs:  {} total", stats.runs.total);
    for (status, count) in &stats.runs.by_status {
        println!("  {:<12} {}", status, count);
    }

    match api.health().await {
        Ok(health) => {
            println!("Health: {}", health.status);
            for (key, value) in &health.details {
                println!("  {:<12} {}", key, value);
            }
        }
        Err(e) => {
            warn!(error = %e, "Health endpoint unavailable");
            println!("Health: {}", stats.health.status);
        }
    }
    Ok(())
}
