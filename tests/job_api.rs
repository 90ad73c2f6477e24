//! HTTP client behaviour against a mock Chronos server.

use chronos_dash::api::{ApiError, HttpJobApi, JobApi, JobQuery, RescheduleRequest};
use chronos_dash::core::form::JobForm;
use chronos_dash::core::models::{JobStatus, JobType};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jobs_json() -> Value {
    json!([
        {
            "id": 1,
            "name": "nightly-report",
            "owner": "data-team",
            "type": "HTTP_REQUEST",
            "status": "COMPLETED",
            "isRecurring": true,
            "schedule": "0 0 2 * * ?",
            "lastRunTime": "2024-03-01T02:00:00",
            "nextRunTime": "2024-03-02T02:00:00",
            "recentRuns": [
                { "id": 10, "status": "COMPLETED", "output": "200 OK", "startedAt": "2024-03-01T02:00:00" }
            ]
        },
        {
            "id": 2,
            "name": "cleanup",
            "owner": "ops",
            "type": "SHELL_SCRIPT",
            "status": "PENDING",
            "recentRuns": null
        }
    ])
}

#[tokio::test]
async fn bare_and_paged_lists_decode_the_same() {
    let bare = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jobs_json()))
        .mount(&bare)
        .await;

    let paged = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": jobs_json(),
            "totalElements": 2,
            "number": 0
        })))
        .mount(&paged)
        .await;

    let query = JobQuery::default();
    let from_bare = HttpJobApi::new(bare.uri()).list_jobs(&query).await.unwrap();
    let from_page = HttpJobApi::new(paged.uri()).list_jobs(&query).await.unwrap();

    assert_eq!(from_bare, from_page);
    assert_eq!(from_bare.len(), 2);
    assert_eq!(from_bare[0].status, JobStatus::Completed);
    assert_eq!(from_bare[0].recent_runs.len(), 1);
    assert_eq!(from_bare[1].job_type, JobType::ShellScript);
    assert!(from_bare[1].recent_runs.is_empty());
}

#[tokio::test]
async fn list_sends_owner_and_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .and(query_param("owner", "ops"))
        .and(query_param("size", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let query = JobQuery {
        owner: Some("ops".into()),
        page: None,
        size: Some(50),
    };
    let jobs = HttpJobApi::new(server.uri()).list_jobs(&query).await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn create_posts_job_data_as_a_json_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let mut form = JobForm::new();
    form.common.name = "ping".into();
    form.common.owner = "ops".into();
    form.common.schedule = "2024-12-31T23:59:00".into();
    form.details.http.url = "https://example.com/health".into();
    form.details.shell.script = "echo leftover".into();
    let request = form.submit().unwrap();

    HttpJobApi::new(server.uri())
        .create_job(&request)
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: Value = received[0].body_json().unwrap();

    assert_eq!(body["name"], "ping");
    assert_eq!(body["type"], "HTTP_REQUEST");
    assert_eq!(body["isRecurring"], false);
    assert_eq!(body["maxRetries"], 3);

    let job_data: Value = serde_json::from_str(body["jobData"].as_str().unwrap()).unwrap();
    assert_eq!(
        job_data,
        json!({"url": "https://example.com/health", "method": "GET", "timeout": 60})
    );
    let config: Value = serde_json::from_str(body["config"].as_str().unwrap()).unwrap();
    assert_eq!(config, json!({"retryDelaySeconds": 5}));
}

#[tokio::test]
async fn server_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid cron expression"})),
        )
        .mount(&server)
        .await;

    let mut form = JobForm::new();
    form.common.name = "bad".into();
    form.common.owner = "ops".into();
    let request = form.submit().unwrap();

    let err = HttpJobApi::new(server.uri())
        .create_job(&request)
        .await
        .unwrap_err();

    match &err {
        ApiError::Status { status, message, .. } => {
            assert_eq!(*status, 400);
            assert_eq!(message.as_deref(), Some("Invalid cron expression"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Invalid cron expression");
}

#[tokio::test]
async fn plain_text_error_falls_back_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/3/run"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = HttpJobApi::new(server.uri()).trigger_run(3).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, message: None, .. }));
    assert!(err.user_message().contains("500"));
}

#[tokio::test]
async fn run_and_cancel_hit_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/4/run"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/4/cancel"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpJobApi::new(server.uri());
    api.trigger_run(4).await.unwrap();
    api.cancel_job(4).await.unwrap();
}

#[tokio::test]
async fn reschedule_returns_updated_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/1/reschedule"))
        .and(body_json(json!({"schedule": "0 */5 * * * ?", "isRecurring": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "nightly-report",
            "owner": "data-team",
            "type": "HTTP_REQUEST",
            "status": "SCHEDULED",
            "schedule": "0 */5 * * * ?"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = RescheduleRequest {
        schedule: "0 */5 * * * ?".into(),
        is_recurring: Some(true),
    };
    let job = HttpJobApi::new(server.uri())
        .reschedule_job(1, &request)
        .await
        .unwrap();
    assert_eq!(job.schedule.as_deref(), Some("0 */5 * * * ?"));
    assert_eq!(job.status, JobStatus::Scheduled);
}

#[tokio::test]
async fn single_job_and_runs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2,
            "name": "cleanup",
            "owner": "ops",
            "type": "SHELL_SCRIPT",
            "status": "PAUSED"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/2/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "status": "FAILED", "error": "exit 1", "startedAt": "2024-03-01T10:00:00Z" },
                { "status": "COMPLETED", "output": "done" }
            ]
        })))
        .mount(&server)
        .await;

    let api = HttpJobApi::new(server.uri());
    let job = api.get_job(2).await.unwrap();
    assert_eq!(job.status, JobStatus::Other("PAUSED".into()));

    let runs = api.list_runs(2).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].error.as_deref(), Some("exit 1"));
    assert!(runs[0].started_at.is_some());
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = HttpJobApi::new(server.uri())
        .list_jobs(&JobQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn monitoring_stats_and_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/monitoring/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": { "total": 6, "pending": 1, "running": 2, "failed": 3 },
            "runs": { "total": 14, "byStatus": { "completed": 11, "failed": 3 } },
            "health": { "status": "UP", "database": "UP" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/monitoring/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "UP",
            "service": "chronos"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpJobApi::new(server.uri());
    let stats = api.stats().await.unwrap();
    assert_eq!(stats.jobs.total, 6);
    assert_eq!(stats.jobs.count(&JobStatus::Running), 2);
    assert_eq!(stats.jobs.count(&JobStatus::Completed), 0);
    assert!(!stats.jobs.by_status.contains_key("total"));
    assert_eq!(stats.runs.total, 14);
    assert_eq!(stats.runs.by_status.get("completed"), Some(&11));
    assert!(stats.health.is_up());
    assert_eq!(stats.health.details.get("database").map(String::as_str), Some("UP"));

    let health = api.health().await.unwrap();
    assert!(health.is_up());
    assert_eq!(health.details.get("service").map(String::as_str), Some("chronos"));
}

#[tokio::test]
async fn single_run_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/1/runs/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 10,
            "jobId": 1,
            "status": "FAILED",
            "error": "timeout",
            "retryAttempt": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let run = HttpJobApi::new(server.uri()).get_run(1, 10).await.unwrap();
    assert_eq!(run.id, Some(10));
    assert_eq!(run.job_id, Some(1));
    assert_eq!(run.status, JobStatus::Failed);
    assert_eq!(run.retry_attempt, Some(2));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/1"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(120)))
        .mount(&server)
        .await;

    let err = HttpJobApi::new(server.uri())
        .with_timeout(std::time::Duration::from_millis(100))
        .get_job(1)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Request(_)));
}
