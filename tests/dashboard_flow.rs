//! Dashboard controller driven end to end against a mock Chronos server.

use std::sync::Arc;
use std::time::Duration;

use chronos_dash::api::HttpJobApi;
use chronos_dash::core::dashboard::{Dashboard, DashboardEvent, DashboardSettings};
use chronos_dash::core::form::JobForm;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SETTLE: Duration = Duration::from_millis(20);

fn dashboard(server: &MockServer) -> (Dashboard, UnboundedReceiver<DashboardEvent>) {
    let settings = DashboardSettings {
        refresh_delay: SETTLE,
        ..Default::default()
    };
    Dashboard::new(Arc::new(HttpJobApi::new(server.uri())), settings)
}

async fn next_event(events: &mut UnboundedReceiver<DashboardEvent>) -> DashboardEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event within timeout")
        .expect("channel open")
}

/// Feed events into the dashboard until `done` holds.
async fn pump_until(
    dash: &mut Dashboard,
    events: &mut UnboundedReceiver<DashboardEvent>,
    done: impl Fn(&Dashboard) -> bool,
) {
    while !done(dash) {
        let event = next_event(events).await;
        dash.handle_event(event);
    }
}

async fn list_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == "/api/jobs")
        .count()
}

async fn mount_jobs(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {
                    "id": 1,
                    "name": "nightly-report",
                    "owner": "data-team",
                    "type": "HTTP_REQUEST",
                    "status": "FAILED",
                    "recentRuns": [{ "error": "boom" }, { "output": "ok" }]
                },
                {
                    "id": 2,
                    "name": "compile",
                    "owner": "ops",
                    "type": "JAVA_CLASS",
                    "status": "RUNNING",
                    "recentRuns": [{ "output": "started" }]
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn initial_load_populates_cards() {
    let server = MockServer::start().await;
    mount_jobs(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/monitoring/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": { "total": 2, "failed": 1, "running": 1 },
            "runs": { "total": 3, "byStatus": {} },
            "health": { "status": "UP", "database": "UP" }
        })))
        .mount(&server)
        .await;
    let (mut dash, mut events) = dashboard(&server);

    assert!(dash.is_loading());
    dash.load_jobs();
    pump_until(&mut dash, &mut events, |d| {
        !d.is_loading() && d.stats().is_some()
    })
    .await;

    assert!(dash.error().is_none());
    assert_eq!(dash.jobs().len(), 2);
    assert_eq!(dash.last_outcome(&dash.jobs()[0]), Some("boom"));
    // JAVA_CLASS is not a textual type by default.
    assert_eq!(dash.last_outcome(&dash.jobs()[1]), None);
    assert_eq!(dash.stats().unwrap().jobs.total, 2);
    assert!(dash.stats().unwrap().health.is_up());
}

#[tokio::test]
async fn stalled_server_does_not_block_the_controller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(120)),
        )
        .mount(&server)
        .await;

    let api = HttpJobApi::new(server.uri()).with_timeout(Duration::from_millis(200));
    let (mut dash, mut events) = Dashboard::new(Arc::new(api), DashboardSettings::default());

    // None of these wait on the network.
    tokio::time::timeout(Duration::from_secs(1), async {
        dash.load_jobs();
        dash.handle_event(DashboardEvent::RefreshDue);
        dash.open_form();
    })
    .await
    .expect("controller calls return without waiting for the server");

    assert!(dash.is_form_open());
    assert!(dash.is_loading());

    pump_until(&mut dash, &mut events, |d| !d.is_loading()).await;
    assert_eq!(dash.error(), Some("Failed to fetch jobs"));
    assert!(dash.jobs().is_empty());
    assert!(dash.is_form_open());
}

#[tokio::test]
async fn run_now_settles_then_refreshes_once() {
    let server = MockServer::start().await;
    mount_jobs(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/1/run"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (mut dash, mut events) = dashboard(&server);
    dash.load_jobs();
    pump_until(&mut dash, &mut events, |d| !d.is_loading()).await;

    dash.trigger_run(1);
    assert!(dash.is_triggering(1));
    assert!(!dash.is_triggering(2));

    pump_until(&mut dash, &mut events, |d| d.triggering().is_none()).await;
    assert!(dash.notice().is_none());

    // The settle delay ends in exactly one list refresh.
    pump_until(&mut dash, &mut events, |d| d.is_loading()).await;
    pump_until(&mut dash, &mut events, |d| !d.is_loading()).await;
    assert_eq!(list_requests(&server).await, 2);

    tokio::time::sleep(SETTLE * 5).await;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, DashboardEvent::RefreshDue));
        dash.handle_event(event);
    }
    assert_eq!(list_requests(&server).await, 2);
}

#[tokio::test]
async fn failed_run_notifies_and_still_refreshes() {
    let server = MockServer::start().await;
    mount_jobs(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/2/run"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "already running"})))
        .mount(&server)
        .await;

    let (mut dash, mut events) = dashboard(&server);
    dash.load_jobs();
    pump_until(&mut dash, &mut events, |d| !d.is_loading()).await;
    dash.trigger_run(2);

    pump_until(&mut dash, &mut events, |d| d.triggering().is_none()).await;
    assert_eq!(dash.notice(), Some("Failed to trigger job"));

    pump_until(&mut dash, &mut events, |d| d.is_loading()).await;
    pump_until(&mut dash, &mut events, |d| !d.is_loading()).await;
    assert_eq!(list_requests(&server).await, 2);
}

#[tokio::test]
async fn failed_reload_keeps_previous_jobs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 9, "name": "solo", "owner": "ops", "type": "SHELL_SCRIPT", "status": "SCHEDULED" }
        ])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (mut dash, mut events) = dashboard(&server);
    dash.load_jobs();
    pump_until(&mut dash, &mut events, |d| !d.is_loading()).await;
    assert_eq!(dash.jobs().len(), 1);

    dash.load_jobs();
    pump_until(&mut dash, &mut events, |d| !d.is_loading()).await;
    assert_eq!(dash.jobs().len(), 1);
    assert_eq!(dash.jobs()[0].name, "solo");
    assert_eq!(dash.error(), Some("Failed to fetch jobs"));
}

#[tokio::test]
async fn rejected_create_keeps_the_draft() {
    let server = MockServer::start().await;
    mount_jobs(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Name taken"})))
        .mount(&server)
        .await;

    let (mut dash, mut events) = dashboard(&server);
    dash.open_form();
    let form = dash.form_mut().unwrap();
    form.common.name = "nightly-report".into();
    form.common.owner = "ops".into();

    dash.submit_form();
    assert!(dash.is_creating());
    pump_until(&mut dash, &mut events, |d| !d.is_creating()).await;

    assert!(dash.is_form_open());
    assert_eq!(dash.form().unwrap().common.name, "nightly-report");
    assert_eq!(dash.notice(), Some("Failed to create job: Name taken"));
    assert_eq!(list_requests(&server).await, 0);
}

#[tokio::test]
async fn accepted_create_closes_and_reloads() {
    let server = MockServer::start().await;
    mount_jobs(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let (mut dash, mut events) = dashboard(&server);
    let mut form = JobForm::new();
    form.common.name = "fresh".into();
    form.common.owner = "ops".into();
    let request = form.submit().unwrap();

    dash.open_form();
    dash.create_job(request);
    pump_until(&mut dash, &mut events, |d| !d.is_form_open()).await;
    pump_until(&mut dash, &mut events, |d| !d.is_loading()).await;

    assert!(dash.notice().is_none());
    assert_eq!(list_requests(&server).await, 1);
    assert_eq!(dash.jobs().len(), 2);
}

#[tokio::test]
async fn detail_falls_back_to_embedded_runs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "nightly-report",
            "owner": "data-team",
            "type": "HTTP_REQUEST",
            "status": "COMPLETED",
            "recentRuns": [{ "status": "COMPLETED", "output": "200 OK" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/1/runs"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (mut dash, mut events) = dashboard(&server);
    dash.load_detail(1);
    assert!(dash.is_detail_open());
    pump_until(&mut dash, &mut events, |d| d.detail().is_some()).await;

    let detail = dash.detail().unwrap();
    assert_eq!(detail.job.id, 1);
    assert_eq!(detail.runs.len(), 1);
    assert_eq!(detail.runs[0].output.as_deref(), Some("200 OK"));

    dash.clear_detail();
    assert!(dash.detail().is_none());
}
