//! Fixtures for mocking the conversion REST API

use fileconvert::Config;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a configuration pointing at mock endpoints
pub fn test_config(api_base: &str, notification_url: &str) -> Config {
    let mut config = Config::new("test_key");
    config.api_base = api_base.to_string();
    config.notification.url = notification_url.to_string();
    config
}

/// JSON body for a child task inside a job response
pub fn task_json(id: &str, name: &str, status: &str, result: Option<Value>) -> Value {
    let mut task = json!({"id": id, "name": name, "status": status});
    if let Some(result) = result {
        task["result"] = result;
    }
    task
}

/// JSON body for a job response
pub fn job_json(id: &str, status: &str, tasks: Vec<Value>) -> Value {
    json!({"id": id, "status": status, "tasks": tasks})
}

/// The three-step import -> convert -> export job used across scenarios
pub fn pipeline_job_json(status: &str, export_result: Option<Value>) -> Value {
    job_json(
        "job-1",
        status,
        vec![
            task_json("t-import", "myImport1", child_status(status), None),
            task_json("t-convert", "myConvert1", child_status(status), None),
            task_json("t-export", "myExport1", child_status(status), export_result),
        ],
    )
}

fn child_status(job_status: &str) -> &str {
    match job_status {
        "completed" => "completed",
        "failed" => "failed",
        other => other,
    }
}

/// Mount a sequence of GET responses for a job, served in order
///
/// Every entry except the last is served exactly once; the last entry
/// answers all remaining fetches.
pub async fn mount_job_sequence(server: &MockServer, id: &str, bodies: &[Value]) {
    let route = format!("/process/jobs/{id}");
    let (last, leading) = bodies.split_last().expect("at least one body");
    for body in leading {
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(last))
        .mount(server)
        .await;
}

/// Mount a POST /process/jobs response
pub async fn mount_job_submission(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/process/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(body))
        .mount(server)
        .await;
}

/// Count the GET fetches a job received
pub async fn job_fetch_count(server: &MockServer, id: &str) -> usize {
    let route = format!("/process/jobs/{id}");
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|r| r.method == wiremock::http::Method::GET && r.url.path() == route)
        .count()
}
