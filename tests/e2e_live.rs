//! End-to-end tests with the real conversion API
//!
//! These tests talk to the production service using credentials from .env
//! All tests are marked #[ignore] to prevent running in normal CI.
//!
//! # Running the tests
//!
//! ```bash
//! # Run all live E2E tests
//! cargo test --features live-tests --test e2e_live -- --ignored --nocapture
//!
//! # Run a specific test
//! cargo test --features live-tests --test e2e_live import_and_poll -- --ignored --nocapture
//! ```
//!
//! # Required environment variables (.env file)
//!
//! - `FILECONVERT_API_KEY` - API key from your account dashboard
//! - `FILECONVERT_API_BASE` - API base URL (optional, defaults to production)
//! - `FILECONVERT_NOTIFICATION_URL` - Notification endpoint (optional)

#![cfg(feature = "live-tests")]

use serial_test::serial;
use std::time::Duration;

use fileconvert::{
    CompletionWatcher, Config, ConvertClient, JobSpec, NotificationChannel, PollingWatcher,
    Status, SubscriptionWatcher, TaskSpec, find_task_result,
};

const SAMPLE_URL: &str = "https://cdn.freeconvert.com/logo_theme.svg";

fn live_config() -> Option<Config> {
    dotenvy::dotenv().ok();
    let api_key = std::env::var("FILECONVERT_API_KEY").ok()?;
    let mut config = Config::new(api_key);
    if let Ok(base) = std::env::var("FILECONVERT_API_BASE") {
        config.api_base = base;
    }
    if let Ok(url) = std::env::var("FILECONVERT_NOTIFICATION_URL") {
        config.notification.url = url;
    }
    Some(config)
}

fn pipeline_spec() -> JobSpec {
    JobSpec::new()
        .task(
            "myImport1",
            TaskSpec::import_url(SAMPLE_URL).filename("logo.svg"),
        )
        .unwrap()
        .task(
            "myConvert1",
            TaskSpec::convert("myImport1")
                .output_format("jpg")
                .option("background", "#FFFFFF"),
        )
        .unwrap()
        .task(
            "myExport1",
            TaskSpec::export_url("myConvert1").filename("my-converted-file.jpg"),
        )
        .unwrap()
}

/// Submit a single import task and poll it to completion
#[tokio::test]
#[ignore]
#[serial]
async fn import_and_poll() {
    let Some(config) = live_config() else {
        eprintln!("Skipping: FILECONVERT_API_KEY not found in .env");
        return;
    };

    let client = ConvertClient::new(config).unwrap();
    let task = client
        .submit_task(&TaskSpec::import_url(SAMPLE_URL).filename("logo.svg"))
        .await
        .unwrap();
    println!("created task {}", task.id);

    let watcher = PollingWatcher::new(client);
    let finished = watcher.wait_for_task(&task.id).await.unwrap();
    println!("task finished with status {:?}", finished.status);
    assert!(finished.is_terminal());
}

/// Submit the import -> convert -> export pipeline and resolve the export URL
#[tokio::test]
#[ignore]
#[serial]
async fn job_pipeline_with_polling() {
    let Some(config) = live_config() else {
        eprintln!("Skipping: FILECONVERT_API_KEY not found in .env");
        return;
    };

    let client = ConvertClient::new(config.clone()).unwrap();
    let job = client.submit_job(&pipeline_spec()).await.unwrap();
    println!("created job {}", job.id);

    let watcher = PollingWatcher::with_schedule(client, Duration::from_secs(2), 30);
    let finished = watcher.wait_for_job(&job.id).await.unwrap();
    assert_eq!(finished.status, Status::Completed);

    let result = find_task_result(&finished, "myExport1").unwrap();
    println!("download url: {:?}", result.url);
    assert!(result.url.is_some());
}

/// Watch the same pipeline over the notification channel
#[tokio::test]
#[ignore]
#[serial]
async fn job_pipeline_with_subscription() {
    let Some(config) = live_config() else {
        eprintln!("Skipping: FILECONVERT_API_KEY not found in .env");
        return;
    };

    let client = ConvertClient::new(config.clone()).unwrap();
    let channel = NotificationChannel::connect(&config).await.unwrap();
    let job = client.submit_job(&pipeline_spec()).await.unwrap();
    println!("created job {}", job.id);

    let watcher = SubscriptionWatcher::new(client, channel.clone());
    let finished = tokio::time::timeout(Duration::from_secs(120), watcher.wait_for_job(&job.id))
        .await
        .expect("job did not finish within the deadline")
        .unwrap();
    assert!(finished.is_terminal());

    channel.close().await.unwrap();
}
