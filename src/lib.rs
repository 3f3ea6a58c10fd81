//! # fileconvert
//!
//! Async client library for orchestrating work against a file-conversion
//! REST API and its companion real-time notification channel.
//!
//! ## Design Philosophy
//!
//! fileconvert is designed to be:
//! - **Thin** - a faithful client for the remote service, nothing more;
//!   all scheduling and dependency resolution happens remotely
//! - **Single-attempt** - every request is tried exactly once; retry
//!   policy belongs to the caller
//! - **Strategy-agnostic** - polling and push subscription are
//!   interchangeable behind one trait, with identical terminal results
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use fileconvert::{
//!     CompletionWatcher, Config, ConvertClient, JobSpec, PollingWatcher, TaskSpec,
//!     find_task_result,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ConvertClient::new(Config::new("my_api_key"))?;
//!
//!     // Compose a job: import, convert, export. The service resolves the
//!     // dependency order between the named tasks.
//!     let spec = JobSpec::new()
//!         .task("myImport1", TaskSpec::import_url("https://cdn.example.com/logo.svg")
//!             .filename("logo.svg"))?
//!         .task("myConvert1", TaskSpec::convert("myImport1")
//!             .output_format("jpg")
//!             .option("background", "#FFFFFF"))?
//!         .task("myExport1", TaskSpec::export_url("myConvert1")
//!             .filename("my-converted-file.jpg"))?;
//!     let job = client.submit_job(&spec).await?;
//!
//!     // Wait for completion, then pull the export URL out of the result.
//!     let watcher = PollingWatcher::new(client);
//!     let finished = watcher.wait_for_job(&job.id).await?;
//!     let result = find_task_result(&finished, "myExport1")?;
//!     println!("download: {:?}", result.url);
//!     Ok(())
//! }
//! ```
//!
//! For real-time updates instead of polling, connect a
//! [`NotificationChannel`] and use a [`SubscriptionWatcher`]; both
//! strategies return the same terminal objects.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Request layer for the conversion API
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Real-time notification channel
pub mod notify;
/// Result resolution for terminal jobs and tasks
pub mod resolver;
/// Task and job specifications
pub mod spec;
/// Core types (tasks, jobs, results, identifiers)
pub mod types;
/// One-time upload form handling
pub mod upload;
/// Completion watching strategies
pub mod watcher;

// Re-export commonly used types
pub use client::ConvertClient;
pub use config::{Config, NotificationConfig, PollConfig};
pub use error::{Error, Result};
pub use notify::{
    EventPayload, NotificationChannel, NotificationEvent, ReconnectConfig, Subscription, Topic,
};
pub use resolver::{ensure_completed, find_task_result, job_failure_detail, task_failure_detail};
pub use spec::{InputRef, JobSpec, TaskSpec};
pub use types::{FailureDetail, Job, JobId, Operation, Status, Task, TaskId, TaskResult};
pub use upload::UploadForm;
pub use watcher::{CompletionWatcher, PollingWatcher, SubscriptionWatcher};
