//! Core types for fileconvert
//!
//! Server-assigned objects (tasks, jobs, results) and the identifiers used
//! to address them. Tasks and jobs live on the remote service for the
//! lifetime of a conversion pipeline; this client only observes them and
//! eventually discards its local handle — it never deletes remote state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::upload::UploadForm;

/// Unique identifier for a task
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a job
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new JobId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task or job status
///
/// `Completed` and `Failed` are terminal: no further transitions occur
/// after either is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Accepted by the remote service, not yet scheduled
    Created,
    /// Currently being processed
    Processing,
    /// Successfully completed
    Completed,
    /// Failed with error detail in the result object
    Failed,
}

impl Status {
    /// Returns true for `Completed` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

/// Remote operation a task performs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Import a file from a URL
    #[serde(rename = "import/url")]
    ImportUrl,
    /// Import a file via a one-time direct upload
    #[serde(rename = "import/upload")]
    ImportUpload,
    /// Import a rendered webpage
    #[serde(rename = "import/webpage")]
    ImportWebpage,
    /// Convert an input to another format
    #[serde(rename = "convert")]
    Convert,
    /// Merge multiple inputs into one output
    #[serde(rename = "merge")]
    Merge,
    /// Export a result to a downloadable URL
    #[serde(rename = "export/url")]
    ExportUrl,
}

impl Operation {
    /// The operation's wire name, which is also its submission path segment
    /// under `/process/`
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ImportUrl => "import/url",
            Operation::ImportUpload => "import/upload",
            Operation::ImportWebpage => "import/webpage",
            Operation::Convert => "convert",
            Operation::Merge => "merge",
            Operation::ExportUrl => "export/url",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of remote conversion work, as reported by the service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier
    pub id: TaskId,

    /// Caller-chosen name; present only when the task was created inside a job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The operation this task performs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,

    /// Current status
    pub status: Status,

    /// Operation-dependent result; populated once the task is terminal
    /// (download URL or upload form on completion, failure detail on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,

    /// When the server created the task, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Whether the task has reached `completed` or `failed`
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// A named collection of interdependent tasks submitted and tracked as a unit
///
/// A job reaches `completed` only when every child task completes, and
/// `failed` as soon as any child task fails. There is no partial-success
/// state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    /// Server-assigned identifier
    pub id: JobId,

    /// Current status
    pub status: Status,

    /// Child tasks; ordering is server-defined and carries no meaning
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Top-level failure detail when the job failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,

    /// When the server created the job, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Whether the job has reached `completed` or `failed`
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Find a child task by its caller-chosen name
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name.as_deref() == Some(name))
    }
}

/// Operation-dependent result object attached to a terminal task or job
///
/// The shape varies by operation: export tasks carry a download `url`,
/// upload tasks carry a one-time `form` descriptor, and failed tasks or
/// jobs carry `errorCode` and `msg`. Fields this client does not model are
/// preserved in `extra`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TaskResult {
    /// Download URL for an exported file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// One-time upload form descriptor (upload tasks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<UploadForm>,

    /// Machine-readable failure code
    #[serde(rename = "errorCode", default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,

    /// Failure message, possibly padded with incidental whitespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    /// Result fields not otherwise modeled
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskResult {
    /// Extract failure detail, trimming the message of surrounding whitespace
    ///
    /// Returns `None` when the result carries neither an error code nor a
    /// message.
    pub fn failure_detail(&self) -> Option<FailureDetail> {
        if self.error_code.is_none() && self.msg.is_none() {
            return None;
        }
        Some(FailureDetail {
            error_code: self.error_code,
            message: self.msg.as_deref().unwrap_or_default().trim().to_string(),
        })
    }

    /// Take an owned copy of the one-time upload form, if present
    pub fn upload_form(&self) -> Option<UploadForm> {
        self.form.clone()
    }
}

/// Failure description extracted from a terminal `failed` task or job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Machine-readable failure code, when the service provided one
    pub error_code: Option<i64>,
    /// Human-readable message, trimmed of surrounding whitespace
    pub message: String,
}

impl Default for FailureDetail {
    fn default() -> Self {
        Self {
            error_code: None,
            message: "no failure detail provided".to_string(),
        }
    }
}

impl std::fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.error_code {
            Some(code) => write!(f, "[{}] - {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminal_classification() {
        assert!(!Status::Created.is_terminal());
        assert!(!Status::Processing.is_terminal());
        assert!(Status::Completed.is_terminal());
        assert!(Status::Failed.is_terminal());
    }

    #[test]
    fn status_deserializes_lowercase() {
        let status: Status = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, Status::Processing);
    }

    #[test]
    fn operation_wire_names_round_trip() {
        for op in [
            Operation::ImportUrl,
            Operation::ImportUpload,
            Operation::ImportWebpage,
            Operation::Convert,
            Operation::Merge,
            Operation::ExportUrl,
        ] {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
            let back: Operation = serde_json::from_str(&json).unwrap();
            assert_eq!(back, op);
        }
    }

    #[test]
    fn task_deserializes_from_wire_shape() {
        let task: Task = serde_json::from_str(
            r#"{
                "id": "task-abc123",
                "name": "myExport1",
                "operation": "export/url",
                "status": "completed",
                "result": {"url": "https://x/y.jpg"}
            }"#,
        )
        .unwrap();
        assert_eq!(task.id.as_str(), "task-abc123");
        assert_eq!(task.name.as_deref(), Some("myExport1"));
        assert_eq!(task.operation, Some(Operation::ExportUrl));
        assert!(task.is_terminal());
        assert_eq!(task.result.unwrap().url.as_deref(), Some("https://x/y.jpg"));
    }

    #[test]
    fn job_finds_child_task_by_name() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": "job-1",
                "status": "completed",
                "tasks": [
                    {"id": "t1", "name": "myImport1", "status": "completed"},
                    {"id": "t2", "name": "myExport1", "status": "completed"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(job.task("myExport1").unwrap().id.as_str(), "t2");
        assert!(job.task("missing").is_none());
    }

    #[test]
    fn failure_detail_trims_message() {
        let result: TaskResult =
            serde_json::from_str(r#"{"errorCode": 4001, "msg": "  bad format  "}"#).unwrap();
        let detail = result.failure_detail().unwrap();
        assert_eq!(detail.error_code, Some(4001));
        assert_eq!(detail.message, "bad format");
    }

    #[test]
    fn failure_detail_absent_on_success_result() {
        let result: TaskResult = serde_json::from_str(r#"{"url": "https://x/y.jpg"}"#).unwrap();
        assert!(result.failure_detail().is_none());
    }

    #[test]
    fn failure_detail_display_matches_reporting_format() {
        let detail = FailureDetail {
            error_code: Some(500),
            message: "Unsupported input".to_string(),
        };
        assert_eq!(detail.to_string(), "[500] - Unsupported input");
    }

    #[test]
    fn task_result_preserves_unmodeled_fields() {
        let result: TaskResult =
            serde_json::from_str(r#"{"url": "https://x/y.jpg", "size": 1024}"#).unwrap();
        assert_eq!(result.extra.get("size").and_then(|v| v.as_i64()), Some(1024));
    }
}
