//! Request layer for the conversion API
//!
//! [`ConvertClient`] builds and sends authenticated HTTP requests to
//! create tasks and jobs, fetch their status, and consume upload forms.
//! Every call is attempted exactly once — transient failures surface to
//! the caller, and retry policy (if any) is the caller's decision layered
//! on top.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::spec::{JobSpec, TaskSpec};
use crate::types::{Job, JobId, Task, TaskId};
use crate::upload::UploadForm;

/// Structured error body the API attaches to non-2xx responses
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated HTTP client for the conversion API (cloneable — all
/// fields are cheap handles)
///
/// Holds no mutable state beyond connection configuration: the base
/// endpoint, the bearer credential, and a shared connection pool.
///
/// ```no_run
/// use fileconvert::{Config, ConvertClient, TaskSpec};
///
/// # async fn example() -> fileconvert::Result<()> {
/// let client = ConvertClient::new(Config::new("my_api_key"))?;
/// let task = client
///     .submit_task(&TaskSpec::import_url("https://cdn.example.com/logo.svg"))
///     .await?;
/// println!("created task {}", task.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConvertClient {
    /// Client for API calls, carrying the bearer credential
    http: reqwest::Client,
    /// Bare client for upload-form submissions (storage endpoints are
    /// pre-signed and must not receive the API credential)
    upload_http: reqwest::Client,
    config: Arc<Config>,
}

impl ConvertClient {
    /// Create a new client from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", config.api_key);
        let mut auth = HeaderValue::from_str(&bearer).map_err(|_| Error::Config {
            message: "api_key contains characters not valid in a header".to_string(),
            key: Some("api_key".to_string()),
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;
        let upload_http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            http,
            upload_http,
            config: Arc::new(config),
        })
    }

    /// The configuration this client was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Submit a single task specification
    ///
    /// Returns the freshly assigned task with its server identifier and
    /// initial status.
    pub async fn submit_task(&self, spec: &TaskSpec) -> Result<Task> {
        spec.validate()?;
        let url = self.endpoint(&format!("process/{}", spec.operation().as_str()));
        let body = spec.payload()?;
        tracing::debug!(operation = %spec.operation(), "submitting task");
        let task: Task = self.post_json(&url, &body).await?;
        tracing::info!(id = %task.id, operation = %spec.operation(), "task created");
        Ok(task)
    }

    /// Submit a job of named task specifications
    ///
    /// The remote service resolves the dependency order between the job's
    /// tasks. Returns the job with its child tasks and their identifiers.
    pub async fn submit_job(&self, spec: &JobSpec) -> Result<Job> {
        spec.validate()?;
        let url = self.endpoint("process/jobs");
        tracing::debug!(tasks = spec.len(), "submitting job");
        let job: Job = self.post_json(&url, spec).await?;
        tracing::info!(id = %job.id, tasks = job.tasks.len(), "job created");
        Ok(job)
    }

    /// Fetch the current state of a task
    pub async fn get_task(&self, id: &TaskId) -> Result<Task> {
        let url = self.endpoint(&format!("process/tasks/{}", id));
        tracing::debug!(id = %id, "fetching task");
        let response = self.http.get(&url).send().await?;
        Self::decode(response).await
    }

    /// Fetch the current state of a job, including its child tasks
    pub async fn get_job(&self, id: &JobId) -> Result<Job> {
        let url = self.endpoint(&format!("process/jobs/{}", id));
        tracing::debug!(id = %id, "fetching job");
        let response = self.http.get(&url).send().await?;
        Self::decode(response).await
    }

    /// Consume an upload form by submitting a local file
    ///
    /// The form is a one-time resource and is consumed by this call; the
    /// referencing import task leaves its initial state once the storage
    /// endpoint accepts the upload.
    pub async fn upload_file(&self, form: UploadForm, file: &Path) -> Result<()> {
        form.submit(&self.upload_http, file).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.http.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    /// Decode a 2xx body, or turn a non-2xx response into [`Error::Api`]
    /// with whatever structure the error body carries.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
        let (code, message) = match parsed {
            Some(ApiErrorBody {
                code,
                message: Some(message),
            }) => (code, message),
            Some(ApiErrorBody { code, message: None }) => (code, body.trim().to_string()),
            None => (None, body.trim().to_string()),
        };
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            message
        };
        tracing::warn!(status = status.as_u16(), message = %message, "API request failed");
        Err(Error::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
