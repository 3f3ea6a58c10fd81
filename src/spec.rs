//! Task and job specifications
//!
//! [`TaskSpec`] describes one unit of remote work before submission;
//! [`JobSpec`] groups named task specs into a single submission whose
//! dependency order is resolved by the remote service — the client never
//! computes it. Both exist only client-side and are consumed by
//! submission.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{Operation, TaskId};

/// Reference from a task to the input(s) it consumes
///
/// A reference names either another task in the same job or a
/// previously-created task identifier from outside the job. Merge and
/// archive operations take many inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputRef {
    /// A single upstream task name or identifier
    Single(String),
    /// Multiple upstream task names or identifiers
    Many(Vec<String>),
}

impl InputRef {
    fn refs(&self) -> impl Iterator<Item = &str> {
        match self {
            InputRef::Single(s) => std::slice::from_ref(s).iter(),
            InputRef::Many(v) => v.iter(),
        }
        .map(String::as_str)
    }
}

impl From<&str> for InputRef {
    fn from(value: &str) -> Self {
        InputRef::Single(value.to_string())
    }
}

impl From<String> for InputRef {
    fn from(value: String) -> Self {
        InputRef::Single(value)
    }
}

impl From<&TaskId> for InputRef {
    fn from(value: &TaskId) -> Self {
        InputRef::Single(value.as_str().to_string())
    }
}

impl From<TaskId> for InputRef {
    fn from(value: TaskId) -> Self {
        InputRef::Single(value.0)
    }
}

impl<S: Into<String>> From<Vec<S>> for InputRef {
    fn from(value: Vec<S>) -> Self {
        InputRef::Many(value.into_iter().map(Into::into).collect())
    }
}

/// Specification of one unit of remote work
///
/// Create one with the per-operation constructors, refine it with the
/// chainable setters, and submit it with
/// [`ConvertClient::submit_task`](crate::ConvertClient::submit_task) or as
/// part of a [`JobSpec`]. Immutable once submitted.
///
/// ```
/// use fileconvert::TaskSpec;
///
/// let convert = TaskSpec::convert("myImport1")
///     .output_format("jpg")
///     .option("background", "#FFFFFF");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskSpec {
    operation: Operation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    input: Option<InputRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    archive_multiple_files: Option<bool>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    options: Map<String, Value>,
}

impl TaskSpec {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            input: None,
            url: None,
            filename: None,
            input_format: None,
            output_format: None,
            archive_multiple_files: None,
            options: Map::new(),
        }
    }

    /// Import a file fetched from a URL
    pub fn import_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(Operation::ImportUrl)
        }
    }

    /// Import a file via a one-time direct upload
    ///
    /// The created task's result carries the upload form to consume with
    /// [`ConvertClient::upload_file`](crate::ConvertClient::upload_file).
    pub fn import_upload() -> Self {
        Self::new(Operation::ImportUpload)
    }

    /// Import a rendered webpage
    pub fn import_webpage(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(Operation::ImportWebpage)
        }
    }

    /// Convert an input to another format
    pub fn convert(input: impl Into<InputRef>) -> Self {
        Self {
            input: Some(input.into()),
            ..Self::new(Operation::Convert)
        }
    }

    /// Merge multiple inputs into a single output
    pub fn merge<S: Into<String>>(inputs: Vec<S>) -> Self {
        Self {
            input: Some(InputRef::from(inputs)),
            ..Self::new(Operation::Merge)
        }
    }

    /// Export an input to a downloadable URL
    pub fn export_url(input: impl Into<InputRef>) -> Self {
        Self {
            input: Some(input.into()),
            ..Self::new(Operation::ExportUrl)
        }
    }

    /// Set the filename the service should use for the result
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Override the detected input format
    pub fn input_format(mut self, format: impl Into<String>) -> Self {
        self.input_format = Some(format.into());
        self
    }

    /// Set the target output format
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    /// Package multiple exported inputs into a single archive
    pub fn archive_multiple_files(mut self, archive: bool) -> Self {
        self.archive_multiple_files = Some(archive);
        self
    }

    /// Attach an operation-specific option
    ///
    /// Options are opaque to the client; their semantics are validated by
    /// the remote service.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// The operation this spec performs
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Validate the basic shape of the spec before transmission
    ///
    /// Checks input references and operation parameters for emptiness only;
    /// option semantics are the remote service's responsibility.
    pub fn validate(&self) -> Result<()> {
        if let Some(input) = &self.input {
            let mut count = 0usize;
            for reference in input.refs() {
                count += 1;
                if reference.trim().is_empty() {
                    return Err(Error::InvalidSpec {
                        message: format!("{} task has an empty input reference", self.operation),
                    });
                }
            }
            if count == 0 {
                return Err(Error::InvalidSpec {
                    message: format!("{} task has an empty input list", self.operation),
                });
            }
        }

        match self.operation {
            Operation::ImportUrl | Operation::ImportWebpage => {
                if self.url.as_deref().is_none_or(|u| u.trim().is_empty()) {
                    return Err(Error::InvalidSpec {
                        message: format!("{} task requires a url", self.operation),
                    });
                }
            }
            Operation::Convert | Operation::Merge | Operation::ExportUrl => {
                if self.input.is_none() {
                    return Err(Error::InvalidSpec {
                        message: format!("{} task requires an input reference", self.operation),
                    });
                }
            }
            Operation::ImportUpload => {}
        }

        Ok(())
    }

    /// Serialize the submission body for a standalone task
    ///
    /// The operation is carried by the submission path, not the body, so it
    /// is stripped here.
    pub(crate) fn payload(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(object) = value.as_object_mut() {
            object.remove("operation");
        }
        Ok(value)
    }
}

/// A mapping from caller-chosen task names to task specs, submitted as one job
///
/// Task names must be unique within the job; insertion order carries no
/// meaning. Every input reference inside the job must name another task in
/// the same job or an existing task identifier from outside it — the
/// remote service resolves the dependency order.
///
/// ```
/// use fileconvert::{JobSpec, TaskSpec};
///
/// # fn build() -> fileconvert::Result<JobSpec> {
/// let job = JobSpec::new()
///     .task("myImport1", TaskSpec::import_url("https://cdn.example.com/logo.svg"))?
///     .task("myConvert1", TaskSpec::convert("myImport1").output_format("jpg"))?
///     .task("myExport1", TaskSpec::export_url("myConvert1"))?;
/// # Ok(job)
/// # }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobSpec {
    tasks: BTreeMap<String, TaskSpec>,
}

impl JobSpec {
    /// Create an empty job spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named task to the job
    ///
    /// Fails with [`Error::InvalidSpec`] when the name is empty or already
    /// taken.
    pub fn task(mut self, name: impl Into<String>, spec: TaskSpec) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidSpec {
                message: "task name must not be empty".to_string(),
            });
        }
        if self.tasks.contains_key(&name) {
            return Err(Error::InvalidSpec {
                message: format!("duplicate task name {name:?}"),
            });
        }
        self.tasks.insert(name, spec);
        Ok(self)
    }

    /// Number of tasks in the job
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the job has no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate over the caller-chosen task names
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Validate the basic shape of every task in the job
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(Error::InvalidSpec {
                message: "job must contain at least one task".to_string(),
            });
        }
        for (name, spec) in &self.tasks {
            spec.validate().map_err(|e| match e {
                Error::InvalidSpec { message } => Error::InvalidSpec {
                    message: format!("task {name:?}: {message}"),
                },
                other => other,
            })?;
        }
        Ok(())
    }
}
