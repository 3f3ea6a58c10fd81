//! Result resolution for terminal jobs and tasks
//!
//! Once a completion watcher has returned a terminal object, these
//! helpers extract named sub-results and failure detail. Calling them on a
//! non-terminal object is a caller contract violation — await a terminal
//! watcher result first.

use crate::error::{Error, Result};
use crate::types::{FailureDetail, Job, Status, Task, TaskResult};

/// Find a named child task's result in a terminal job
///
/// Walks the job's unordered child collection by name. Returns
/// [`Error::NotFound`] when no child carries the name, or when the named
/// child has no result object.
pub fn find_task_result<'a>(job: &'a Job, name: &str) -> Result<&'a TaskResult> {
    debug_assert!(
        job.is_terminal(),
        "result resolution on a non-terminal job"
    );
    job.task(name)
        .and_then(|task| task.result.as_ref())
        .ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })
}

/// Extract the top-level failure description of a failed job
///
/// Returns `None` when the job carries no failure detail (e.g. it
/// completed).
pub fn job_failure_detail(job: &Job) -> Option<FailureDetail> {
    job.result.as_ref().and_then(TaskResult::failure_detail)
}

/// Extract the failure description of a failed task
pub fn task_failure_detail(task: &Task) -> Option<FailureDetail> {
    task.result.as_ref().and_then(TaskResult::failure_detail)
}

/// Branch on a terminal job's outcome
///
/// Passes a completed job through; turns a failed one into
/// [`Error::RemoteFailure`] carrying the extracted detail.
pub fn ensure_completed(job: &Job) -> Result<&Job> {
    debug_assert!(
        job.is_terminal(),
        "result resolution on a non-terminal job"
    );
    if job.status == Status::Failed {
        return Err(Error::RemoteFailure(
            job_failure_detail(job).unwrap_or_default(),
        ));
    }
    Ok(job)
}
