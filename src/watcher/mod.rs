//! Completion watching
//!
//! A [`CompletionWatcher`] drives a task or job handle from its current
//! status to a terminal one. Two interchangeable strategies implement the
//! trait:
//! - [`PollingWatcher`] — bounded sleep-then-fetch cycles
//! - [`SubscriptionWatcher`] — push events over the notification channel
//!
//! Both return the same terminal object shape, so callers can switch
//! strategies without changing downstream result handling. A watcher
//! returns the terminal object even when its status is `failed`; branching
//! on failure belongs to the resolver.

mod polling;
mod subscription;

pub use polling::PollingWatcher;
pub use subscription::SubscriptionWatcher;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Job, JobId, Task, TaskId};

/// Strategy for observing a task or job until it reaches a terminal state
///
/// Abandoning a watch (cancellation, closing the channel) only stops the
/// client from waiting; it never cancels the underlying remote work.
#[async_trait]
pub trait CompletionWatcher: Send + Sync {
    /// Wait until the task reaches `completed` or `failed` and return the
    /// final task object
    async fn wait_for_task(&self, id: &TaskId) -> Result<Task>;

    /// Wait until the job reaches `completed` or `failed` and return the
    /// final job object with its child tasks
    async fn wait_for_job(&self, id: &JobId) -> Result<Job>;
}
