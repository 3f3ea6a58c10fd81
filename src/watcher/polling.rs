//! Polling completion strategy
//!
//! Repeated sleep-then-fetch cycles against the status endpoints, bounded
//! by a maximum cycle count. Purely sequential: each cycle's fetch
//! completes before the next sleep begins, and no concurrent polling of
//! the same handle is performed.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::client::ConvertClient;
use crate::error::{Error, Result};
use crate::types::{Job, JobId, Status, Task, TaskId};
use crate::watcher::CompletionWatcher;

/// Watcher that polls the status endpoints until a terminal state
///
/// ```no_run
/// use fileconvert::{CompletionWatcher, Config, ConvertClient, JobId, PollingWatcher};
///
/// # async fn example() -> fileconvert::Result<()> {
/// let client = ConvertClient::new(Config::new("my_api_key"))?;
/// let watcher = PollingWatcher::new(client);
/// let job = watcher.wait_for_job(&JobId::new("job-1")).await?;
/// println!("job finished with status {:?}", job.status);
/// # Ok(())
/// # }
/// ```
pub struct PollingWatcher {
    client: ConvertClient,
    interval: Duration,
    max_cycles: u32,
    cancel: CancellationToken,
}

impl PollingWatcher {
    /// Create a watcher using the client's configured polling schedule
    pub fn new(client: ConvertClient) -> Self {
        let poll = &client.config().poll;
        let (interval, max_cycles) = (poll.interval, poll.max_cycles);
        Self::with_schedule(client, interval, max_cycles)
    }

    /// Create a watcher with an explicit interval and cycle bound
    pub fn with_schedule(client: ConvertClient, interval: Duration, max_cycles: u32) -> Self {
        Self {
            client,
            interval,
            max_cycles,
            cancel: CancellationToken::new(),
        }
    }

    /// Token for abandoning the watch
    ///
    /// Cancelling stops the loop after the current cycle and surfaces
    /// [`Error::Cancelled`]; the remote task or job keeps running.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Sleep, fetch, and check for a terminal status, up to `max_cycles`
    /// times. Performs exactly as many fetches as cycles entered.
    async fn poll_until_terminal<T, F, Fut>(
        &self,
        kind: &'static str,
        id: &str,
        status_of: fn(&T) -> Status,
        mut fetch: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0u32;
        while attempts < self.max_cycles {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(kind, id, "watch cancelled");
                    return Err(Error::Cancelled);
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
            attempts += 1;
            let current = fetch().await?;
            let status = status_of(&current);
            tracing::debug!(kind, id, attempt = attempts, status = ?status, "poll cycle");
            if status.is_terminal() {
                tracing::info!(kind, id, attempts, status = ?status, "watch finished");
                return Ok(current);
            }
        }
        tracing::warn!(kind, id, attempts, "polling exhausted without terminal status");
        Err(Error::PollTimeout { attempts })
    }
}

#[async_trait]
impl CompletionWatcher for PollingWatcher {
    async fn wait_for_task(&self, id: &TaskId) -> Result<Task> {
        self.poll_until_terminal("task", id.as_str(), |t: &Task| t.status, || {
            self.client.get_task(id)
        })
        .await
    }

    async fn wait_for_job(&self, id: &JobId) -> Result<Job> {
        self.poll_until_terminal("job", id.as_str(), |j: &Job| j.status, || {
            self.client.get_job(id)
        })
        .await
    }
}
