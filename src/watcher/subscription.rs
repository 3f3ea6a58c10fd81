//! Push-subscription completion strategy
//!
//! Waits on the notification channel instead of polling. The watch
//! subscribes to the handle's topic, performs one authoritative fetch to
//! cover events that fired before the subscription registered, and then
//! sleeps until the handle's own terminal event arrives.
//!
//! Events may arrive out of causal order, so a job's terminal status is
//! derived solely from the job's own terminal event followed by an
//! authoritative fetch — never from the ordering of child-task events.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::client::ConvertClient;
use crate::error::Result;
use crate::notify::{NotificationChannel, NotificationEvent, Topic};
use crate::types::{Job, JobId, Task, TaskId};
use crate::watcher::CompletionWatcher;

/// Watcher that waits for push events on the notification channel
///
/// Multiple watchers may share one channel; each watch subscribes and
/// unsubscribes its own topics. The channel itself never times out —
/// bound the wait externally (e.g. `tokio::time::timeout`) if needed.
///
/// ```no_run
/// use fileconvert::{
///     CompletionWatcher, Config, ConvertClient, JobId, NotificationChannel, SubscriptionWatcher,
/// };
///
/// # async fn example() -> fileconvert::Result<()> {
/// let config = Config::new("my_api_key");
/// let client = ConvertClient::new(config.clone())?;
/// let channel = NotificationChannel::connect(&config).await?;
/// let watcher = SubscriptionWatcher::new(client, channel.clone());
/// let job = watcher.wait_for_job(&JobId::new("job-1")).await?;
/// println!("job finished with status {:?}", job.status);
/// channel.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SubscriptionWatcher {
    client: ConvertClient,
    channel: NotificationChannel,
    task_observer: Option<mpsc::UnboundedSender<NotificationEvent>>,
}

impl SubscriptionWatcher {
    /// Create a watcher over an already-connected notification channel
    pub fn new(client: ConvertClient, channel: NotificationChannel) -> Self {
        Self {
            client,
            channel,
            task_observer: None,
        }
    }

    /// Forward child-task lifecycle events to an observer while waiting
    ///
    /// During [`wait_for_job`](CompletionWatcher::wait_for_job), the
    /// watcher additionally subscribes to each child task's topic and
    /// forwards its `task_started` / `task_completed` / `task_failed`
    /// events. The observer sees progress only; completion is still
    /// decided by the job's own terminal event.
    pub fn observe_tasks(mut self, observer: mpsc::UnboundedSender<NotificationEvent>) -> Self {
        self.task_observer = Some(observer);
        self
    }

    /// Subscribe each child task's topic and forward its events until the
    /// task turns terminal or the watch ends (guard drop).
    async fn spawn_task_observers(&self, job: &Job) -> Option<DropGuard> {
        let observer = self.task_observer.as_ref()?.clone();
        let cancel = CancellationToken::new();
        for task in &job.tasks {
            let topic = Topic::Task(task.id.clone());
            match self.channel.subscribe(topic).await {
                Ok(mut subscription) => {
                    let observer = observer.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        loop {
                            let event = tokio::select! {
                                _ = cancel.cancelled() => break,
                                received = subscription.recv() => match received {
                                    Ok(event) => event,
                                    Err(_) => break,
                                }
                            };
                            let terminal = event.is_terminal();
                            let _ = observer.send(event);
                            if terminal {
                                let _ = subscription.unsubscribe().await;
                                return;
                            }
                        }
                        // Dropping the subscription releases its topic.
                    });
                }
                Err(e) => {
                    tracing::warn!(id = %task.id, error = %e, "could not subscribe to child task")
                }
            }
        }
        Some(cancel.drop_guard())
    }
}

#[async_trait]
impl CompletionWatcher for SubscriptionWatcher {
    async fn wait_for_task(&self, id: &TaskId) -> Result<Task> {
        let mut subscription = self.channel.subscribe(Topic::Task(id.clone())).await?;

        // The task may have turned terminal before the subscription
        // registered; the fetch is authoritative.
        let task = self.client.get_task(id).await?;
        if task.is_terminal() {
            subscription.unsubscribe().await?;
            return Ok(task);
        }

        loop {
            let event = subscription.recv().await?;
            tracing::debug!(id = %id, event = ?event, "task event");
            if let Some(observer) = &self.task_observer {
                let _ = observer.send(event.clone());
            }
            if event.is_terminal() {
                subscription.unsubscribe().await?;
                // Terminal events carry only the subject id; fetch the
                // final object with its result.
                return self.client.get_task(id).await;
            }
        }
    }

    async fn wait_for_job(&self, id: &JobId) -> Result<Job> {
        let mut subscription = self.channel.subscribe(Topic::Job(id.clone())).await?;

        let job = self.client.get_job(id).await?;
        if job.is_terminal() {
            subscription.unsubscribe().await?;
            return Ok(job);
        }

        let _observers = self.spawn_task_observers(&job).await;

        loop {
            // Only this job's own events arrive here; child-task ordering
            // never decides completion.
            let event = subscription.recv().await?;
            tracing::debug!(id = %id, event = ?event, "job event");
            if event.is_terminal() {
                subscription.unsubscribe().await?;
                return self.client.get_job(id).await;
            }
        }
    }
}
