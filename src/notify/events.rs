//! Notification channel wire types and parser
//!
//! The notification service sends JSON text frames with the shape
//! `{"event": "<name>", "data": {...}}`. This module deserializes them
//! into a strongly-typed [`NotificationEvent`] enum and provides the
//! outbound `subscribe`/`unsubscribe` control frames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{JobId, TaskId};

/// A subscription topic: one task or one job
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Events about a single task
    Task(TaskId),
    /// Events about a single job
    Job(JobId),
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Task(id) => write!(f, "task.{}", id),
            Topic::Job(id) => write!(f, "job.{}", id),
        }
    }
}

/// Payload carried by every notification event
///
/// Events carry at least the subject's identifier; the caller-chosen name
/// is present for tasks created inside a job. Anything else the service
/// includes is preserved in `extra`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventPayload {
    /// Identifier of the task or job the event is about
    pub id: String,

    /// Caller-chosen task name, when the subject was created inside a job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Payload fields not otherwise modeled
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All known server-to-client notification events
///
/// Deserialized via the internally-tagged `"event"` field with associated
/// `"data"` content. Events may arrive out of causal order: a
/// `task_completed` for a child can arrive after the `job_completed` of
/// its parent, and events for different children can arrive in any order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A task began processing
    TaskStarted(EventPayload),
    /// A task reached terminal `completed` status
    TaskCompleted(EventPayload),
    /// A task reached terminal `failed` status
    TaskFailed(EventPayload),
    /// A job reached terminal `completed` status (all children completed)
    JobCompleted(EventPayload),
    /// A job reached terminal `failed` status (some child failed)
    JobFailed(EventPayload),
}

impl NotificationEvent {
    /// The event's payload
    pub fn payload(&self) -> &EventPayload {
        match self {
            NotificationEvent::TaskStarted(p)
            | NotificationEvent::TaskCompleted(p)
            | NotificationEvent::TaskFailed(p)
            | NotificationEvent::JobCompleted(p)
            | NotificationEvent::JobFailed(p) => p,
        }
    }

    /// The topic this event belongs to, derived from its kind and subject id
    pub fn topic(&self) -> Topic {
        match self {
            NotificationEvent::TaskStarted(p)
            | NotificationEvent::TaskCompleted(p)
            | NotificationEvent::TaskFailed(p) => Topic::Task(TaskId::new(p.id.clone())),
            NotificationEvent::JobCompleted(p) | NotificationEvent::JobFailed(p) => {
                Topic::Job(JobId::new(p.id.clone()))
            }
        }
    }

    /// Whether the event announces a terminal status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, NotificationEvent::TaskStarted(_))
    }
}

/// Client-to-server control frame (`subscribe` / `unsubscribe`)
#[derive(Debug, Serialize)]
pub(crate) struct ControlFrame<'a> {
    pub(crate) event: &'a str,
    pub(crate) topic: String,
}

/// Parse a notification text frame into a typed event
///
/// Returns `Err` for malformed JSON or unknown `event` values. Callers
/// should log unknown frames and continue.
pub(crate) fn parse_event(text: &str) -> Result<NotificationEvent, serde_json::Error> {
    serde_json::from_str(text)
}
