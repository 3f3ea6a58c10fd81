//! Error types for fileconvert
//!
//! Every failure mode the client can observe is a distinct, inspectable
//! variant: transport failures, non-2xx API responses, remote task/job
//! failures, polling exhaustion, and result-resolution misses. The client
//! core never retries or recovers on its own — retry policy belongs to the
//! caller, layered on top of these errors.

use thiserror::Error;

use crate::types::FailureDetail;

/// Result type alias for fileconvert operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fileconvert
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_base")
        key: Option<String>,
    },

    /// Transport failure (network/DNS/TLS) while talking to the API
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("API error: HTTP {status}: {message}")]
    Api {
        /// HTTP status code returned by the remote service
        status: u16,
        /// Machine-readable error code from the structured error body, when present
        code: Option<String>,
        /// Error message from the response body, or the raw body when unstructured
        message: String,
    },

    /// A task or job reached terminal `failed` status on the remote service
    #[error("remote processing failed: {0}")]
    RemoteFailure(FailureDetail),

    /// Bounded polling exhausted its cycle budget without a terminal status
    #[error("polling timed out after {attempts} status fetches")]
    PollTimeout {
        /// Number of status fetches performed before giving up
        attempts: u32,
    },

    /// Result resolution requested a task name absent from the job
    #[error("no task named {name:?} with a result in this job")]
    NotFound {
        /// The task name that could not be resolved
        name: String,
    },

    /// A task or job specification failed client-side shape validation
    #[error("invalid specification: {message}")]
    InvalidSpec {
        /// What part of the specification is malformed
        message: String,
    },

    /// Notification channel connection or protocol failure
    #[error("notification channel error: {0}")]
    Channel(String),

    /// The notification channel has been closed
    #[error("notification channel closed")]
    ChannelClosed,

    /// The watch was cancelled by the caller
    #[error("watch cancelled")]
    Cancelled,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (local file access for uploads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
