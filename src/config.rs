//! Configuration types for fileconvert

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::notify::ReconnectConfig;

/// Polling behavior configuration
///
/// Controls the sleep-then-fetch cycle used by the polling completion
/// strategy. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status fetches (default: 2s)
    #[serde(default = "default_poll_interval")]
    pub interval: Duration,

    /// Maximum number of status fetches before giving up (default: 10)
    #[serde(default = "default_poll_max_cycles")]
    pub max_cycles: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_cycles: default_poll_max_cycles(),
        }
    }
}

/// Notification channel configuration
///
/// Endpoint and resilience settings for the real-time event channel.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Websocket endpoint of the notification service
    #[serde(default = "default_notification_url")]
    pub url: String,

    /// Reconnect behavior after an unexpected disconnect
    ///
    /// Disabled by default (`max_attempts: 0`): a dropped connection closes
    /// the channel and pending watches surface
    /// [`Error::ChannelClosed`](crate::Error::ChannelClosed).
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            url: default_notification_url(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Main configuration for the conversion client
///
/// Only `api_key` is required; every other field carries a sensible
/// default. Fields are organized into logical sub-configs:
/// - [`poll`](PollConfig) — polling cadence and bounds
/// - [`notification`](NotificationConfig) — event channel endpoint and reconnect
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Bearer credential for the conversion API and the notification channel
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the conversion REST API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout for REST calls (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Polling behavior
    #[serde(default)]
    pub poll: PollConfig,

    /// Notification channel behavior
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            poll: PollConfig::default(),
            notification: NotificationConfig::default(),
        }
    }
}

impl Config {
    /// Create a configuration with the given API key and all defaults
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// Checks that the credential is present, that `api_base` is an
    /// absolute http(s) URL, and that the notification endpoint is an
    /// absolute ws(s) URL.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config {
                message: "api_key must not be empty".to_string(),
                key: Some("api_key".to_string()),
            });
        }

        let api = Url::parse(&self.api_base).map_err(|e| Error::Config {
            message: format!("api_base is not a valid URL: {}", e),
            key: Some("api_base".to_string()),
        })?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("api_base must use http or https, got '{}'", api.scheme()),
                key: Some("api_base".to_string()),
            });
        }

        let notify = Url::parse(&self.notification.url).map_err(|e| Error::Config {
            message: format!("notification.url is not a valid URL: {}", e),
            key: Some("notification.url".to_string()),
        })?;
        if !matches!(notify.scheme(), "ws" | "wss") {
            return Err(Error::Config {
                message: format!(
                    "notification.url must use ws or wss, got '{}'",
                    notify.scheme()
                ),
                key: Some("notification.url".to_string()),
            });
        }

        if self.poll.max_cycles == 0 {
            return Err(Error::Config {
                message: "poll.max_cycles must be at least 1".to_string(),
                key: Some("poll.max_cycles".to_string()),
            });
        }

        Ok(())
    }
}

fn default_api_base() -> String {
    "https://api.fileconvert.com/v1".to_string()
}

fn default_notification_url() -> String {
    "wss://notification.fileconvert.com/ws".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("fileconvert/{}", env!("CARGO_PKG_VERSION"))
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_poll_max_cycles() -> u32 {
    10
}
