//! Exponential-backoff reconnection settings for the notification channel
//!
//! When the websocket drops unexpectedly, the channel can retry with
//! increasing delays and re-subscribe its active topics. Reconnection is
//! off by default (`max_attempts: 0`); a dropped connection then closes
//! the channel.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum consecutive reconnection attempts; 0 disables reconnection
    #[serde(default)]
    pub max_attempts: u32,

    /// Delay before the first reconnection attempt
    #[serde(default = "default_initial_delay")]
    pub initial_delay: Duration,

    /// Upper bound on the delay between attempts
    #[serde(default = "default_max_delay")]
    pub max_delay: Duration,

    /// Factor by which the delay grows after each failure
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_multiplier() -> f64 {
    2.0
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`ReconnectConfig::max_delay`].
pub(crate) fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}
