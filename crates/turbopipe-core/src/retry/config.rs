//! Serde-facing retry configuration.

use super::exponential::ExponentialBackoff;
use crate::duration::parse_duration;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff timing, written as duration strings.
///
/// A `max_elapsed_time` of zero means retries are not bounded by time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Wait before the first retry (e.g. `"100ms"`)
    pub initial_interval: String,
    /// Cap on any single wait (e.g. `"1s"`)
    pub max_interval: String,
    /// Total time budget across all retries, `"0s"` for unbounded
    pub max_elapsed_time: String,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: "100ms".to_string(),
            max_interval: "1s".to_string(),
            max_elapsed_time: "0s".to_string(),
        }
    }
}

/// Retry budget plus backoff timing.
///
/// A `max_retries` of zero means retries are not bounded by count.
///
/// # Examples
///
/// ```rust
/// use turbopipe_core::retry::RetriesConfig;
/// use std::time::Duration;
///
/// let config: RetriesConfig = serde_json::from_str(
///     r#"{"max_retries": 3, "backoff": {"initial_interval": "50ms"}}"#,
/// ).unwrap();
///
/// let policy = config.policy().unwrap();
/// assert_eq!(policy.max_retries(), Some(3));
/// assert_eq!(policy.initial_interval(), Duration::from_millis(50));
/// assert_eq!(policy.max_interval(), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetriesConfig {
    /// Maximum retries per transaction, 0 for unbounded
    pub max_retries: u32,
    /// Backoff timing
    pub backoff: BackoffConfig,
}

impl RetriesConfig {
    /// Parse the durations and build the backoff policy they describe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] when a duration string does
    /// not parse, and [`ConfigError::IntervalBounds`] when `max_interval` is
    /// shorter than `initial_interval`.
    pub fn policy(&self) -> Result<ExponentialBackoff, ConfigError> {
        let initial = field("initial_interval", &self.backoff.initial_interval)?;
        let max = field("max_interval", &self.backoff.max_interval)?;
        let elapsed = field("max_elapsed_time", &self.backoff.max_elapsed_time)?;

        if max < initial {
            return Err(ConfigError::IntervalBounds { initial, max });
        }

        let mut builder = ExponentialBackoff::builder()
            .initial_interval(initial)
            .max_interval(max);
        if self.max_retries > 0 {
            builder = builder.max_retries(self.max_retries);
        }
        if !elapsed.is_zero() {
            builder = builder.max_elapsed_time(elapsed);
        }
        Ok(builder.build())
    }
}

fn field(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).map_err(|source| ConfigError::InvalidDuration { field: name, source })
}
