//! Configuration errors raised while turning config values into policies.

use crate::duration::DurationParseError;
use std::time::Duration;
use thiserror::Error;

/// Errors produced when a retry or backoff configuration cannot be applied.
///
/// These are always fatal at construction time: an output built from a
/// malformed configuration is never started.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A duration field could not be parsed.
    #[error("invalid duration for `{field}`: {source}")]
    InvalidDuration {
        /// Name of the offending field
        field: &'static str,
        /// Underlying parse failure
        #[source]
        source: DurationParseError,
    },

    /// The maximum interval is shorter than the initial one.
    #[error("max_interval ({max:?}) must not be shorter than initial_interval ({initial:?})")]
    IntervalBounds {
        /// Configured initial interval
        initial: Duration,
        /// Configured maximum interval
        max: Duration,
    },
}
