//! Exponential backoff with jitter and optional budgets.

use super::strategy::{Backoff, BackoffPolicy};
use std::time::{Duration, Instant};

/// Exponential backoff policy with configurable jitter and retry budgets.
///
/// Waits between retries grow exponentially:
/// `initial_interval * multiplier^attempt`, capped at `max_interval`.
///
/// # Mathematical Formula
///
/// For retry `n` (0-indexed after the first failure):
/// ```text
/// base = initial_interval * (multiplier ^ n)
/// jittered = base + base * jitter * random(-1.0, +1.0)
/// delay = min(jittered, max_interval)
/// ```
///
/// # Budgets
///
/// - `max_retries`: once this many intervals have been handed out the
///   instance stops. `None` means unbounded.
/// - `max_elapsed_time`: once this much time has passed since the instance
///   was created the instance stops. `None` means unbounded.
///
/// The two budgets are independent: either one being reached stops retries.
///
/// # Examples
///
/// ```rust
/// use turbopipe_core::retry::{BackoffPolicy, ExponentialBackoff};
/// use std::time::Duration;
///
/// let policy = ExponentialBackoff::builder()
///     .initial_interval(Duration::from_millis(100))
///     .max_interval(Duration::from_secs(1))
///     .max_retries(5)
///     .build();
///
/// let mut backoff = policy.new_backoff();
/// let first = backoff.next_backoff().unwrap();
/// assert!(first >= Duration::from_millis(90) && first <= Duration::from_millis(110));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    max_interval: Duration,
    multiplier: f64,
    jitter: f64,
    max_retries: Option<u32>,
    max_elapsed_time: Option<Duration>,
}

impl ExponentialBackoff {
    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// The interval before the first retry.
    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    /// The cap applied to every interval.
    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// The retry budget, `None` when unbounded.
    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// The elapsed-time budget, `None` when unbounded.
    pub fn max_elapsed_time(&self) -> Option<Duration> {
        self.max_elapsed_time
    }

    /// Calculate the wait before retry `attempt` (0-indexed).
    ///
    /// This ignores the budgets; it is the raw interval curve.
    pub fn interval_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);

        let jittered = if self.jitter > 0.0 {
            let jitter_amount = base * self.jitter * (rand::random::<f64>() - 0.5) * 2.0;
            base + jitter_amount
        } else {
            base
        };

        let max = self.max_interval.as_secs_f64();
        if !jittered.is_finite() || jittered >= max {
            return self.max_interval;
        }
        Duration::from_secs_f64(jittered.max(0.0))
    }
}

impl Default for ExponentialBackoff {
    /// Defaults:
    /// - `initial_interval`: 100ms
    /// - `max_interval`: 1s
    /// - `multiplier`: 2.0
    /// - `jitter`: 0.1
    /// - no retry or elapsed-time budget
    fn default() -> Self {
        ExponentialBackoffBuilder::default().build()
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn new_backoff(&self) -> Box<dyn Backoff> {
        Box::new(ExponentialBackoffState::new(self.clone()))
    }
}

/// A running [`ExponentialBackoff`] instance.
///
/// The elapsed-time budget is measured from the moment the instance was
/// created, which for retrying outputs is the first failure of the
/// transaction.
#[derive(Debug)]
pub struct ExponentialBackoffState {
    policy: ExponentialBackoff,
    attempt: u32,
    started: Instant,
    stopped: bool,
}

impl ExponentialBackoffState {
    /// Start a new instance of `policy`.
    pub fn new(policy: ExponentialBackoff) -> Self {
        Self {
            policy,
            attempt: 0,
            started: Instant::now(),
            stopped: false,
        }
    }

    /// Number of intervals handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

impl Backoff for ExponentialBackoffState {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.stopped {
            return None;
        }
        let retries_spent = self
            .policy
            .max_retries
            .is_some_and(|max| self.attempt >= max);
        let time_spent = self
            .policy
            .max_elapsed_time
            .is_some_and(|max| self.started.elapsed() >= max);
        if retries_spent || time_spent {
            self.stopped = true;
            return None;
        }

        let delay = self.policy.interval_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }
}

/// Builder for configuring [`ExponentialBackoff`].
///
/// # Examples
///
/// ```rust
/// use turbopipe_core::retry::ExponentialBackoff;
/// use std::time::Duration;
///
/// let policy = ExponentialBackoff::builder()
///     .initial_interval(Duration::from_millis(100))
///     .max_interval(Duration::from_secs(30))
///     .multiplier(1.5)
///     .jitter(0.2)
///     .max_retries(10)
///     .max_elapsed_time(Duration::from_secs(120))
///     .build();
///
/// assert_eq!(policy.max_retries(), Some(10));
/// ```
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder {
    initial_interval: Option<Duration>,
    max_interval: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
    max_retries: Option<u32>,
    max_elapsed_time: Option<Duration>,
}

impl ExponentialBackoffBuilder {
    /// Set the interval before the first retry.
    ///
    /// Default: 100ms
    pub fn initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = Some(interval);
        self
    }

    /// Set the maximum interval between retries.
    ///
    /// Default: 1s
    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = Some(interval);
        self
    }

    /// Set the exponential multiplier. Values below 1.0 are raised to 1.0.
    ///
    /// Default: 2.0 (doubles each time)
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier.max(1.0));
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// A jitter of 0.1 means each interval can vary by ±10%.
    ///
    /// Default: 0.1
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter.clamp(0.0, 1.0));
        self
    }

    /// Limit the number of retries handed out by each instance.
    ///
    /// `max_retries(0)` stops on the very first failure.
    ///
    /// Default: unbounded
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Limit the total time an instance keeps retrying.
    ///
    /// Default: unbounded
    pub fn max_elapsed_time(mut self, max_elapsed_time: Duration) -> Self {
        self.max_elapsed_time = Some(max_elapsed_time);
        self
    }

    /// Build the [`ExponentialBackoff`] policy.
    ///
    /// Uses default values for any unset parameters.
    pub fn build(self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval.unwrap_or(Duration::from_millis(100)),
            max_interval: self.max_interval.unwrap_or(Duration::from_secs(1)),
            multiplier: self.multiplier.unwrap_or(2.0),
            jitter: self.jitter.unwrap_or(0.1),
            max_retries: self.max_retries,
            max_elapsed_time: self.max_elapsed_time,
        }
    }
}
