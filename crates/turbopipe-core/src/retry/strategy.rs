//! The backoff contract consumed by retrying outputs.

use std::time::Duration;

/// A stateful backoff instance owned by a single transaction.
///
/// Each call advances the instance. Implementations return `Some(delay)` to
/// request another attempt after waiting `delay`, or `None` once the retry
/// budget (attempt count, elapsed time, or any other policy-specific limit)
/// is exhausted. After returning `None` an instance keeps returning `None`.
///
/// Instances are never shared across transactions, so they take `&mut self`
/// and need no internal synchronisation.
pub trait Backoff: Send {
    /// Advance the instance and return the next wait, or `None` to stop.
    fn next_backoff(&mut self) -> Option<Duration>;
}

/// A factory for per-transaction [`Backoff`] instances.
///
/// A retrying output holds one policy and asks it for a fresh instance the
/// first time a given transaction fails.
///
/// Any `Fn() -> Box<dyn Backoff>` closure is also a policy:
///
/// ```rust
/// use turbopipe_core::retry::{Backoff, BackoffPolicy};
/// use std::time::Duration;
///
/// struct Fixed(u32);
///
/// impl Backoff for Fixed {
///     fn next_backoff(&mut self) -> Option<Duration> {
///         if self.0 == 0 {
///             return None;
///         }
///         self.0 -= 1;
///         Some(Duration::from_millis(10))
///     }
/// }
///
/// let policy = || Box::new(Fixed(2)) as Box<dyn Backoff>;
/// let mut backoff = policy.new_backoff();
/// assert!(backoff.next_backoff().is_some());
/// assert!(backoff.next_backoff().is_some());
/// assert!(backoff.next_backoff().is_none());
/// ```
pub trait BackoffPolicy: Send + Sync {
    /// Create a fresh instance with its budget reset.
    fn new_backoff(&self) -> Box<dyn Backoff>;
}

impl<F> BackoffPolicy for F
where
    F: Fn() -> Box<dyn Backoff> + Send + Sync,
{
    fn new_backoff(&self) -> Box<dyn Backoff> {
        self()
    }
}
