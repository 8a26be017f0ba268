#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core abstractions for the turbopipe output stages.
//!
//! This crate provides the primitives shared by every output in the
//! turbopipe workspace:
//!
//! - **Backoff policies** via the [`BackoffPolicy`](retry::BackoffPolicy) factory
//!   and its per-transaction [`Backoff`](retry::Backoff) instances
//!   - Exponential backoff with jitter
//!   - Optional attempt and elapsed-time budgets
//! - **Retry configuration** via [`RetriesConfig`](retry::RetriesConfig), the
//!   serde-facing form of a backoff policy
//! - **Duration strings** such as `"100ms"` or `"1m30s"` via
//!   [`duration::parse_duration`]
//! - **Shutdown coordination** via [`Lifecycle`](lifecycle::Lifecycle)
//!
//! # Examples
//!
//! ```rust
//! use turbopipe_core::prelude::*;
//! use std::time::Duration;
//!
//! let policy = ExponentialBackoff::builder()
//!     .initial_interval(Duration::from_millis(100))
//!     .max_interval(Duration::from_secs(1))
//!     .max_retries(3)
//!     .jitter(0.0)
//!     .build();
//!
//! let mut backoff = policy.new_backoff();
//! assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
//! assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
//! assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(400)));
//! assert_eq!(backoff.next_backoff(), None);
//! ```

pub mod duration;
pub mod error;
pub mod lifecycle;
pub mod retry;

pub use error::ConfigError;

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use turbopipe_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::ConfigError;
    pub use crate::lifecycle::{Lifecycle, LifecycleState, WaitTimeout};
    pub use crate::retry::{
        Backoff, BackoffConfig, BackoffPolicy, ExponentialBackoff, ExponentialBackoffBuilder,
        RetriesConfig,
    };
}
