//! Start/stop coordination for long-running stages.
//!
//! A [`Lifecycle`] tracks two one-way transitions:
//!
//! - **shutdown requested**: someone called [`Lifecycle::close_async`]; loops
//!   and in-flight work observe [`Lifecycle::shutdown_token`] and stop
//! - **closed**: the owner finished tearing down and called
//!   [`Lifecycle::mark_closed`]; waiters in [`Lifecycle::wait_for_close`]
//!   are released
//!
//! Both transitions are idempotent and safe to trigger from any thread.
//!
//! # Example
//!
//! ```rust
//! use turbopipe_core::lifecycle::{Lifecycle, LifecycleState};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let lifecycle = Arc::new(Lifecycle::new());
//! let shutdown = lifecycle.shutdown_token();
//!
//! let worker = Arc::clone(&lifecycle);
//! tokio::spawn(async move {
//!     shutdown.cancelled().await;
//!     worker.mark_closed();
//! });
//!
//! assert!(lifecycle.close_async());
//! lifecycle.wait_for_close(Duration::from_secs(1)).await.unwrap();
//! assert_eq!(lifecycle.state(), LifecycleState::Closed);
//! # });
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The close did not finish within the allotted time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {0:?} waiting for close")]
pub struct WaitTimeout(pub Duration);

/// Observable phase of a [`Lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting and processing work
    Running,
    /// Shutdown requested, teardown in progress
    Closing,
    /// Fully stopped
    Closed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Closing => write!(f, "closing"),
            LifecycleState::Closed => write!(f, "closed"),
        }
    }
}

/// Shutdown and close signalling shared by a stage and its tasks.
#[derive(Debug)]
pub struct Lifecycle {
    running: AtomicBool,
    shutdown: CancellationToken,
    closed: CancellationToken,
}

impl Lifecycle {
    /// Create a lifecycle in the [`LifecycleState::Running`] state.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            shutdown: CancellationToken::new(),
            closed: CancellationToken::new(),
        }
    }

    /// Whether shutdown has not been requested yet.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request shutdown without waiting for it.
    ///
    /// Returns `true` for the call that performed the transition and `false`
    /// for every later call.
    pub fn close_async(&self) -> bool {
        let first = self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if first {
            tracing::debug!("Shutdown requested");
            self.shutdown.cancel();
        }
        first
    }

    /// A token that is cancelled once shutdown is requested.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Record that teardown has finished and release every waiter.
    ///
    /// Also requests shutdown if nobody had yet.
    pub fn mark_closed(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.cancel();
        if !self.closed.is_cancelled() {
            tracing::debug!("Closed");
        }
        self.closed.cancel();
    }

    /// Whether [`mark_closed`](Self::mark_closed) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Current phase.
    pub fn state(&self) -> LifecycleState {
        if self.is_closed() {
            LifecycleState::Closed
        } else if self.is_running() {
            LifecycleState::Running
        } else {
            LifecycleState::Closing
        }
    }

    /// Block until closed or until `timeout` elapses.
    ///
    /// Any number of callers may wait, concurrently or one after another.
    /// Once closed every call returns `Ok` immediately.
    ///
    /// # Errors
    ///
    /// Returns [`WaitTimeout`] if the close has not finished in time.
    pub async fn wait_for_close(&self, timeout: Duration) -> Result<(), WaitTimeout> {
        tokio::time::timeout(timeout, self.closed.cancelled())
            .await
            .map_err(|_| WaitTimeout(timeout))
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_state() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.is_running());
        assert!(!lifecycle.is_closed());
        assert_eq!(lifecycle.state(), LifecycleState::Running);
        assert!(!lifecycle.shutdown_token().is_cancelled());
    }

    #[test]
    fn test_close_async_is_idempotent() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.close_async());
        assert!(!lifecycle.close_async());
        assert!(!lifecycle.close_async());
        assert!(!lifecycle.is_running());
        assert!(lifecycle.shutdown_token().is_cancelled());
        assert_eq!(lifecycle.state(), LifecycleState::Closing);
    }

    #[test]
    fn test_mark_closed_implies_shutdown() {
        let lifecycle = Lifecycle::new();
        lifecycle.mark_closed();
        lifecycle.mark_closed();
        assert!(!lifecycle.is_running());
        assert!(lifecycle.shutdown_token().is_cancelled());
        assert_eq!(lifecycle.state(), LifecycleState::Closed);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LifecycleState::Running.to_string(), "running");
        assert_eq!(LifecycleState::Closing.to_string(), "closing");
        assert_eq!(LifecycleState::Closed.to_string(), "closed");
    }

    #[tokio::test]
    async fn test_wait_for_close_times_out() {
        let lifecycle = Lifecycle::new();
        lifecycle.close_async();
        let err = lifecycle
            .wait_for_close(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err, WaitTimeout(Duration::from_millis(20)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_wait_for_close_repeatable() {
        let lifecycle = Lifecycle::new();
        lifecycle.mark_closed();
        assert!(lifecycle.wait_for_close(Duration::ZERO).await.is_ok());
        assert!(lifecycle.wait_for_close(Duration::from_millis(1)).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_close_and_wait() {
        let lifecycle = Arc::new(Lifecycle::new());

        let closer = Arc::clone(&lifecycle);
        tokio::spawn(async move {
            closer.shutdown_token().cancelled().await;
            tokio::time::sleep(Duration::from_millis(10)).await;
            closer.mark_closed();
        });

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lifecycle = Arc::clone(&lifecycle);
            handles.push(tokio::spawn(async move {
                let won = lifecycle.close_async();
                lifecycle
                    .wait_for_close(Duration::from_secs(2))
                    .await
                    .map(|_| won)
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(lifecycle.is_closed());
    }
}
