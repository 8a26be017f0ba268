//! Testing utilities
//!
//! Provides [`MockOutput`], a scriptable delivery target for exercising
//! outputs that wrap other outputs without a real destination.

use crate::error::{OutputError, Result};
use crate::traits::Output;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use turbopipe_core::lifecycle::Lifecycle;
use turbopipe_protocol::{DeliveryError, Message, Response, Transaction};

/// Configuration for mock delivery behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Fail this many attempts (counted across all transactions) before succeeding
    pub fail_first: usize,

    /// Fail every attempt
    pub always_fail: bool,

    /// Answer failures with `Noack` instead of an error
    pub fail_with_noack: bool,

    /// Delay before answering each attempt
    pub response_delay: Option<Duration>,

    /// Delay between being asked to stop and reporting closed
    pub close_delay: Option<Duration>,
}

/// A scriptable [`Output`] that records every attempt it receives.
///
/// Clones share state, so a test can keep one handle and give another to
/// the output under test.
#[derive(Clone)]
pub struct MockOutput {
    inner: Arc<MockState>,
}

struct MockState {
    config: MockConfig,
    attempts: Mutex<Vec<Message>>,
    started: AtomicBool,
    connected: AtomicBool,
    lifecycle: Lifecycle,
    responders: TaskTracker,
    attempt_count: AtomicUsize,
}

impl MockOutput {
    /// A mock that acknowledges everything immediately.
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// A mock with custom behavior.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            inner: Arc::new(MockState {
                config,
                attempts: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
                connected: AtomicBool::new(true),
                lifecycle: Lifecycle::new(),
                responders: TaskTracker::new(),
                attempt_count: AtomicUsize::new(0),
            }),
        }
    }

    /// A mock that fails the first `n` attempts and then succeeds.
    pub fn failing_first(n: usize) -> Self {
        Self::with_config(MockConfig {
            fail_first: n,
            ..MockConfig::default()
        })
    }

    /// A mock that fails every attempt.
    pub fn always_failing() -> Self {
        Self::with_config(MockConfig {
            always_fail: true,
            ..MockConfig::default()
        })
    }

    /// Every payload received so far, in arrival order.
    pub fn attempts(&self) -> Vec<Message> {
        match self.inner.attempts.lock() {
            Ok(attempts) => attempts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of attempts received so far.
    pub fn attempt_count(&self) -> usize {
        self.inner.attempt_count.load(Ordering::SeqCst)
    }

    /// Override what [`Output::connected`] reports.
    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::SeqCst);
    }

    /// Whether the mock has fully stopped.
    pub fn is_closed(&self) -> bool {
        self.inner.lifecycle.is_closed()
    }

    /// Whether someone asked the mock to stop.
    pub fn close_requested(&self) -> bool {
        !self.inner.lifecycle.is_running()
    }
}

impl Default for MockOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    fn record(&self, payload: &Message) -> usize {
        match self.attempts.lock() {
            Ok(mut attempts) => attempts.push(payload.clone()),
            Err(poisoned) => poisoned.into_inner().push(payload.clone()),
        }
        self.attempt_count.fetch_add(1, Ordering::SeqCst)
    }

    fn response_for(&self, attempt: usize, payload: &Message) -> Response {
        let fail = self.config.always_fail || attempt < self.config.fail_first;
        if !fail {
            Response::ack(payload.len())
        } else if self.config.fail_with_noack {
            Response::Noack
        } else {
            Response::error(DeliveryError::Rejected(format!(
                "mock failure on attempt {}",
                attempt + 1
            )))
        }
    }
}

async fn run(state: Arc<MockState>, mut transactions: mpsc::Receiver<Transaction>) {
    let shutdown = state.lifecycle.shutdown_token();
    loop {
        let tx = tokio::select! {
            _ = shutdown.cancelled() => break,
            tx = transactions.recv() => match tx {
                Some(tx) => tx,
                None => break,
            },
        };

        let attempt = state.record(tx.payload());
        let response = state.response_for(attempt, tx.payload());
        match state.config.response_delay {
            Some(delay) => {
                state.responders.spawn(async move {
                    tokio::time::sleep(delay).await;
                    tx.respond(response);
                });
            }
            None => {
                tx.respond(response);
            }
        }
    }

    state.responders.close();
    state.responders.wait().await;
    if let Some(delay) = state.config.close_delay {
        tokio::time::sleep(delay).await;
    }
    state.lifecycle.mark_closed();
}

#[async_trait]
impl Output for MockOutput {
    fn consume(&self, transactions: mpsc::Receiver<Transaction>) -> Result<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(OutputError::AlreadyStarted);
        }
        tokio::spawn(run(Arc::clone(&self.inner), transactions));
        Ok(())
    }

    fn connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    fn close_async(&self) {
        self.inner.lifecycle.close_async();
        if !self.inner.started.load(Ordering::SeqCst) {
            self.inner.lifecycle.mark_closed();
        }
    }

    async fn wait_for_close(&self, timeout: Duration) -> Result<()> {
        Ok(self.inner.lifecycle.wait_for_close(timeout).await?)
    }
}
