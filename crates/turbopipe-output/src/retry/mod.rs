//! The `retry` output
//!
//! Wraps a child output and keeps resubmitting each transaction to it until
//! the child acknowledges it or the backoff budget runs out. Transactions
//! that exhaust their budget are answered with `Noack`.
//!
//! While any transaction is failing, no new transactions are pulled from
//! upstream. Those already in flight keep retrying independently.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//! use turbopipe_core::retry::ExponentialBackoff;
//! use turbopipe_output::testing::MockOutput;
//! use turbopipe_output::{Output, RetryOutput};
//! use turbopipe_protocol::{Message, Response, Transaction};
//!
//! # tokio_test::block_on(async {
//! let child = MockOutput::failing_first(1);
//! let policy = ExponentialBackoff::builder()
//!     .initial_interval(Duration::from_millis(1))
//!     .build();
//! let output = RetryOutput::new(Arc::new(child.clone()), Arc::new(policy));
//!
//! let (tx, rx) = mpsc::channel(1);
//! output.consume(rx).unwrap();
//!
//! let (txn, res) = Transaction::new(Message::from_strs(["hello"]));
//! tx.send(txn).await.unwrap();
//! assert_eq!(res.await.unwrap(), Response::Ack { parts: 1 });
//! assert_eq!(child.attempt_count(), 2);
//!
//! output.close_async();
//! output.wait_for_close(Duration::from_secs(5)).await.unwrap();
//! # });
//! ```

mod worker;

use crate::config::RetryConfig;
use crate::error::{OutputError, Result};
use crate::metrics::{RetryMetrics, RetryMetricsSnapshot};
use crate::registry::Registry;
use crate::traits::Output;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use turbopipe_core::lifecycle::{Lifecycle, LifecycleState};
use turbopipe_core::retry::BackoffPolicy;
use turbopipe_protocol::Transaction;
use worker::{ErrorLoops, WorkerContext};

/// How long the intake waits for a wake-up before re-checking for failing
/// transactions.
const INTAKE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long each wait for the child to close lasts before waiting again.
const CHILD_CLOSE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// An output that retries failed deliveries to a child output with backoff.
pub struct RetryOutput {
    child: Arc<dyn Output>,
    policy: Arc<dyn BackoffPolicy>,
    metrics: Arc<RetryMetrics>,
    lifecycle: Arc<Lifecycle>,
    started: AtomicBool,
}

impl RetryOutput {
    /// Retry deliveries to `child`, pacing retries with `policy`.
    pub fn new(child: Arc<dyn Output>, policy: Arc<dyn BackoffPolicy>) -> Self {
        Self {
            child,
            policy,
            metrics: Arc::new(RetryMetrics::new()),
            lifecycle: Arc::new(Lifecycle::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Build from configuration, constructing the child through `registry`.
    ///
    /// # Errors
    ///
    /// - [`OutputError::MissingChild`] if no child output is configured
    /// - [`OutputError::Construction`] if the child fails to build
    /// - [`OutputError::Config`] if the backoff settings are invalid
    pub fn from_config(config: &RetryConfig, registry: &Registry) -> Result<Self> {
        let child_config = config
            .output
            .as_deref()
            .ok_or(OutputError::MissingChild("retry"))?;
        let child = registry
            .build(child_config)
            .map_err(|err| OutputError::construction(child_config.kind.clone(), err))?;
        let policy = config.retries.policy()?;
        Ok(Self::new(child, Arc::new(policy)))
    }

    /// Current counters.
    pub fn metrics(&self) -> RetryMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}

struct Coordinator {
    child: Arc<dyn Output>,
    out: mpsc::Sender<Transaction>,
    policy: Arc<dyn BackoffPolicy>,
    metrics: Arc<RetryMetrics>,
    lifecycle: Arc<Lifecycle>,
    error_loops: Arc<ErrorLoops>,
    workers: TaskTracker,
}

impl Coordinator {
    fn worker_context(&self) -> WorkerContext {
        WorkerContext {
            out: self.out.clone(),
            policy: Arc::clone(&self.policy),
            metrics: Arc::clone(&self.metrics),
            error_loops: Arc::clone(&self.error_loops),
            shutdown: self.lifecycle.shutdown_token(),
        }
    }

    async fn run(self, mut transactions: mpsc::Receiver<Transaction>) {
        self.metrics.started();
        let shutdown = self.lifecycle.shutdown_token();

        'intake: while self.lifecycle.is_running() {
            while self.error_loops.active() > 0 {
                tokio::select! {
                    _ = shutdown.cancelled() => break 'intake,
                    _ = self.error_loops.interrupted() => {}
                    _ = tokio::time::sleep(INTAKE_POLL_INTERVAL) => {}
                }
            }

            let tx = tokio::select! {
                _ = shutdown.cancelled() => break,
                tx = transactions.recv() => match tx {
                    Some(tx) => tx,
                    None => {
                        debug!("Upstream closed, stopping retry output");
                        break;
                    }
                },
            };
            self.metrics.received();

            let (payload, reply) = tx.into_parts();
            let (attempt, pending) = Transaction::new(payload.clone());
            tokio::select! {
                _ = shutdown.cancelled() => break,
                sent = self.out.send(attempt) => {
                    if sent.is_err() {
                        warn!("Child output stopped reading, stopping retry output");
                        break;
                    }
                }
            }

            self.workers
                .spawn(worker::run(self.worker_context(), payload, reply, pending));
        }

        self.finish().await;
    }

    async fn finish(self) {
        self.workers.close();
        self.workers.wait().await;

        let Coordinator {
            child,
            out,
            metrics,
            lifecycle,
            ..
        } = self;
        drop(out);

        child.close_async();
        while let Err(err) = child.wait_for_close(CHILD_CLOSE_POLL_INTERVAL).await {
            debug!(error = %err, "Still waiting for child output to close");
        }

        metrics.stopped();
        info!("Retry output closed");
        lifecycle.mark_closed();
    }
}

#[async_trait]
impl Output for RetryOutput {
    fn consume(&self, transactions: mpsc::Receiver<Transaction>) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(OutputError::AlreadyStarted);
        }

        let (out, out_rx) = mpsc::channel(1);
        if let Err(err) = self.child.consume(out_rx) {
            self.started.store(false, Ordering::SeqCst);
            // A close that raced this call left teardown to a coordinator
            // that will never run
            if !self.lifecycle.is_running() {
                self.child.close_async();
                self.lifecycle.mark_closed();
            }
            return Err(err);
        }

        let coordinator = Coordinator {
            child: Arc::clone(&self.child),
            out,
            policy: Arc::clone(&self.policy),
            metrics: Arc::clone(&self.metrics),
            lifecycle: Arc::clone(&self.lifecycle),
            error_loops: Arc::new(ErrorLoops::default()),
            workers: TaskTracker::new(),
        };
        debug!("Retry output consuming");
        tokio::spawn(coordinator.run(transactions));
        Ok(())
    }

    fn connected(&self) -> bool {
        self.child.connected()
    }

    fn close_async(&self) {
        if self.lifecycle.close_async() {
            debug!("Closing retry output");
        }
        if !self.started.load(Ordering::SeqCst) {
            self.child.close_async();
            self.lifecycle.mark_closed();
        }
    }

    async fn wait_for_close(&self, timeout: Duration) -> Result<()> {
        Ok(self.lifecycle.wait_for_close(timeout).await?)
    }
}
