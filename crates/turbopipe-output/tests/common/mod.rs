//! Shared helpers for retry output integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use turbopipe_core::retry::{BackoffPolicy, ExponentialBackoff};
use turbopipe_output::testing::MockOutput;
use turbopipe_output::{Output, RetryOutput};
use turbopipe_protocol::{Message, ResponseReceiver, Transaction};

/// A running retry output wrapped around a mock child.
pub struct Harness {
    pub output: Arc<RetryOutput>,
    pub child: MockOutput,
    pub upstream: mpsc::Sender<Transaction>,
}

impl Harness {
    /// Start a retry output over `child` with `policy`.
    pub fn start(child: MockOutput, policy: impl BackoffPolicy + 'static) -> Self {
        init_tracing();
        let output = Arc::new(RetryOutput::new(Arc::new(child.clone()), Arc::new(policy)));
        let (upstream, rx) = mpsc::channel(16);
        output.consume(rx).unwrap();
        Self {
            output,
            child,
            upstream,
        }
    }

    /// Submit a message and return where its answer will arrive.
    pub async fn send(&self, parts: &[&str]) -> ResponseReceiver {
        let (tx, rx) = Transaction::new(Message::from_strs(parts));
        self.upstream.send(tx).await.unwrap();
        rx
    }

    /// Position of each attempt carrying `part` as its first part.
    pub fn attempt_positions(&self, part: &str) -> Vec<usize> {
        self.child
            .attempts()
            .iter()
            .enumerate()
            .filter(|(_, msg)| msg.get(0).is_some_and(|p| &p[..] == part.as_bytes()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Stop the output and wait for it to finish.
    pub async fn shutdown(&self) {
        self.output.close_async();
        self.output
            .wait_for_close(Duration::from_secs(5))
            .await
            .unwrap();
    }
}

/// Route `tracing` output through the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Exponential policy without jitter.
pub fn policy(initial: Duration, max: Duration) -> ExponentialBackoff {
    ExponentialBackoff::builder()
        .initial_interval(initial)
        .max_interval(max)
        .jitter(0.0)
        .build()
}

/// Poll `condition` until it holds, panicking after `timeout`.
pub async fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within {timeout:?}");
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
