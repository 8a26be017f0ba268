//! Integration tests for the retry output
//!
//! Delivery guarantees, backpressure, retry budgets and shutdown.

mod common;

use common::{Harness, eventually, policy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use turbopipe_core::retry::ExponentialBackoff;
use turbopipe_output::Output;
use turbopipe_output::testing::{MockConfig, MockOutput};
use turbopipe_protocol::Response;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fails_twice_then_succeeds() {
    let harness = Harness::start(
        MockOutput::failing_first(2),
        policy(Duration::from_millis(100), Duration::from_secs(1)),
    );

    let started = Instant::now();
    let res = harness.send(&["a", "b", "c"]).await;
    assert_eq!(res.await.unwrap(), Response::Ack { parts: 3 });

    // Two waits: 100ms then 200ms
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(harness.child.attempt_count(), 3);

    let metrics = harness.output.metrics();
    assert_eq!(metrics.count, 1);
    assert_eq!(metrics.send_error, 2);
    assert_eq!(metrics.send_success, 1);
    assert_eq!(metrics.parts_send_success, 3);
    assert_eq!(metrics.end_of_retries, 0);

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_retry_budget_exhausted() {
    let harness = Harness::start(
        MockOutput::always_failing(),
        ExponentialBackoff::builder()
            .initial_interval(Duration::from_millis(5))
            .max_interval(Duration::from_millis(20))
            .max_retries(2)
            .build(),
    );

    let res = harness.send(&["doomed"]).await;
    assert_eq!(res.await.unwrap(), Response::Noack);
    assert_eq!(harness.child.attempt_count(), 3);

    let metrics = harness.output.metrics();
    assert_eq!(metrics.send_error, 3);
    assert_eq!(metrics.end_of_retries, 1);
    assert_eq!(metrics.send_success, 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_zero_retry_policy_answers_noack_without_waiting() {
    let harness = Harness::start(
        MockOutput::always_failing(),
        ExponentialBackoff::builder()
            .initial_interval(Duration::from_secs(10))
            .max_interval(Duration::from_secs(10))
            .max_retries(0)
            .build(),
    );

    let started = Instant::now();
    let res = harness.send(&["x"]).await;
    assert_eq!(res.await.unwrap(), Response::Noack);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(harness.child.attempt_count(), 1);

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_elapsed_budget_bounds_unlimited_retries() {
    let harness = Harness::start(
        MockOutput::always_failing(),
        ExponentialBackoff::builder()
            .initial_interval(Duration::from_millis(10))
            .max_interval(Duration::from_millis(20))
            .max_elapsed_time(Duration::from_millis(150))
            .jitter(0.0)
            .build(),
    );

    let started = Instant::now();
    let res = harness.send(&["x"]).await;
    assert_eq!(res.await.unwrap(), Response::Noack);
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert!(harness.child.attempt_count() > 3);
    assert_eq!(harness.output.metrics().end_of_retries, 1);

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failing_transaction_holds_back_intake() {
    let harness = Harness::start(
        MockOutput::failing_first(1),
        policy(Duration::from_millis(300), Duration::from_secs(1)),
    );

    let a = harness.send(&["a"]).await;
    eventually(Duration::from_secs(2), || {
        harness.output.metrics().send_error == 1
    })
    .await;

    let b = harness.send(&["b"]).await;
    let c = harness.send(&["c"]).await;

    // While "a" backs off, at most one more transaction may slip through
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(harness.output.metrics().count <= 2);

    for res in [a, b, c] {
        assert!(res.await.unwrap().is_ack());
    }
    assert_eq!(harness.output.metrics().count, 3);

    let a_attempts = harness.attempt_positions("a");
    let c_attempts = harness.attempt_positions("c");
    assert_eq!(a_attempts.len(), 2);
    assert_eq!(c_attempts.len(), 1);
    assert!(
        c_attempts[0] > a_attempts[1],
        "c was pulled before a recovered: {:?}",
        harness.child.attempts()
    );

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_transaction_answered_once() {
    let harness = Harness::start(
        MockOutput::failing_first(10),
        policy(Duration::from_millis(1), Duration::from_millis(5)),
    );

    let mut pending = Vec::new();
    for i in 0..50 {
        let part = i.to_string();
        pending.push(harness.send(&[part.as_str()]).await);
    }

    let mut acks = 0;
    for res in pending {
        if res.await.unwrap().is_ack() {
            acks += 1;
        }
    }
    assert_eq!(acks, 50);

    let metrics = harness.output.metrics();
    assert_eq!(metrics.count, 50);
    assert_eq!(metrics.send_success, 50);
    assert_eq!(metrics.send_error, 10);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_noack_from_child_is_retried() {
    let harness = Harness::start(
        MockOutput::with_config(MockConfig {
            fail_first: 1,
            fail_with_noack: true,
            ..MockConfig::default()
        }),
        policy(Duration::from_millis(1), Duration::from_millis(5)),
    );

    let res = harness.send(&["x"]).await;
    assert!(res.await.unwrap().is_ack());
    assert_eq!(harness.child.attempt_count(), 2);

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_abandons_retrying_transactions() {
    let harness = Harness::start(
        MockOutput::always_failing(),
        policy(Duration::from_secs(10), Duration::from_secs(10)),
    );

    let res = harness.send(&["stuck"]).await;
    eventually(Duration::from_secs(2), || {
        harness.output.metrics().send_error == 1
    })
    .await;

    let started = Instant::now();
    harness.shutdown().await;
    assert!(started.elapsed() < Duration::from_secs(5));

    // Shut down mid-backoff: no answer is written
    assert!(res.await.is_err());
    assert!(harness.child.is_closed());
    assert_eq!(harness.output.metrics().running, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_close_is_idempotent() {
    let harness = Harness::start(
        MockOutput::new(),
        policy(Duration::from_millis(1), Duration::from_millis(5)),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let output = Arc::clone(&harness.output);
        handles.push(tokio::spawn(async move {
            output.close_async();
            output.wait_for_close(Duration::from_secs(5)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Already closed: returns immediately, repeatedly
    harness
        .output
        .wait_for_close(Duration::from_millis(1))
        .await
        .unwrap();
    harness
        .output
        .wait_for_close(Duration::from_millis(1))
        .await
        .unwrap();
    harness.output.close_async();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_waits_for_slow_child_to_close() {
    let harness = Harness::start(
        MockOutput::with_config(MockConfig {
            close_delay: Some(Duration::from_millis(1500)),
            ..MockConfig::default()
        }),
        policy(Duration::from_millis(1), Duration::from_millis(5)),
    );

    harness.output.close_async();
    let err = harness
        .output
        .wait_for_close(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    harness
        .output
        .wait_for_close(Duration::from_secs(5))
        .await
        .unwrap();
    assert!(harness.child.is_closed());
}

#[tokio::test]
async fn test_upstream_close_finishes_in_flight_work() {
    let harness = Harness::start(
        MockOutput::failing_first(1),
        policy(Duration::from_millis(20), Duration::from_millis(50)),
    );

    let res = harness.send(&["last"]).await;
    let Harness {
        output,
        child,
        upstream,
    } = harness;
    drop(upstream);

    assert!(res.await.unwrap().is_ack());
    output.wait_for_close(Duration::from_secs(5)).await.unwrap();
    assert!(child.close_requested());
    assert!(child.is_closed());
}
