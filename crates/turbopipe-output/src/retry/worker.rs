//! Per-transaction retry loop

use crate::metrics::RetryMetrics;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Notify, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use turbopipe_core::retry::{Backoff, BackoffPolicy};
use turbopipe_protocol::{Message, Response, ResponseReceiver, Transaction};

/// Count of workers currently failing, plus the wake-up the coordinator
/// waits on while that count is non-zero.
#[derive(Debug, Default)]
pub(crate) struct ErrorLoops {
    active: AtomicI64,
    interrupt: Notify,
}

impl ErrorLoops {
    pub(crate) fn active(&self) -> i64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Register a worker entering its error loop.
    pub(crate) fn enter(self: &Arc<Self>) -> ErrorLoopGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ErrorLoopGuard {
            loops: Arc::clone(self),
        }
    }

    /// Resolves when a worker leaves its error loop.
    pub(crate) async fn interrupted(&self) {
        self.interrupt.notified().await
    }
}

/// Leaves the error loop on drop, whichever way the worker exits.
pub(crate) struct ErrorLoopGuard {
    loops: Arc<ErrorLoops>,
}

impl Drop for ErrorLoopGuard {
    fn drop(&mut self) {
        self.loops.active.fetch_sub(1, Ordering::SeqCst);
        self.loops.interrupt.notify_one();
    }
}

/// Everything a worker shares with its coordinator.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) out: mpsc::Sender<Transaction>,
    pub(crate) policy: Arc<dyn BackoffPolicy>,
    pub(crate) metrics: Arc<RetryMetrics>,
    pub(crate) error_loops: Arc<ErrorLoops>,
    pub(crate) shutdown: CancellationToken,
}

fn describe(result: &Result<Response, oneshot::error::RecvError>) -> Option<String> {
    match result {
        Ok(response) if response.is_ack() => None,
        Ok(response) => Some(match response.delivery_error() {
            Some(error) => error.to_string(),
            None => "output declined the message".to_string(),
        }),
        Err(_) => Some("output dropped the message without answering".to_string()),
    }
}

/// Drive one transaction until it is delivered, its budget runs out, or
/// shutdown is requested.
///
/// `pending` is the answer slot of the attempt already dispatched. `reply`
/// is written exactly once with the final outcome, or dropped unanswered on
/// shutdown.
pub(crate) async fn run(
    ctx: WorkerContext,
    payload: Message,
    reply: oneshot::Sender<Response>,
    mut pending: ResponseReceiver,
) {
    let mut backoff: Option<Box<dyn Backoff>> = None;
    let mut guard: Option<ErrorLoopGuard> = None;
    let mut attempt: u32 = 1;

    let outcome = loop {
        let result = tokio::select! {
            _ = ctx.shutdown.cancelled() => return,
            result = &mut pending => result,
        };

        let Some(failure) = describe(&result) else {
            ctx.metrics.delivered(payload.len());
            break Response::ack(payload.len());
        };

        if guard.is_none() {
            guard = Some(ctx.error_loops.enter());
        }
        ctx.metrics.failed_attempt();
        error!(attempt, error = %failure, "Failed to send message");

        let instance = backoff.get_or_insert_with(|| ctx.policy.new_backoff());
        let Some(wait) = instance.next_backoff() else {
            ctx.metrics.gave_up();
            warn!(attempts = attempt, "Retries exhausted, message will not be delivered");
            break Response::Noack;
        };

        debug!(attempt, wait = ?wait, "Backing off before retry");
        tokio::select! {
            _ = ctx.shutdown.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }

        let (retry, next) = Transaction::new(payload.clone());
        tokio::select! {
            _ = ctx.shutdown.cancelled() => return,
            sent = ctx.out.send(retry) => {
                if sent.is_err() {
                    warn!(attempt, "Output input closed, abandoning message");
                    return;
                }
            }
        }
        pending = next;
        attempt += 1;
    };

    drop(guard);
    let _ = reply.send(outcome);
}
