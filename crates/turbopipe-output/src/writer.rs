//! Outputs built from a one-message-at-a-time [`Writer`]
//!
//! [`WriterOutput`] owns the transaction loop: it reads a transaction, hands
//! the payload to the writer, and answers with `Ack` or `Error` depending on
//! the result. Writers only deal with messages.

use crate::error::{OutputError, Result};
use crate::traits::Output;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use turbopipe_core::lifecycle::Lifecycle;
use turbopipe_protocol::{DeliveryError, Message, Response, Transaction};

/// Something that can deliver one message at a time.
#[async_trait]
pub trait Writer: Send + Sync + 'static {
    /// Deliver `message`.
    async fn write(&self, message: &Message) -> std::result::Result<(), DeliveryError>;

    /// Whether the writer can currently deliver.
    fn connected(&self) -> bool {
        true
    }

    /// Release resources once no more writes will happen.
    async fn close(&self) {}
}

/// An [`Output`] that drives a [`Writer`].
pub struct WriterOutput<W> {
    name: &'static str,
    writer: Arc<W>,
    started: AtomicBool,
    lifecycle: Arc<Lifecycle>,
}

impl<W: Writer> WriterOutput<W> {
    /// Wrap `writer`; `name` is used in log lines.
    pub fn new(name: &'static str, writer: W) -> Self {
        Self {
            name,
            writer: Arc::new(writer),
            started: AtomicBool::new(false),
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    /// The wrapped writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

async fn run<W: Writer>(
    name: &'static str,
    writer: Arc<W>,
    lifecycle: Arc<Lifecycle>,
    mut transactions: mpsc::Receiver<Transaction>,
) {
    let shutdown = lifecycle.shutdown_token();
    loop {
        let tx = tokio::select! {
            _ = shutdown.cancelled() => break,
            tx = transactions.recv() => match tx {
                Some(tx) => tx,
                None => break,
            },
        };

        let response = match writer.write(tx.payload()).await {
            Ok(()) => Response::ack(tx.payload().len()),
            Err(err) => {
                warn!(output = name, error = %err, "Write failed");
                Response::error(err)
            }
        };
        tx.respond(response);
    }

    writer.close().await;
    debug!(output = name, "Writer output stopped");
    lifecycle.mark_closed();
}

#[async_trait]
impl<W: Writer> Output for WriterOutput<W> {
    fn consume(&self, transactions: mpsc::Receiver<Transaction>) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(OutputError::AlreadyStarted);
        }
        tokio::spawn(run(
            self.name,
            Arc::clone(&self.writer),
            Arc::clone(&self.lifecycle),
            transactions,
        ));
        Ok(())
    }

    fn connected(&self) -> bool {
        self.writer.connected()
    }

    fn close_async(&self) {
        self.lifecycle.close_async();
        if !self.started.load(Ordering::SeqCst) {
            self.lifecycle.mark_closed();
        }
    }

    async fn wait_for_close(&self, timeout: Duration) -> Result<()> {
        Ok(self.lifecycle.wait_for_close(timeout).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        written: Mutex<Vec<usize>>,
        reject: bool,
    }

    #[async_trait]
    impl Writer for Recording {
        async fn write(&self, message: &Message) -> std::result::Result<(), DeliveryError> {
            if self.reject {
                return Err(DeliveryError::Rejected("full".into()));
            }
            self.written.lock().unwrap().push(message.len());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_acks_written_messages() {
        let output = WriterOutput::new("recording", Recording::default());
        let (tx, rx) = mpsc::channel(1);
        output.consume(rx).unwrap();

        let (txn, res) = Transaction::new(Message::from_strs(["a", "b", "c"]));
        tx.send(txn).await.unwrap();
        assert_eq!(res.await.unwrap(), Response::ack(3));
        assert_eq!(*output.writer().written.lock().unwrap(), vec![3]);

        drop(tx);
        output.wait_for_close(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_error_is_reported() {
        let output = WriterOutput::new(
            "recording",
            Recording {
                reject: true,
                ..Recording::default()
            },
        );
        let (tx, rx) = mpsc::channel(1);
        output.consume(rx).unwrap();

        let (txn, res) = Transaction::new(Message::from_strs(["a"]));
        tx.send(txn).await.unwrap();
        assert_eq!(
            res.await.unwrap().delivery_error(),
            Some(&DeliveryError::Rejected("full".into()))
        );

        output.close_async();
        output.wait_for_close(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_double_consume() {
        let output = WriterOutput::new("recording", Recording::default());
        let (_tx1, rx1) = mpsc::channel(1);
        let (_tx2, rx2) = mpsc::channel(1);
        output.consume(rx1).unwrap();
        assert!(matches!(output.consume(rx2), Err(OutputError::AlreadyStarted)));
        output.close_async();
        output.wait_for_close(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_before_consume() {
        let output = WriterOutput::new("recording", Recording::default());
        output.close_async();
        output.wait_for_close(Duration::from_millis(10)).await.unwrap();
    }
}
