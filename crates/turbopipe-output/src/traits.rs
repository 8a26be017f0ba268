//! The output contract
//!
//! Every stage that delivers transactions somewhere implements [`Output`].

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use turbopipe_protocol::Transaction;

/// A delivery target for a stream of transactions.
///
/// An output is wired once with [`consume`](Output::consume) and then
/// answers every transaction it reads from the stream. Closing the stream is
/// end-of-input; [`close_async`](Output::close_async) asks the output to stop
/// early. Implementations are shared behind `Arc`, so every method takes
/// `&self`.
#[async_trait]
pub trait Output: Send + Sync {
    /// Start reading transactions from `transactions`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::AlreadyStarted`](crate::OutputError::AlreadyStarted)
    /// if the output is already consuming a stream.
    fn consume(&self, transactions: mpsc::Receiver<Transaction>) -> Result<()>;

    /// Whether the output is currently able to deliver.
    fn connected(&self) -> bool;

    /// Ask the output to stop. Never blocks and may be called repeatedly.
    fn close_async(&self);

    /// Wait until the output has fully stopped.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Timeout`](crate::OutputError::Timeout) if it
    /// has not stopped within `timeout`.
    async fn wait_for_close(&self, timeout: Duration) -> Result<()>;
}
