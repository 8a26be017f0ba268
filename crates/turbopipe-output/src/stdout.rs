//! The `stdout` output: writes every message part followed by a delimiter.
//!
//! The writer is generic over any [`AsyncWrite`] sink so the same code backs
//! stdout and in-memory pipes.

use crate::config::StdoutConfig;
use crate::writer::{Writer, WriterOutput};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use turbopipe_protocol::{DeliveryError, Message};

/// Writer that streams message parts into a byte sink.
pub struct StreamWriter<S> {
    sink: Mutex<S>,
    delimiter: Vec<u8>,
}

impl<S> StreamWriter<S>
where
    S: AsyncWrite + Unpin + Send + 'static,
{
    /// Write into `sink`, terminating each part with `delimiter`.
    pub fn new(sink: S, delimiter: impl Into<Vec<u8>>) -> Self {
        Self {
            sink: Mutex::new(sink),
            delimiter: delimiter.into(),
        }
    }
}

#[async_trait]
impl<S> Writer for StreamWriter<S>
where
    S: AsyncWrite + Unpin + Send + 'static,
{
    async fn write(&self, message: &Message) -> Result<(), DeliveryError> {
        let mut sink = self.sink.lock().await;
        for part in message {
            sink.write_all(part).await?;
            sink.write_all(&self.delimiter).await?;
        }
        sink.flush().await?;
        Ok(())
    }

    async fn close(&self) {
        if let Err(err) = self.sink.lock().await.flush().await {
            tracing::warn!(error = %err, "Failed to flush on close");
        }
    }
}

/// Create a `stdout` output.
pub fn stdout_output(config: &StdoutConfig) -> WriterOutput<StreamWriter<tokio::io::Stdout>> {
    WriterOutput::new(
        "stdout",
        StreamWriter::new(tokio::io::stdout(), config.delimiter.as_bytes()),
    )
}
