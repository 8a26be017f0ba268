//! The `drop` output: acknowledges and discards everything.

use crate::writer::{Writer, WriterOutput};
use async_trait::async_trait;
use turbopipe_protocol::{DeliveryError, Message};

/// Writer that discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct DropWriter;

#[async_trait]
impl Writer for DropWriter {
    async fn write(&self, message: &Message) -> Result<(), DeliveryError> {
        tracing::trace!(parts = message.len(), "Dropping message");
        Ok(())
    }
}

/// Create a `drop` output.
pub fn drop_output() -> WriterOutput<DropWriter> {
    WriterOutput::new("drop", DropWriter)
}
