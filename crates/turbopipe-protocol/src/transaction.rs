//! Transactions: a payload plus a single-use reply slot

use crate::message::Message;
use crate::response::Response;
use tokio::sync::oneshot;

/// Receiving half of a transaction's reply slot.
///
/// Resolves to `Err` if the transaction is dropped without an answer.
pub type ResponseReceiver = oneshot::Receiver<Response>;

/// A message on its way to an output, together with where to report the
/// outcome.
///
/// The reply slot is a oneshot channel, so a transaction can be answered at
/// most once: [`respond`](Transaction::respond) consumes it.
#[derive(Debug)]
pub struct Transaction {
    payload: Message,
    response_tx: oneshot::Sender<Response>,
}

impl Transaction {
    /// Create a transaction for `payload` and the receiver its answer will
    /// arrive on.
    pub fn new(payload: Message) -> (Self, ResponseReceiver) {
        let (response_tx, response_rx) = oneshot::channel();
        (
            Self {
                payload,
                response_tx,
            },
            response_rx,
        )
    }

    /// The message being delivered.
    pub fn payload(&self) -> &Message {
        &self.payload
    }

    /// Answer the transaction.
    ///
    /// Never blocks. Returns `false` if nobody is listening anymore.
    pub fn respond(self, response: Response) -> bool {
        self.response_tx.send(response).is_ok()
    }

    /// Split into the payload and the raw reply sender.
    pub fn into_parts(self) -> (Message, oneshot::Sender<Response>) {
        (self.payload, self.response_tx)
    }
}
