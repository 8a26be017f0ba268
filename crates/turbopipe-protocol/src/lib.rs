//! Shared types exchanged between turbopipe stages
//!
//! An input hands an output a stream of [`Transaction`]s. Each transaction
//! carries a [`Message`] and a single-use reply slot; the output answers it
//! exactly once with a [`Response`].
//!
//! # Type Organization
//!
//! - **Messages**: [`message`] - ordered batches of byte parts
//! - **Transactions**: [`transaction`] - a payload plus its reply slot
//! - **Responses**: [`response`] - delivery outcomes
//! - **Error types**: [`error`] - delivery failures reported by outputs
//!
//! # Usage
//!
//! ```rust
//! use turbopipe_protocol::{Message, Response, Transaction};
//!
//! # tokio_test::block_on(async {
//! let (tx, rx) = Transaction::new(Message::from_strs(["hello", "world"]));
//! let parts = tx.payload().len();
//! tx.respond(Response::ack(parts));
//!
//! assert_eq!(rx.await.unwrap(), Response::Ack { parts: 2 });
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod message;
pub mod response;
pub mod transaction;

pub use error::DeliveryError;
pub use message::Message;
pub use response::Response;
pub use transaction::{ResponseReceiver, Transaction};
