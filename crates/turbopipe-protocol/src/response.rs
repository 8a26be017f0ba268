//! Delivery outcomes

use crate::error::DeliveryError;
use serde::{Deserialize, Serialize};

/// The answer to a [`Transaction`](crate::Transaction)
///
/// Only [`Response::Ack`] means the payload was delivered. Stages that retry
/// treat every other variant as a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Delivered
    Ack {
        /// Number of parts the target accepted
        parts: usize,
    },

    /// Not delivered, and nothing more will be tried
    Noack,

    /// A delivery attempt failed
    Error {
        /// What went wrong
        error: DeliveryError,
    },
}

impl Response {
    /// Successful delivery of `parts` parts.
    pub fn ack(parts: usize) -> Self {
        Self::Ack { parts }
    }

    /// Failed delivery.
    pub fn error(error: impl Into<DeliveryError>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// Whether this is a successful delivery.
    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack { .. })
    }

    /// The failure carried by an error response.
    pub fn delivery_error(&self) -> Option<&DeliveryError> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}
