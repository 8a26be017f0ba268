//! Error types for delivery outcomes
//!
//! A [`DeliveryError`] is data, not control flow: outputs place it inside a
//! [`Response::Error`](crate::Response::Error) so the sender can decide what
//! to do with it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a target failed to deliver a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DeliveryError {
    /// The target is not connected
    NotConnected,

    /// The target refused the message
    Rejected(String),

    /// The target did not answer in time
    Timeout,

    /// An I/O failure while writing
    Io(String),

    /// Any other failure
    Other(String),
}

impl DeliveryError {
    /// Build a [`DeliveryError::Other`] from any displayable value.
    pub fn other(msg: impl fmt::Display) -> Self {
        Self::Other(msg.to_string())
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "Not connected"),
            Self::Rejected(msg) => write!(f, "Rejected: {}", msg),
            Self::Timeout => write!(f, "Timed out"),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DeliveryError {}

impl From<std::io::Error> for DeliveryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
