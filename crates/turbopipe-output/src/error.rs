//! Error types for output construction and lifecycle
//!
//! Delivery failures never surface here: they travel back to the sender as
//! [`Response`](turbopipe_protocol::Response) values. `OutputError` covers
//! what can go wrong while building, wiring, or stopping an output.

use thiserror::Error;
use turbopipe_core::ConfigError;
use turbopipe_core::lifecycle::WaitTimeout;

/// Result type alias for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

/// Errors raised while building, wiring, or stopping an output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// `consume` was called on an output that is already consuming.
    #[error("output is already consuming a transaction stream")]
    AlreadyStarted,

    /// The output did not finish closing in time.
    #[error(transparent)]
    Timeout(#[from] WaitTimeout),

    /// A wrapping output was configured without a child.
    #[error("cannot create {0} output without a child")]
    MissingChild(&'static str),

    /// No constructor is registered under this type name.
    #[error("output type '{0}' was not recognised")]
    UnknownType(String),

    /// A child output failed to construct.
    #[error("failed to create output '{kind}': {source}")]
    Construction {
        /// Type name of the child that failed
        kind: String,
        /// Why it failed
        #[source]
        source: Box<OutputError>,
    },

    /// Invalid retry or backoff settings.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OutputError {
    /// Wrap `source` as the failure of a child of type `kind`.
    pub fn construction(kind: impl Into<String>, source: OutputError) -> Self {
        Self::Construction {
            kind: kind.into(),
            source: Box::new(source),
        }
    }

    /// Whether this is a close timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<serde_json::Error> for OutputError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for OutputError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
