//! Output stages for turbopipe
//!
//! An output reads [`Transaction`](turbopipe_protocol::Transaction)s from a
//! channel and answers each one with a
//! [`Response`](turbopipe_protocol::Response).
//!
//! # Outputs
//!
//! - **`retry`**: [`RetryOutput`] - redelivers to a child output with backoff
//!   until it succeeds or the retry budget is spent
//! - **`drop`**: [`drop::drop_output`] - acknowledges and discards everything
//! - **`stdout`**: [`stdout::stdout_output`] - writes message parts to stdout
//!
//! Outputs are usually built from [`OutputConfig`] through a [`Registry`]:
//!
//! ```rust
//! use turbopipe_output::{Output, OutputConfig, Registry};
//!
//! let config = OutputConfig::from_yaml_str(r#"
//! type: retry
//! retry:
//!   output:
//!     type: drop
//!   max_retries: 3
//!   backoff:
//!     initial_interval: 50ms
//!     max_interval: 2s
//! "#).unwrap();
//!
//! let output = Registry::new().build(&config).unwrap();
//! assert!(output.connected());
//! ```
//!
//! # Features
//!
//! - `trace`: adds [`logging::init`] for installing a `tracing` subscriber

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod drop;
pub mod error;
#[cfg(feature = "trace")]
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod retry;
pub mod stdout;
pub mod testing;
pub mod traits;
pub mod writer;

pub use config::{OutputConfig, RetryConfig, StdoutConfig};
pub use error::{OutputError, Result};
pub use metrics::{RetryMetrics, RetryMetricsSnapshot};
pub use registry::{Constructor, Registry};
pub use retry::RetryOutput;
pub use traits::Output;
pub use writer::{Writer, WriterOutput};
