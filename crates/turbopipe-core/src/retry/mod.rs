//! Backoff policies for retrying outputs.
//!
//! - [`BackoffPolicy`] / [`Backoff`]: the factory and per-transaction instance
//! - [`ExponentialBackoff`]: the policy built from configuration
//! - [`RetriesConfig`]: the serde form of a policy

pub mod config;
pub mod exponential;
pub mod strategy;

pub use config::{BackoffConfig, RetriesConfig};
pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder, ExponentialBackoffState};
pub use strategy::{Backoff, BackoffPolicy};
