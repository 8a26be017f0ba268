//! Output constructors keyed by type name
//!
//! [`Registry::new`] knows the built-in outputs (`retry`, `drop`, `stdout`).
//! Additional types can be registered, which is how wrapping outputs such as
//! `retry` can build children of any kind.

use crate::config::OutputConfig;
use crate::drop::drop_output;
use crate::error::{OutputError, Result};
use crate::retry::RetryOutput;
use crate::stdout::stdout_output;
use crate::traits::Output;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds an output from its configuration.
///
/// Receives the registry so it can build child outputs.
pub type Constructor =
    Arc<dyn Fn(&OutputConfig, &Registry) -> Result<Arc<dyn Output>> + Send + Sync>;

/// Maps output type names to constructors.
#[derive(Clone)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Registry {
    /// A registry with the built-in outputs.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("retry", |config, registry| {
            Ok(Arc::new(RetryOutput::from_config(&config.retry, registry)?))
        });
        registry.register("drop", |_, _| Ok(Arc::new(drop_output())));
        registry.register("stdout", |config, _| Ok(Arc::new(stdout_output(&config.stdout))));
        registry
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&OutputConfig, &Registry) -> Result<Arc<dyn Output>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Arc::new(constructor));
    }

    /// Whether `kind` has a constructor.
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered type names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the output described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::UnknownType`] if nothing is registered under
    /// `config.kind`, or whatever the constructor returns.
    pub fn build(&self, config: &OutputConfig) -> Result<Arc<dyn Output>> {
        let constructor = self
            .constructors
            .get(&config.kind)
            .ok_or_else(|| OutputError::UnknownType(config.kind.clone()))?;
        tracing::debug!(kind = %config.kind, "Building output");
        constructor(config, self)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
