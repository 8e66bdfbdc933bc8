//! Engine configuration.
//!
//! Plain data with builder-style setters. Loadable from JSON so a host
//! application can keep it next to its own settings; missing fields take
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ============================================================================
// Engine Configuration
// ============================================================================

/// Configuration for an [`crate::EngineContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Label attached to this context in logs
    pub context_name: String,
    /// Initial key capacity of registries created by the context
    pub registry_capacity: usize,
    /// Install a [`crate::LoggingHook`] by default
    pub log_constructions: bool,
    /// Also log cache hits
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_name: "default".to_string(),
            registry_capacity: 16,
            log_constructions: false,
            verbose: false,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::Config {
            reason: e.to_string(),
        })
    }

    /// Set the context label.
    pub fn with_context_name(mut self, name: impl Into<String>) -> Self {
        self.context_name = name.into();
        self
    }

    /// Set registry capacity.
    pub fn with_registry_capacity(mut self, capacity: usize) -> Self {
        self.registry_capacity = capacity;
        self
    }

    /// Log constructions through `tracing`.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_constructions = enabled;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
