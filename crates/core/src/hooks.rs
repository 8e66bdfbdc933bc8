//! Engine hooks for observability.
//!
//! The engine never logs on its own. Callers that want to see what it is
//! doing install an [`EngineHook`] on a registry, lazy handle, bridge or
//! [`crate::EngineContext`], and receive events as they happen.
//!
//! ## Events
//!
//! - `on_construct_start`: a registry factory or lazy descriptor is about to run
//! - `on_construct_end`: construction finished (successfully or not)
//! - `on_cache_hit`: an already-built instance was returned
//! - `on_rebind`: a bridge switched implementors
//!
//! ## Example
//!
//! ```ignore
//! struct PrintHook;
//!
//! impl EngineHook for PrintHook {
//!     fn on_construct_start(&self, key: &dyn std::fmt::Debug) {
//!         println!("building {:?}", key);
//!     }
//! }
//! ```

use std::fmt;

use crate::error::EngineError;

// ============================================================================
// Engine Hook Trait
// ============================================================================

/// Trait for observing engine events.
///
/// All methods have default no-op implementations, so you only need to
/// implement the events you care about.
pub trait EngineHook: Send + Sync {
    /// Called before a factory or descriptor builds an instance.
    ///
    /// # Arguments
    /// * `key` - Registry key or lazy descriptor being built
    fn on_construct_start(&self, _key: &dyn fmt::Debug) {}

    /// Called after construction completes.
    ///
    /// # Arguments
    /// * `key` - Registry key or lazy descriptor that was built
    /// * `outcome` - `Ok(())` on success, the error otherwise
    fn on_construct_end(&self, _key: &dyn fmt::Debug, _outcome: Result<(), &EngineError>) {}

    /// Called when a cached instance is returned without construction.
    fn on_cache_hit(&self, _key: &dyn fmt::Debug) {}

    /// Called after a bridge rebinds its implementor.
    fn on_rebind(&self, _component: &str) {}
}

// ============================================================================
// Null Hook (Default)
// ============================================================================

/// A no-op hook implementation for when no observation is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHook;

impl EngineHook for NullHook {}

// ============================================================================
// Logging Hook
// ============================================================================

/// A hook that emits every event as a `tracing` event.
///
/// Constructions log at `debug`, failures at `warn`. Cache hits are only
/// logged (at `trace`) when verbose, since they sit on the hot path.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHook {
    /// Whether to include cache hits
    pub verbose: bool,
}

impl LoggingHook {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl EngineHook for LoggingHook {
    fn on_construct_start(&self, key: &dyn fmt::Debug) {
        tracing::debug!(key = ?key, "constructing component");
    }

    fn on_construct_end(&self, key: &dyn fmt::Debug, outcome: Result<(), &EngineError>) {
        match outcome {
            Ok(()) => tracing::debug!(key = ?key, "component constructed"),
            Err(error) => tracing::warn!(key = ?key, %error, "component construction failed"),
        }
    }

    fn on_cache_hit(&self, key: &dyn fmt::Debug) {
        if self.verbose {
            tracing::trace!(key = ?key, "cache hit");
        }
    }

    fn on_rebind(&self, component: &str) {
        tracing::info!(component, "implementor rebound");
    }
}

// ============================================================================
// Composite Hook
// ============================================================================

/// A hook that delegates to multiple inner hooks.
pub struct CompositeHook {
    hooks: Vec<Box<dyn EngineHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the composite.
    pub fn with<H: EngineHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }
}

impl Default for CompositeHook {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHook for CompositeHook {
    fn on_construct_start(&self, key: &dyn fmt::Debug) {
        for hook in &self.hooks {
            hook.on_construct_start(key);
        }
    }

    fn on_construct_end(&self, key: &dyn fmt::Debug, outcome: Result<(), &EngineError>) {
        for hook in &self.hooks {
            hook.on_construct_end(key, outcome);
        }
    }

    fn on_cache_hit(&self, key: &dyn fmt::Debug) {
        for hook in &self.hooks {
            hook.on_cache_hit(key);
        }
    }

    fn on_rebind(&self, component: &str) {
        for hook in &self.hooks {
            hook.on_rebind(component);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
