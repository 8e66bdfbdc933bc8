//! # Engine Context
//!
//! An [`EngineContext`] bundles a configuration, an observation hook and a
//! type-indexed pool of process-wide instances. Registries, lazy handles
//! and bridges created through the context share its hook, so a single
//! [`crate::LoggingHook`] (or any custom hook) sees every construction.
//!
//! Singletons are keyed by [`TypeId`]: asking for `instance::<T>()` twice
//! returns the same `Arc<T>`, built once even under contention, because the
//! pool is itself a [`ComponentRegistry`].

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::chain::{Abstraction, Bridge};
use crate::component::Component;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::hooks::{EngineHook, LoggingHook, NullHook};
use crate::lazy::LazyHandle;
use crate::registry::ComponentRegistry;

type AnyInstance = dyn Any + Send + Sync;

/// Configuration, hook and singletons shared by a group of components.
pub struct EngineContext {
    config: EngineConfig,
    hook: Arc<dyn EngineHook>,
    instances: ComponentRegistry<TypeId, AnyInstance>,
}

impl EngineContext {
    /// Create a context. Logging is installed when the config asks for it.
    pub fn new(config: EngineConfig) -> Self {
        let hook: Arc<dyn EngineHook> = if config.log_constructions {
            Arc::new(LoggingHook {
                verbose: config.verbose,
            })
        } else {
            Arc::new(NullHook)
        };
        Self::build(config, hook)
    }

    /// Replace the hook. Pooled instances are discarded, so call this
    /// before the context is first used.
    pub fn with_hook(self, hook: Arc<dyn EngineHook>) -> Self {
        Self::build(self.config, hook)
    }

    fn build(config: EngineConfig, hook: Arc<dyn EngineHook>) -> Self {
        let instances = ComponentRegistry::with_capacity(config.registry_capacity)
            .with_hook(Arc::clone(&hook));
        Self {
            config,
            hook,
            instances,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hook(&self) -> Arc<dyn EngineHook> {
        Arc::clone(&self.hook)
    }

    /// The context-wide instance of `T`, built by `init` on first request.
    pub fn instance<T, F>(&self, init: F) -> Result<Arc<T>, EngineError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, EngineError>,
    {
        let instance = self.instances.get_or_create(TypeId::of::<T>(), || {
            init().map(|value| Arc::new(value) as Arc<AnyInstance>)
        })?;
        instance.downcast::<T>().map_err(|_| {
            EngineError::construction(std::any::type_name::<T>(), "pooled instance has another type")
        })
    }

    pub fn has_instance<T: Any>(&self) -> bool {
        self.instances.contains(&TypeId::of::<T>())
    }

    /// A new registry sized and hooked per this context.
    pub fn registry<K, C>(&self) -> ComponentRegistry<K, C>
    where
        K: Eq + Hash + Clone + fmt::Debug,
        C: ?Sized + Send + Sync,
    {
        ComponentRegistry::with_capacity(self.config.registry_capacity).with_hook(self.hook())
    }

    /// A lazy handle reporting to this context's hook.
    pub fn lazy<D, C, F>(&self, descriptor: D, build: F) -> LazyHandle<D, C>
    where
        D: fmt::Debug + Send + Sync,
        C: Component,
        F: Fn(&D) -> Result<C, EngineError> + Send + Sync + 'static,
    {
        LazyHandle::new(descriptor, build).with_hook(self.hook())
    }

    /// A bridge reporting rebinds to this context's hook.
    pub fn bridge<A, I>(&self, abstraction: A, implementor: Arc<I>) -> Bridge<A, I>
    where
        A: Abstraction<I>,
        I: ?Sized + Send + Sync,
    {
        Bridge::new(abstraction, implementor).with_hook(self.hook())
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("name", &self.config.context_name)
            .field("instances", &self.instances.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Leaf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        constructions: AtomicUsize,
        rebinds: AtomicUsize,
    }

    impl EngineHook for Counting {
        fn on_construct_start(&self, _key: &dyn fmt::Debug) {
            self.constructions.fetch_add(1, Ordering::SeqCst);
        }

        fn on_rebind(&self, _component: &str) {
            self.rebinds.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Settings {
        currency: &'static str,
    }

    #[test]
    fn test_instance_is_singleton() {
        let context = EngineContext::default();
        let builds = AtomicUsize::new(0);

        let make = || {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Settings { currency: "EUR" })
        };
        let first = context.instance(make).unwrap();
        let second = context
            .instance::<Settings, _>(|| panic!("already built"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.currency, "EUR");
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(context.has_instance::<Settings>());
        assert!(!context.has_instance::<String>());
    }

    #[test]
    fn test_failed_instance_is_retried() {
        let context = EngineContext::default();
        assert!(context
            .instance::<Settings, _>(|| Err(EngineError::construction("settings", "missing")))
            .is_err());
        assert!(!context.has_instance::<Settings>());
        assert!(context
            .instance(|| Ok(Settings { currency: "USD" }))
            .is_ok());
    }

    #[test]
    fn test_created_parts_share_hook() {
        let hook = Arc::new(Counting::default());
        let context = EngineContext::default().with_hook(hook.clone());

        let registry: ComponentRegistry<&str, Leaf<u8>> = context.registry();
        registry.intern("a", || Leaf::new("a", 1));

        let lazy = context.lazy("b", |name: &&str| Ok(Leaf::new(*name, 2u8)));
        assert_eq!(lazy.operation().unwrap(), 2);

        context.instance(|| Ok(Settings { currency: "GBP" })).unwrap();

        assert_eq!(hook.constructions.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_bridge_reports_rebinds() {
        use crate::chain::Rebind;

        trait Unit: Send + Sync {
            fn symbol(&self) -> &'static str;
        }
        struct Celsius;
        impl Unit for Celsius {
            fn symbol(&self) -> &'static str {
                "C"
            }
        }
        struct Kelvin;
        impl Unit for Kelvin {
            fn symbol(&self) -> &'static str {
                "K"
            }
        }
        struct Reading(i32);
        impl Abstraction<dyn Unit> for Reading {
            type Output = String;
            fn operation(&self, unit: &dyn Unit) -> Result<String, EngineError> {
                Ok(format!("{}{}", self.0, unit.symbol()))
            }
        }

        let hook = Arc::new(Counting::default());
        let context = EngineContext::default().with_hook(hook.clone());
        let reading = context.bridge(Reading(20), Arc::new(Celsius) as Arc<dyn Unit>);

        assert_eq!(reading.operation().unwrap(), "20C");
        reading.set_implementor(Arc::new(Kelvin)).unwrap();
        assert_eq!(reading.operation().unwrap(), "20K");
        assert_eq!(hook.rebinds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_logging_config_installs_hook() {
        let context = EngineContext::new(EngineConfig::default().with_logging(true));
        let lazy = context.lazy("x", |_: &&str| Ok(Leaf::new("x", ())));
        lazy.operation().unwrap();
        assert_eq!(context.config().context_name, "default");
    }
}
