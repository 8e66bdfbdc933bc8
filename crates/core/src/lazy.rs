//! # Lazy Handles (Proxy)
//!
//! A [`LazyHandle`] stands in for a component that is expensive to build.
//! It holds only a descriptor until the first `operation()` call, then
//! builds the real component exactly once and delegates to it from then on.
//!
//! Construction goes through a [`OnceCell`]: the cached path is a lock-free
//! read, concurrent first callers block until a single builder finishes,
//! and a failed build leaves the handle empty so the next call retries.
//!
//! ## Structure
//!
//! A handle linked under a composite remembers that parent. Once built, the
//! real component is checked against it before it is cached: a component
//! that reaches the parent fails with [`EngineError::Cycle`], and a shared
//! node that already has another parent fails with
//! [`EngineError::AlreadyAttached`]. Either way nothing is cached. After the
//! build, `attach` and `detach` go straight to the real component.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::component::{BoxComponent, Component, NodeId};
use crate::error::EngineError;
use crate::hooks::{EngineHook, NullHook};

type Builder<D, C> = Arc<dyn Fn(&D) -> Result<C, EngineError> + Send + Sync>;

/// A component built on first use from a descriptor.
pub struct LazyHandle<D, C> {
    descriptor: Arc<D>,
    build: Builder<D, C>,
    cached: OnceCell<C>,
    parent: Mutex<Option<NodeId>>,
    hook: Arc<dyn EngineHook>,
}

impl<D, C> LazyHandle<D, C>
where
    D: fmt::Debug + Send + Sync,
    C: Component,
{
    /// Create an unbuilt handle. `build` runs at most once per handle.
    pub fn new<F>(descriptor: D, build: F) -> Self
    where
        F: Fn(&D) -> Result<C, EngineError> + Send + Sync + 'static,
    {
        Self::from_parts(Arc::new(descriptor), Arc::new(build), Arc::new(NullHook))
    }

    fn from_parts(descriptor: Arc<D>, build: Builder<D, C>, hook: Arc<dyn EngineHook>) -> Self {
        Self {
            descriptor,
            build,
            cached: OnceCell::new(),
            parent: Mutex::new(None),
            hook,
        }
    }

    /// Report construction to `hook`.
    pub fn with_hook(mut self, hook: Arc<dyn EngineHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn descriptor(&self) -> &D {
        &self.descriptor
    }

    pub fn is_initialized(&self) -> bool {
        self.cached.get().is_some()
    }

    /// The real component, if it has been built.
    pub fn get(&self) -> Option<&C> {
        self.cached.get()
    }

    /// Build the real component now if needed, without evaluating it.
    pub fn force(&self) -> Result<&C, EngineError> {
        if let Some(real) = self.cached.get() {
            self.hook.on_cache_hit(&self.descriptor);
            return Ok(real);
        }

        // Held until the result is cached, so a concurrent attach either
        // lands before the link check or finds the component built.
        let parent = self.parent.lock();
        let mut built = false;
        let real = self.cached.get_or_try_init(|| {
            built = true;
            self.hook.on_construct_start(&self.descriptor);
            let outcome = (self.build)(&self.descriptor).and_then(|real| {
                if let Some(parent) = *parent {
                    link(parent, &real)?;
                }
                Ok(real)
            });
            self.hook
                .on_construct_end(&self.descriptor, outcome.as_ref().map(|_| ()));
            outcome
        })?;
        if !built {
            self.hook.on_cache_hit(&self.descriptor);
        }
        Ok(real)
    }
}

/// Link a freshly built component under `parent`, as `CompositeNode::add`
/// would have done had it been built at the time.
fn link<C: Component>(parent: NodeId, real: &C) -> Result<(), EngineError> {
    if real.reaches(parent) {
        return Err(EngineError::Cycle {
            parent,
            child: real.name().to_string(),
        });
    }
    real.attach(parent)
}

impl<D, C> Component for LazyHandle<D, C>
where
    D: fmt::Debug + Send + Sync + 'static,
    C: Component + 'static,
{
    type Output = C::Output;

    fn operation(&self) -> Result<C::Output, EngineError> {
        self.force()?.operation()
    }

    fn name(&self) -> &str {
        match self.cached.get() {
            Some(real) => real.name(),
            None => "LazyHandle",
        }
    }

    fn reaches(&self, id: NodeId) -> bool {
        self.cached.get().map_or(false, |real| real.reaches(id))
    }

    fn attach(&self, parent: NodeId) -> Result<(), EngineError> {
        let mut slot = self.parent.lock();
        if let Some(real) = self.cached.get() {
            real.attach(parent)?;
        }
        *slot = Some(parent);
        Ok(())
    }

    fn detach(&self) {
        let mut slot = self.parent.lock();
        if let Some(real) = self.cached.get() {
            real.detach();
        }
        *slot = None;
    }

    /// A fresh, unbuilt handle sharing this one's descriptor and builder.
    fn boxed_clone(&self) -> Result<BoxComponent<C::Output>, EngineError> {
        Ok(Box::new(LazyHandle::from_parts(
            Arc::clone(&self.descriptor),
            Arc::clone(&self.build),
            Arc::clone(&self.hook),
        )))
    }
}

impl<D: fmt::Debug, C> fmt::Debug for LazyHandle<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyHandle")
            .field("descriptor", &self.descriptor)
            .field("initialized", &self.cached.get().is_some())
            .field("parent", &*self.parent.lock())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
