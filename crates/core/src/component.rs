//! # The Component Capability
//!
//! Every composable unit implements [`Component`]: leaves, composites,
//! decorators, bridges and lazy handles. A client holding a
//! `Box<dyn Component<Output = T>>` cannot tell which of them it has, which
//! is what lets wrapping and nesting compose freely:
//!
//! ```text
//!   CompositeNode "menu"
//!   ├── Decorator(+milk) ── LazyHandle ── Leaf "espresso"
//!   ├── Arc<Leaf "water">            (interned, shared)
//!   └── CompositeNode "desserts"
//!       └── Leaf "cake"
//! ```
//!
//! Beyond `operation()`, the trait carries a few structural hooks with
//! default implementations. Composites use `reaches`/`attach`/`detach` to
//! keep the graph a tree, and `boxed_clone` is the prototype capability.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chain::{Decorator, Increment};
use crate::error::EngineError;
use crate::trace::{AutoTraced, Traced};

/// An owned, type-erased component.
pub type BoxComponent<T> = Box<dyn Component<Output = T>>;

/// A shared, type-erased component (flyweights, parallel evaluation).
pub type SharedComponent<T> = Arc<dyn Component<Output = T>>;

// ============================================================================
// Node Identity
// ============================================================================

/// Process-unique identity of a composite node.
///
/// Identity survives moves but not clones: a cloned composite is a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// ============================================================================
// Component Trait
// ============================================================================

/// The shared capability of every composable unit.
///
/// Only [`Component::operation`] is required. The remaining methods have
/// defaults suitable for leaves.
pub trait Component: Send + Sync {
    /// The result type produced by `operation`.
    type Output: 'static;

    /// Compute this component's result.
    fn operation(&self) -> Result<Self::Output, EngineError>;

    /// Human-readable name, used in aggregates and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the composite identified by `id` is this component or is
    /// contained somewhere below it.
    fn reaches(&self, _id: NodeId) -> bool {
        false
    }

    /// Called when this component is linked under `parent`.
    ///
    /// Owned components cannot have two parents, so the default accepts.
    /// Shared handles override this to reject a second parent.
    fn attach(&self, _parent: NodeId) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called when this component is unlinked from its parent.
    fn detach(&self) {}

    /// Duplicate this component into an independent value graph.
    fn boxed_clone(&self) -> Result<BoxComponent<Self::Output>, EngineError> {
        Err(EngineError::unsupported("boxed_clone", self.name()))
    }
}

impl<C: Component + ?Sized> Component for Box<C> {
    type Output = C::Output;

    fn operation(&self) -> Result<Self::Output, EngineError> {
        (**self).operation()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn reaches(&self, id: NodeId) -> bool {
        (**self).reaches(id)
    }

    fn attach(&self, parent: NodeId) -> Result<(), EngineError> {
        (**self).attach(parent)
    }

    fn detach(&self) {
        (**self).detach()
    }

    fn boxed_clone(&self) -> Result<BoxComponent<Self::Output>, EngineError> {
        (**self).boxed_clone()
    }
}

/// Shared components delegate everything except cloning: a clone of an
/// `Arc` shares the interned instance, which is sound because shared
/// components are immutable through the `Component` interface.
impl<C: Component + ?Sized + 'static> Component for Arc<C> {
    type Output = C::Output;

    fn operation(&self) -> Result<Self::Output, EngineError> {
        (**self).operation()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn reaches(&self, id: NodeId) -> bool {
        (**self).reaches(id)
    }

    fn attach(&self, parent: NodeId) -> Result<(), EngineError> {
        (**self).attach(parent)
    }

    fn detach(&self) {
        (**self).detach()
    }

    fn boxed_clone(&self) -> Result<BoxComponent<Self::Output>, EngineError> {
        Ok(Box::new(Arc::clone(self)))
    }
}

// ============================================================================
// Leaf
// ============================================================================

/// A named leaf that always yields a copy of its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf<T> {
    name: String,
    value: T,
}

impl<T> Leaf<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Component for Leaf<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn operation(&self) -> Result<T, EngineError> {
        Ok(self.value.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn boxed_clone(&self) -> Result<BoxComponent<T>, EngineError> {
        Ok(Box::new(self.clone()))
    }
}

// ============================================================================
// Extension Trait
// ============================================================================

/// Convenience constructors available on every sized component.
pub trait ComponentExt: Component + Sized + 'static {
    /// Erase the concrete type into an owned component.
    fn boxed(self) -> BoxComponent<Self::Output> {
        Box::new(self)
    }

    /// Erase the concrete type into a shared component.
    fn shared(self) -> SharedComponent<Self::Output> {
        Arc::new(self)
    }

    /// Wrap this component with one decorator layer.
    fn decorate<I>(self, increment: I) -> Decorator<Self::Output>
    where
        I: Increment<Self::Output> + 'static,
    {
        Decorator::wrap(self.boxed(), Arc::new(increment))
    }

    /// Wrap this component with an increment that is shared with other chains.
    fn decorate_shared(self, increment: Arc<dyn Increment<Self::Output>>) -> Decorator<Self::Output> {
        Decorator::wrap(self.boxed(), increment)
    }

    /// Wrap with timing enabled.
    fn traced(self) -> Traced<Self, true> {
        Traced::new(self)
    }

    /// Wrap with timing compiled out.
    fn untraced(self) -> Traced<Self, false> {
        Traced::new(self)
    }

    /// Wrap with timing selected by build profile.
    fn auto_traced(self) -> AutoTraced<Self> {
        Traced::new(self)
    }
}

impl<C: Component + Sized + 'static> ComponentExt for C {}
