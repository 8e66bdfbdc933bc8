//! Decorator mode: augment the result of a single inner component.

use std::fmt;
use std::sync::Arc;

use crate::component::{BoxComponent, Component, NodeId};
use crate::error::EngineError;

// ============================================================================
// Increment
// ============================================================================

/// The behavior one decorator layer adds on top of its inner result.
///
/// Increments are held behind `Arc`, so the same increment object can be
/// reused by any number of independent chains.
pub trait Increment<T>: Send + Sync {
    /// Transform the inner result.
    fn apply(&self, value: T) -> Result<T, EngineError>;

    /// Short label for diagnostics.
    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Appends a suffix to a textual result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Append {
    suffix: String,
}

impl Append {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Increment<String> for Append {
    fn apply(&self, mut value: String) -> Result<String, EngineError> {
        value.push_str(&self.suffix);
        Ok(value)
    }

    fn label(&self) -> &str {
        &self.suffix
    }
}

/// Adds a fixed amount to a numeric result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AddCost(pub f64);

impl Increment<f64> for AddCost {
    fn apply(&self, value: f64) -> Result<f64, EngineError> {
        Ok(value + self.0)
    }

    fn label(&self) -> &str {
        "add-cost"
    }
}

/// An increment defined by a closure.
pub struct FnIncrement<F> {
    label: String,
    f: F,
}

impl<F> FnIncrement<F> {
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<T, F> Increment<T> for FnIncrement<F>
where
    F: Fn(T) -> Result<T, EngineError> + Send + Sync,
{
    fn apply(&self, value: T) -> Result<T, EngineError> {
        (self.f)(value)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl<F> fmt::Debug for FnIncrement<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnIncrement")
            .field("label", &self.label)
            .finish()
    }
}

// ============================================================================
// Decorator
// ============================================================================

/// One decorator layer: `increment(inner.operation())`.
///
/// Construction is O(1); evaluation walks the whole chain, so it costs
/// O(depth). Once built, a decorator is immutable.
pub struct Decorator<T: 'static> {
    inner: BoxComponent<T>,
    increment: Arc<dyn Increment<T>>,
}

impl<T: 'static> Decorator<T> {
    /// Wrap `inner` with one more layer.
    pub fn wrap(inner: BoxComponent<T>, increment: Arc<dyn Increment<T>>) -> Self {
        Self { inner, increment }
    }

    /// The wrapped component.
    pub fn inner(&self) -> &dyn Component<Output = T> {
        self.inner.as_ref()
    }

    /// The increment applied by this layer.
    pub fn increment(&self) -> &Arc<dyn Increment<T>> {
        &self.increment
    }

    /// Unwrap one layer.
    pub fn into_inner(self) -> BoxComponent<T> {
        self.inner
    }
}

impl<T: 'static> Component for Decorator<T> {
    type Output = T;

    fn operation(&self) -> Result<T, EngineError> {
        let value = self.inner.operation()?;
        self.increment.apply(value)
    }

    /// Decorators are transparent: they report the name of what they wrap.
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn reaches(&self, id: NodeId) -> bool {
        self.inner.reaches(id)
    }

    fn attach(&self, parent: NodeId) -> Result<(), EngineError> {
        self.inner.attach(parent)
    }

    fn detach(&self) {
        self.inner.detach()
    }

    /// Deep-clones the inner chain; the increment is shared.
    fn boxed_clone(&self) -> Result<BoxComponent<T>, EngineError> {
        Ok(Box::new(Decorator {
            inner: self.inner.boxed_clone()?,
            increment: Arc::clone(&self.increment),
        }))
    }
}

impl<T: 'static> fmt::Debug for Decorator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator")
            .field("inner", &self.inner.name())
            .field("increment", &self.increment.label())
            .finish()
    }
}
