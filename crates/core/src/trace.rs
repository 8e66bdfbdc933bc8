//! # Zero-Cost Evaluation Timing
//!
//! [`Traced`] wraps any component and, when enabled, returns how long its
//! `operation()` took alongside the result. The switch is a const generic,
//! so a disabled wrapper compiles down to a plain delegation:
//!
//! - `Traced<C, false>`: output is `C::Output`, no timing code at all.
//! - `Traced<C, true>`: output is `(C::Output, TraceNode)`.
//!
//! [`AutoTraced`] picks one per build profile (`debug_assertions`).
//!
//! ```rust,ignore
//! let (price, trace) = Leaf::new("coffee", 2.0).decorate(AddCost(0.5)).traced().operation()?;
//! println!("{}", trace);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::component::{BoxComponent, Component, NodeId};
use crate::error::EngineError;

/// A node in a timing tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceNode {
    /// Name of the timed component
    pub name: String,
    /// Wall time spent in `operation()`
    pub duration: Duration,
    /// Timings of nested evaluations, if the caller records them
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TraceNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = TraceNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Indented, one line per node.
    pub fn display(&self) -> String {
        let mut out = String::new();
        self.render(0, &mut out);
        out
    }

    fn render(&self, indent: usize, out: &mut String) {
        out.push_str(&"  ".repeat(indent));
        out.push_str(&format!("[{:?}] {}\n", self.duration, self.name));
        for child in &self.children {
            child.render(indent + 1, out);
        }
    }
}

impl fmt::Display for TraceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// A component wrapper with compile-time switchable timing.
#[derive(Debug, Clone)]
pub struct Traced<C, const ENABLED: bool> {
    inner: C,
}

impl<C, const ENABLED: bool> Traced<C, ENABLED> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

// ============================================================================
// Timing Disabled
// ============================================================================

impl<C: Component> Component for Traced<C, false> {
    type Output = C::Output;

    fn operation(&self) -> Result<C::Output, EngineError> {
        self.inner.operation()
    }

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

    fn boxed_clone(&self) -> Result<BoxComponent<C::Output>, EngineError> {
        self.inner.boxed_clone()
    }
}

// ============================================================================
// Timing Enabled
// ============================================================================

impl<C: Component> Component for Traced<C, true> {
    type Output = (C::Output, TraceNode);

    fn operation(&self) -> Result<Self::Output, EngineError> {
        let start = Instant::now();
        let result = self.inner.operation()?;
        let trace = TraceNode::new(self.inner.name(), start.elapsed());
        Ok((result, trace))
    }

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

    fn boxed_clone(&self) -> Result<BoxComponent<Self::Output>, EngineError> {
        let inner = self.inner.boxed_clone()?;
        Ok(Box::new(Traced::<_, true>::new(inner)))
    }
}

/// Timing on in debug builds, compiled out in release builds.
#[cfg(debug_assertions)]
pub type AutoTraced<C> = Traced<C, true>;

/// Timing on in debug builds, compiled out in release builds.
#[cfg(not(debug_assertions))]
pub type AutoTraced<C> = Traced<C, false>;

// ============================================================================
// Tests
// ============================================================================
