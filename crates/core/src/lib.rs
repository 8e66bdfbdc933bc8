//! # Composable Core - Behavior Composition Engine
//!
//! Building blocks for assembling behavior out of smaller components at
//! runtime, through association instead of inheritance:
//!
//! - **Components**: the shared [`Component`] capability and [`Leaf`] values
//! - **Composites**: ordered trees of children with cycle rejection
//! - **Delegation chains**: stacked [`Decorator`]s and rebindable [`Bridge`]s
//! - **Registry**: flyweight pooling with single-flight construction
//! - **Lazy handles**: proxies that build their component on first use
//! - **Parallel**: concurrent evaluation of shared subtrees on tokio
//! - **Tracing**: compile-time switchable evaluation timing
//! - **Context**: configuration, hooks and process-wide singletons
//!
//! ## Example
//!
//! ```rust,ignore
//! use composable_core::{AddCost, Component, ComponentExt, CompositeNode, FnCombiner, Leaf};
//!
//! let coffee = Leaf::new("coffee", 2.0).decorate(AddCost(0.5)).decorate(AddCost(0.2));
//! let mut order = CompositeNode::with_combiner("order", FnCombiner::new(|_: &str, v: Vec<f64>| v.iter().sum()));
//! order.push(coffee)?;
//! assert_eq!(order.operation()?, 2.7);
//! ```
//!
//! Every fallible operation returns [`EngineError`]; the engine never panics
//! or logs on its own. Install an [`EngineHook`] to observe it.

pub mod chain;
pub mod component;
pub mod composite;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod lazy;
pub mod parallel;
pub mod registry;
pub mod trace;

// Re-export key types at crate root for convenience
pub use chain::{Abstraction, AddCost, Append, Bridge, Decorator, FnIncrement, Increment, Rebind};
pub use component::{BoxComponent, Component, ComponentExt, Leaf, NodeId, SharedComponent};
pub use composite::{Aggregate, Aggregated, ChildId, Combiner, CompositeNode, ConcatWith, FnCombiner, SharedNode};
pub use config::EngineConfig;
pub use context::EngineContext;
pub use error::EngineError;
pub use hooks::{CompositeHook, EngineHook, LoggingHook, NullHook};
pub use lazy::LazyHandle;
pub use parallel::{evaluate_all, ParallelSet};
pub use registry::{ComponentRegistry, RegistryStats};
pub use trace::{AutoTraced, TraceNode, Traced};
