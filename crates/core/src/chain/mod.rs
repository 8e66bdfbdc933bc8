//! # Delegation Chains
//!
//! Two ways of building a component out of another one by association
//! rather than inheritance:
//!
//! - [`Decorator`]: wraps one owned inner component and transforms its
//!   result with an [`Increment`]. Layers stack; the outermost increment is
//!   applied last.
//! - [`Bridge`]: binds an [`Abstraction`] to an independently varying
//!   implementor held by shared reference. The implementor can be swapped at
//!   any time through [`Rebind`].
//!
//! ```text
//!   Decorator(+0.2) ─▶ Decorator(+0.5) ─▶ Leaf(2.0)        = 2.7
//!
//!   Bridge ── abstraction: EmailMessage
//!          └─ implementor: Arc<dyn Sender>  ◀── set_implementor(...)
//! ```

mod bridge;
mod decorator;

pub use bridge::{Abstraction, Bridge, Rebind};
pub use decorator::{AddCost, Append, Decorator, FnIncrement, Increment};
