//! Bridge mode: an abstraction bound to an implementor by reference.
//!
//! Abstractions and implementors are two independent families. An
//! abstraction is written against an implementor *interface* `I` (usually a
//! `dyn Trait`), never against a concrete implementor, so a new implementor
//! needs no change to any abstraction and vice versa.
//!
//! ```ignore
//! trait Sender: Send + Sync {
//!     fn send(&self, message: &str, receiver: &str) -> String;
//! }
//!
//! struct EmailMessage { receiver: String }
//!
//! impl Abstraction<dyn Sender> for EmailMessage {
//!     type Output = String;
//!     fn operation(&self, sender: &dyn Sender) -> Result<String, EngineError> {
//!         Ok(sender.send("meeting at 9", &self.receiver))
//!     }
//! }
//!
//! let email = Bridge::new(EmailMessage { .. }, Arc::new(NormalSender) as Arc<dyn Sender>);
//! email.set_implementor(Arc::new(EncryptedSender))?;
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::chain::Decorator;
use crate::component::{BoxComponent, Component};
use crate::error::EngineError;
use crate::hooks::{EngineHook, NullHook};

/// The high-level side of a bridge.
pub trait Abstraction<I: ?Sized>: Send + Sync {
    type Output: 'static;

    /// Carry out the abstraction's operation through `implementor`.
    fn operation(&self, implementor: &I) -> Result<Self::Output, EngineError>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Rebinding the implementor of a delegation chain.
pub trait Rebind<I: ?Sized> {
    /// Replace the implementor. Calls already in flight finish against the
    /// implementor they started with; the next call uses the new one.
    fn set_implementor(&self, implementor: Arc<I>) -> Result<(), EngineError>;
}

/// An abstraction bound to a swappable, shared implementor.
pub struct Bridge<A, I: ?Sized> {
    abstraction: Arc<A>,
    implementor: RwLock<Arc<I>>,
    hook: Arc<dyn EngineHook>,
}

impl<A, I> Bridge<A, I>
where
    A: Abstraction<I>,
    I: ?Sized + Send + Sync,
{
    pub fn new(abstraction: A, implementor: Arc<I>) -> Self {
        Self {
            abstraction: Arc::new(abstraction),
            implementor: RwLock::new(implementor),
            hook: Arc::new(NullHook),
        }
    }

    /// Report rebinds to `hook`.
    pub fn with_hook(mut self, hook: Arc<dyn EngineHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn abstraction(&self) -> &A {
        &self.abstraction
    }

    /// The implementor the next call will use.
    pub fn implementor(&self) -> Arc<I> {
        Arc::clone(&self.implementor.read())
    }
}

impl<A, I> Component for Bridge<A, I>
where
    A: Abstraction<I> + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    type Output = A::Output;

    fn operation(&self) -> Result<A::Output, EngineError> {
        // Snapshot so a concurrent rebind cannot switch implementors mid-call.
        let implementor = self.implementor();
        Abstraction::<I>::operation(self.abstraction.as_ref(), &implementor)
    }

    fn name(&self) -> &str {
        Abstraction::<I>::name(self.abstraction.as_ref())
    }

    /// The clone shares the abstraction and the current implementor, but
    /// rebinding one afterwards does not affect the other.
    fn boxed_clone(&self) -> Result<BoxComponent<A::Output>, EngineError> {
        Ok(Box::new(Bridge {
            abstraction: Arc::clone(&self.abstraction),
            implementor: RwLock::new(self.implementor()),
            hook: Arc::clone(&self.hook),
        }))
    }
}

impl<A, I> Rebind<I> for Bridge<A, I>
where
    A: Abstraction<I>,
    I: ?Sized + Send + Sync,
{
    fn set_implementor(&self, implementor: Arc<I>) -> Result<(), EngineError> {
        *self.implementor.write() = implementor;
        self.hook
            .on_rebind(Abstraction::<I>::name(self.abstraction.as_ref()));
        Ok(())
    }
}

/// A pure decorator has no implementor to rebind.
impl<T: 'static, I: ?Sized> Rebind<I> for Decorator<T> {
    fn set_implementor(&self, _implementor: Arc<I>) -> Result<(), EngineError> {
        Err(EngineError::unsupported("set_implementor", self.name()))
    }
}

impl<A, I: ?Sized> fmt::Debug for Bridge<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("abstraction", &std::any::type_name::<A>())
            .field("implementor", &std::any::type_name::<I>())
            .finish()
    }
}
