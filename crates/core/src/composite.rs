//! # Composite Nodes
//!
//! A [`CompositeNode`] is an ordered aggregate of owned children. Its
//! `operation()` evaluates every child in insertion order and folds the
//! ordered results, together with the node's own name, through a
//! [`Combiner`].
//!
//! ## Keeping the graph a tree
//!
//! Owned children (`Box<dyn Component>`) can only ever have one parent and
//! can never contain the node they are added to. Cycles and double parents
//! only become expressible through [`SharedNode`], a lockable handle to a
//! composite that callers keep after linking it. `add` therefore:
//!
//! 1. walks the candidate's subtree and rejects it if this node is reachable
//!    from it ([`EngineError::Cycle`]);
//! 2. asks the candidate to attach to this node, which a shared handle
//!    refuses if it already has a parent ([`EngineError::AlreadyAttached`]).
//!
//! A rejected child is dropped; callers linking shared handles keep their
//! own clone of the handle.
//!
//! Linking under a [`SharedNode`] holds one process-wide link lock for the
//! walk and the insert, and never holds the node's own lock during the walk.
//! Concurrent links therefore see each other's edges, and crossed links
//! (`a.add(b)` racing `b.add(a)`) end with one `Cycle` instead of a
//! deadlock.
//!
//! ## Aggregation
//!
//! | Combiner | Result |
//! |----------|--------|
//! | [`Aggregated`] | `T::aggregate(name, results)` via [`Aggregate`] |
//! | [`ConcatWith`] | `"name: a<sep>b<sep>c"` |
//! | [`FnCombiner`] | any closure |

use std::fmt;
use std::sync::Arc;

use parking_lot::{const_mutex, Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::component::{BoxComponent, Component, NodeId};
use crate::error::EngineError;

// ============================================================================
// Combiners
// ============================================================================

/// Folds a composite's ordered child results into the composite's result.
pub trait Combiner<T>: Send + Sync {
    /// Combine results, given in child insertion order.
    fn combine(&self, name: &str, results: Vec<T>) -> T;
}

/// Result types that know how to embed a node name and ordered children.
pub trait Aggregate: Sized {
    fn aggregate(name: &str, children: Vec<Self>) -> Self;
}

impl Aggregate for String {
    fn aggregate(name: &str, children: Vec<Self>) -> Self {
        format!("Composite {} operation: {}", name, children.join(", "))
    }
}

impl Aggregate for serde_json::Value {
    fn aggregate(name: &str, children: Vec<Self>) -> Self {
        serde_json::json!({ "name": name, "children": children })
    }
}

/// The default combiner: defers to [`Aggregate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregated;

impl<T: Aggregate> Combiner<T> for Aggregated {
    fn combine(&self, name: &str, results: Vec<T>) -> T {
        T::aggregate(name, results)
    }
}

/// Concatenate string results with a custom separator.
#[derive(Debug, Clone)]
pub struct ConcatWith {
    separator: String,
}

impl ConcatWith {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Combiner<String> for ConcatWith {
    fn combine(&self, name: &str, results: Vec<String>) -> String {
        format!("{}: {}", name, results.join(&self.separator))
    }
}

/// Combine results using a custom function.
pub struct FnCombiner<F> {
    f: F,
}

impl<F> FnCombiner<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> Combiner<T> for FnCombiner<F>
where
    F: Fn(&str, Vec<T>) -> T + Send + Sync,
{
    fn combine(&self, name: &str, results: Vec<T>) -> T {
        (self.f)(name, results)
    }
}

// ============================================================================
// Child Identity
// ============================================================================

/// Identifies one linked child within its composite.
///
/// Returned by [`CompositeNode::add`]; pass it back to
/// [`CompositeNode::remove`] to unlink the same child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChildId(u64);

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "child#{}", self.0)
    }
}

// ============================================================================
// CompositeNode
// ============================================================================

/// An ordered aggregate of owned child components.
pub struct CompositeNode<T: 'static> {
    id: NodeId,
    name: String,
    children: Vec<(ChildId, BoxComponent<T>)>,
    next_child: u64,
    combiner: Arc<dyn Combiner<T>>,
}

impl<T: Aggregate + 'static> CompositeNode<T> {
    /// An empty composite aggregating with [`Aggregated`].
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_combiner(name, Aggregated)
    }

    /// A composite pre-populated with `children`, in order.
    pub fn with_children<I>(name: impl Into<String>, children: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = BoxComponent<T>>,
    {
        let mut node = Self::new(name);
        for child in children {
            node.add(child)?;
        }
        Ok(node)
    }
}

impl<T: 'static> CompositeNode<T> {
    /// An empty composite aggregating with `combiner`.
    pub fn with_combiner(name: impl Into<String>, combiner: impl Combiner<T> + 'static) -> Self {
        Self::from_parts(name.into(), Arc::new(combiner))
    }

    fn from_parts(name: String, combiner: Arc<dyn Combiner<T>>) -> Self {
        Self {
            id: NodeId::next(),
            name,
            children: Vec::new(),
            next_child: 0,
            combiner,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append `child` after the existing children.
    ///
    /// Fails with [`EngineError::Cycle`] if this node is reachable from
    /// `child`, and with [`EngineError::AlreadyAttached`] if `child` is a
    /// shared node that already has a parent.
    pub fn add(&mut self, child: BoxComponent<T>) -> Result<ChildId, EngineError> {
        admit(self.id, child.as_ref())?;
        Ok(self.insert(child))
    }

    /// Append an already admitted child.
    fn insert(&mut self, child: BoxComponent<T>) -> ChildId {
        let id = ChildId(self.next_child);
        self.next_child += 1;
        self.children.push((id, child));
        id
    }

    /// Box and append a concrete component.
    pub fn push<C>(&mut self, child: C) -> Result<ChildId, EngineError>
    where
        C: Component<Output = T> + 'static,
    {
        self.add(Box::new(child))
    }

    /// Unlink the child identified by `id` and hand it back.
    pub fn remove(&mut self, id: ChildId) -> Result<BoxComponent<T>, EngineError> {
        let index = self
            .children
            .iter()
            .position(|(child_id, _)| *child_id == id)
            .ok_or_else(|| EngineError::NotFound {
                parent: self.name.clone(),
                target: id.to_string(),
            })?;
        Ok(self.unlink(index))
    }

    /// Unlink the first child (in insertion order) named `name`.
    pub fn remove_named(&mut self, name: &str) -> Result<BoxComponent<T>, EngineError> {
        let index = self
            .children
            .iter()
            .position(|(_, child)| child.name() == name)
            .ok_or_else(|| EngineError::NotFound {
                parent: self.name.clone(),
                target: name.to_string(),
            })?;
        Ok(self.unlink(index))
    }

    fn unlink(&mut self, index: usize) -> BoxComponent<T> {
        let (_, child) = self.children.remove(index);
        child.detach();
        child
    }

    pub fn child_ids(&self) -> Vec<ChildId> {
        self.children.iter().map(|(id, _)| *id).collect()
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|(_, child)| child.name()).collect()
    }

    /// Iterate over the children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Component<Output = T>> + '_ {
        self.children.iter().map(|(_, child)| child.as_ref())
    }

    /// Deep copy with a fresh identity. Child ids are preserved so they
    /// still address the corresponding children of the copy.
    pub fn deep_clone(&self) -> Result<Self, EngineError> {
        let mut copy = Self::from_parts(self.name.clone(), Arc::clone(&self.combiner));
        copy.next_child = self.next_child;
        for (id, child) in &self.children {
            let cloned = child.boxed_clone()?;
            cloned.attach(copy.id)?;
            copy.children.push((*id, cloned));
        }
        Ok(copy)
    }
}

impl<T: 'static> Component for CompositeNode<T> {
    type Output = T;

    fn operation(&self) -> Result<T, EngineError> {
        let results = self
            .children
            .iter()
            .map(|(_, child)| child.operation())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.combiner.combine(&self.name, results))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn reaches(&self, id: NodeId) -> bool {
        self.id == id || self.children.iter().any(|(_, child)| child.reaches(id))
    }

    fn boxed_clone(&self) -> Result<BoxComponent<T>, EngineError> {
        Ok(Box::new(self.deep_clone()?))
    }
}

impl<T: 'static> Drop for CompositeNode<T> {
    fn drop(&mut self) {
        for (_, child) in &self.children {
            child.detach();
        }
    }
}

impl<T: 'static> fmt::Debug for CompositeNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field(
                "children",
                &self
                    .children
                    .iter()
                    .map(|(_, child)| child.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Reject `child` if it would close a cycle under `parent`, then attach it.
fn admit<T: 'static>(parent: NodeId, child: &dyn Component<Output = T>) -> Result<(), EngineError> {
    if child.reaches(parent) {
        return Err(EngineError::Cycle {
            parent,
            child: child.name().to_string(),
        });
    }
    child.attach(parent)
}

// ============================================================================
// SharedNode
// ============================================================================

/// Serializes links under shared nodes.
static LINKS: Mutex<()> = const_mutex(());

struct SharedInner<T: 'static> {
    id: NodeId,
    name: String,
    parent: Mutex<Option<NodeId>>,
    node: RwLock<CompositeNode<T>>,
}

/// A cloneable, lockable handle to a composite.
///
/// Clones of the handle address the same node, so a subtree can keep being
/// mutated after it has been linked under a parent. A shared node accepts
/// at most one parent at a time.
pub struct SharedNode<T: 'static> {
    inner: Arc<SharedInner<T>>,
}

impl<T: 'static> Clone for SharedNode<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> SharedNode<T> {
    pub fn new(node: CompositeNode<T>) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                id: node.id(),
                name: node.name().to_string(),
                parent: Mutex::new(None),
                node: RwLock::new(node),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// The node this handle is currently linked under.
    pub fn parent(&self) -> Option<NodeId> {
        *self.inner.parent.lock()
    }

    /// See [`CompositeNode::add`].
    pub fn add(&self, child: BoxComponent<T>) -> Result<ChildId, EngineError> {
        let _links = LINKS.lock();
        admit(self.inner.id, child.as_ref())?;
        Ok(self.inner.node.write().insert(child))
    }

    pub fn push<C>(&self, child: C) -> Result<ChildId, EngineError>
    where
        C: Component<Output = T> + 'static,
    {
        self.add(Box::new(child))
    }

    pub fn remove(&self, id: ChildId) -> Result<BoxComponent<T>, EngineError> {
        self.inner.node.write().remove(id)
    }

    pub fn remove_named(&self, name: &str) -> Result<BoxComponent<T>, EngineError> {
        self.inner.node.write().remove_named(name)
    }

    pub fn len(&self) -> usize {
        self.inner.node.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node.read().is_empty()
    }

    /// Run `f` with read access to the underlying node.
    pub fn with<R>(&self, f: impl FnOnce(&CompositeNode<T>) -> R) -> R {
        f(&self.inner.node.read())
    }
}

impl<T: 'static> Component for SharedNode<T> {
    type Output = T;

    fn operation(&self) -> Result<T, EngineError> {
        self.inner.node.read().operation()
    }

    fn name(&self) -> &str {
        &self.inner.name
    }

    fn reaches(&self, id: NodeId) -> bool {
        self.inner.id == id || self.inner.node.read().reaches(id)
    }

    fn attach(&self, parent: NodeId) -> Result<(), EngineError> {
        let mut slot = self.inner.parent.lock();
        match *slot {
            Some(existing) => Err(EngineError::AlreadyAttached {
                child: self.inner.id,
                parent: existing,
            }),
            None => {
                *slot = Some(parent);
                Ok(())
            }
        }
    }

    fn detach(&self) {
        *self.inner.parent.lock() = None;
    }

    /// Deep-copies the node into a new, unattached shared node.
    fn boxed_clone(&self) -> Result<BoxComponent<T>, EngineError> {
        let copy = self.inner.node.read().deep_clone()?;
        Ok(Box::new(SharedNode::new(copy)))
    }
}

impl<T: 'static> fmt::Debug for SharedNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedNode")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &*self.inner.parent.lock())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
