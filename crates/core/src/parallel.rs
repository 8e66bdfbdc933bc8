//! # Parallel Evaluation
//!
//! Shared components are `Send + Sync`, so independent subtrees can be
//! evaluated concurrently. [`ParallelSet`] fans a group of components out
//! onto tokio's blocking pool (`operation()` is synchronous) and collects
//! the results back in insertion order:
//!
//! ```text
//!            ┌──────────────┐
//!      ┌─────│ news website │─────┐
//!      │     └──────────────┘     │    ┌──────────┐
//!  evaluate_all                   ├────│ Combiner │──── T
//!      │     ┌──────────────┐     │    └──────────┘
//!      └─────│ blog website │─────┘
//!            └──────────────┘
//! ```
//!
//! Registries and lazy handles are safe to hit from every task at once;
//! their single-flight construction still builds each instance once.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::component::{Component, SharedComponent};
use crate::composite::Combiner;
use crate::error::EngineError;

/// A group of shared components evaluated concurrently.
pub struct ParallelSet<T> {
    components: Vec<SharedComponent<T>>,
}

impl<T> Clone for ParallelSet<T> {
    fn clone(&self) -> Self {
        Self {
            components: self.components.clone(),
        }
    }
}

impl<T: Send + 'static> ParallelSet<T> {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Add a component to the group.
    pub fn with(mut self, component: SharedComponent<T>) -> Self {
        self.components.push(component);
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Concatenate two groups, keeping `self`'s members first.
    pub fn tensor(mut self, mut other: Self) -> Self {
        self.components.append(&mut other.components);
        self
    }

    /// Evaluate every member concurrently. Results are in insertion order.
    ///
    /// The first failure in insertion order is returned. A panicking
    /// `operation()` surfaces as [`EngineError::TaskFailed`].
    pub async fn evaluate_all(&self) -> Result<Vec<T>, EngineError> {
        evaluate_all(&self.components).await
    }

    /// Evaluate concurrently, then fold the ordered results with `combiner`.
    pub async fn evaluate_combined(
        &self,
        name: &str,
        combiner: &dyn Combiner<T>,
    ) -> Result<T, EngineError> {
        let results = self.evaluate_all().await?;
        Ok(combiner.combine(name, results))
    }
}

impl<T: Send + 'static> Default for ParallelSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate `components` concurrently, returning results in input order.
pub async fn evaluate_all<T>(components: &[SharedComponent<T>]) -> Result<Vec<T>, EngineError>
where
    T: Send + 'static,
{
    let handles: Vec<JoinHandle<Result<T, EngineError>>> = components
        .iter()
        .map(|component| {
            let component = Arc::clone(component);
            tokio::task::spawn_blocking(move || component.operation())
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await.map_err(|e| EngineError::TaskFailed {
            reason: e.to_string(),
        })?;
        results.push(result?);
    }
    Ok(results)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::FnIncrement;
    use crate::component::{ComponentExt, Leaf};
    use crate::composite::ConcatWith;
    use std::time::Duration;

    struct Sleepy {
        delay: Duration,
        value: u32,
    }

    impl Component for Sleepy {
        type Output = u32;

        fn operation(&self) -> Result<u32, EngineError> {
            std::thread::sleep(self.delay);
            Ok(self.value)
        }
    }

    struct Panics;

    impl Component for Panics {
        type Output = u32;

        fn operation(&self) -> Result<u32, EngineError> {
            panic!("component blew up")
        }
    }

    #[tokio::test]
    async fn test_results_in_insertion_order() {
        let set = ParallelSet::new()
            .with(
                Sleepy {
                    delay: Duration::from_millis(40),
                    value: 1,
                }
                .shared(),
            )
            .with(
                Sleepy {
                    delay: Duration::from_millis(0),
                    value: 2,
                }
                .shared(),
            )
            .with(Leaf::new("three", 3u32).shared());

        assert_eq!(set.evaluate_all().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_set() {
        let set: ParallelSet<u32> = ParallelSet::default();
        assert!(set.is_empty());
        assert!(set.evaluate_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let reject = FnIncrement::new("reject", |_: u32| -> Result<u32, EngineError> {
            Err(EngineError::evaluation("ok", "bad input"))
        });
        let failing = Leaf::new("ok", 1u32).decorate(reject).shared();
        let set = ParallelSet::new()
            .with(Leaf::new("a", 0u32).shared())
            .with(failing);

        assert!(matches!(
            set.evaluate_all().await,
            Err(EngineError::Evaluation { .. })
        ));
    }

    #[tokio::test]
    async fn test_panic_becomes_task_failed() {
        let set = ParallelSet::new().with(Panics.shared());
        assert!(matches!(
            set.evaluate_all().await,
            Err(EngineError::TaskFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_tensor_and_combine() {
        let left = ParallelSet::new().with(Leaf::new("a", "a".to_string()).shared());
        let right = ParallelSet::new().with(Leaf::new("b", "b".to_string()).shared());
        let both = left.tensor(right);

        assert_eq!(both.len(), 2);
        let combined = both
            .evaluate_combined("pair", &ConcatWith::new("+"))
            .await
            .unwrap();
        assert_eq!(combined, "pair: a+b");
    }
}
