//! Property tests for composition invariants.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use composable_core::{
    AddCost, Append, Component, ComponentExt, ComponentRegistry, CompositeNode, ConcatWith,
    EngineError, Increment, Leaf, SharedNode,
};
use proptest::prelude::*;

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}", 0..12)
}

fn concat_node(names: &[String]) -> CompositeNode<String> {
    let mut node = CompositeNode::with_combiner("root", ConcatWith::new(","));
    for name in names {
        node.push(Leaf::new(name.as_str(), name.clone())).unwrap();
    }
    node
}

proptest! {
    /// A composite's result lists its children in insertion order.
    #[test]
    fn composite_preserves_insertion_order(names in arb_names()) {
        let node = concat_node(&names);
        prop_assert_eq!(node.operation().unwrap(), format!("root: {}", names.join(",")));
        prop_assert_eq!(node.len(), names.len());
    }

    /// Adding a child and removing it again restores the original result.
    #[test]
    fn add_then_remove_is_identity(names in arb_names(), extra in "[A-Z]{1,8}") {
        let mut node = concat_node(&names);
        let before = node.operation().unwrap();

        let id = node.push(Leaf::new(extra.as_str(), extra.clone())).unwrap();
        let removed = node.remove(id).unwrap();

        prop_assert_eq!(removed.name(), extra.as_str());
        prop_assert_eq!(node.operation().unwrap(), before);
    }

    /// Removing an absent child fails and changes nothing.
    #[test]
    fn remove_missing_leaves_node_unchanged(names in arb_names()) {
        let mut node = concat_node(&names);
        let before = node.child_names().join(",");

        let err = node.remove_named("MISSING").err();
        let not_found = matches!(err, Some(EngineError::NotFound { .. }));
        prop_assert!(not_found);
        prop_assert_eq!(node.child_names().join(","), before);
    }

    /// Stacked cost decorators add up, innermost first.
    #[test]
    fn cost_decorators_accumulate(base in -1000i32..1000, costs in prop::collection::vec(0i32..100, 0..10)) {
        let base = f64::from(base);
        let mut chain = Leaf::new("base", base).boxed();
        for cost in &costs {
            chain = chain.decorate(AddCost(f64::from(*cost))).boxed();
        }

        let expected = costs.iter().fold(base, |total, cost| total + f64::from(*cost));
        prop_assert_eq!(chain.operation().unwrap(), expected);
    }

    /// Reusing increment objects across independent chains changes nothing.
    #[test]
    fn shared_increments_give_same_totals(chains in 1usize..6, costs in prop::collection::vec(0i32..100, 0..6)) {
        let increments: Vec<Arc<dyn Increment<f64>>> = costs
            .iter()
            .map(|cost| Arc::new(AddCost(f64::from(*cost))) as Arc<dyn Increment<f64>>)
            .collect();
        let expected = costs.iter().fold(2.0, |total, cost| total + f64::from(*cost));

        for _ in 0..chains {
            let chain = increments
                .iter()
                .fold(Leaf::new("coffee", 2.0).boxed(), |inner, increment| {
                    inner.decorate_shared(Arc::clone(increment)).boxed()
                });
            prop_assert_eq!(chain.operation().unwrap(), expected);
        }
        for increment in &increments {
            prop_assert_eq!(Arc::strong_count(increment), 1);
        }
    }

    /// Text decorators apply outermost last.
    #[test]
    fn append_decorators_apply_in_wrap_order(suffixes in prop::collection::vec("[a-z]{1,4}", 0..8)) {
        let mut chain = Leaf::new("base", "base".to_string()).boxed();
        for suffix in &suffixes {
            chain = chain.decorate(Append::new(suffix.clone())).boxed();
        }
        prop_assert_eq!(chain.operation().unwrap(), format!("base{}", suffixes.concat()));
        prop_assert_eq!(chain.name(), "base");
    }

    /// A registry constructs exactly once per distinct key.
    #[test]
    fn registry_constructs_once_per_key(keys in prop::collection::vec(0u8..16, 1..40)) {
        let registry: ComponentRegistry<u8, Leaf<u8>> = ComponentRegistry::new();
        let builds = AtomicUsize::new(0);

        let instances: Vec<Arc<Leaf<u8>>> = keys
            .iter()
            .map(|key| {
                registry.intern(*key, || {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Leaf::new(key.to_string(), *key)
                })
            })
            .collect();

        let distinct: HashSet<u8> = keys.iter().copied().collect();
        prop_assert_eq!(builds.load(Ordering::SeqCst), distinct.len());
        prop_assert_eq!(registry.len(), distinct.len());

        for (i, a) in instances.iter().enumerate() {
            for (j, b) in instances.iter().enumerate() {
                prop_assert_eq!(Arc::ptr_eq(a, b), keys[i] == keys[j]);
            }
        }
    }

    /// Linking any ancestor under its descendant is rejected.
    #[test]
    fn ancestor_under_descendant_is_cycle(depth in 1usize..6, target in 0usize..6) {
        let chain: Vec<SharedNode<String>> = (0..=depth)
            .map(|i| SharedNode::new(CompositeNode::new(format!("level{}", i))))
            .collect();
        for pair in chain.windows(2) {
            pair[0].add(pair[1].clone().boxed()).unwrap();
        }

        let ancestor = &chain[target.min(depth)];
        let deepest = &chain[depth];
        let before = deepest.len();

        let err = deepest.add(ancestor.clone().boxed()).unwrap_err();
        let is_cycle = matches!(err, EngineError::Cycle { .. });
        prop_assert!(is_cycle);
        prop_assert_eq!(deepest.len(), before);
    }
}
