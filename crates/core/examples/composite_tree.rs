//! Composite Trees
//!
//! Run with: cargo run -p composable-core --example composite_tree
//!
//! This example demonstrates:
//! - Nesting composites inside composites
//! - Removing children by id and by name
//! - Cycle and double-parent rejection with shared nodes
//! - JSON aggregation of the same tree shape

use composable_core::{
    BoxComponent, Component, ComponentExt, CompositeNode, EngineError, Leaf, SharedNode,
};

fn leaf(name: &str) -> BoxComponent<String> {
    Leaf::new(name, format!("Leaf {} operation", name)).boxed()
}

fn main() -> Result<(), EngineError> {
    println!("=== Composite Trees ===\n");

    // -------------------------------------------------------------------------
    // 1. Nesting
    // -------------------------------------------------------------------------
    println!("1. Nesting");
    println!("----------");

    let mut composite1 = CompositeNode::new("Composite1");
    composite1.add(leaf("Leaf1"))?;
    let leaf2 = composite1.add(leaf("Leaf2"))?;

    let mut composite2 = CompositeNode::new("Composite2");
    composite2.add(leaf("Leaf3"))?;

    println!("{}", composite1.operation()?);
    composite1.remove(leaf2)?;
    println!("after removing Leaf2: {}", composite1.operation()?);

    composite2.add(composite1.boxed())?;
    println!("{}\n", composite2.operation()?);

    // -------------------------------------------------------------------------
    // 2. Structural errors
    // -------------------------------------------------------------------------
    println!("2. Structural errors");
    println!("--------------------");

    let outer = SharedNode::new(CompositeNode::<String>::new("outer"));
    let inner = SharedNode::new(CompositeNode::<String>::new("inner"));
    outer.add(inner.clone().boxed())?;

    match inner.add(outer.clone().boxed()) {
        Err(e) => println!("link outer under inner: {}", e),
        Ok(_) => println!("unexpected: cycle accepted"),
    }

    let mut other = CompositeNode::new("other");
    match other.add(inner.clone().boxed()) {
        Err(e) => println!("link inner under other: {}", e),
        Ok(_) => println!("unexpected: second parent accepted"),
    }

    match composite2.remove_named("ghost") {
        Err(e) => println!("remove ghost: {}\n", e),
        Ok(_) => println!("unexpected: ghost removed\n"),
    }

    // -------------------------------------------------------------------------
    // 3. JSON aggregation
    // -------------------------------------------------------------------------
    println!("3. JSON aggregation");
    println!("-------------------");

    let mut drinks = CompositeNode::new("drinks");
    drinks.push(Leaf::new("tea", serde_json::json!("tea")))?;
    drinks.push(Leaf::new("coffee", serde_json::json!("coffee")))?;

    let mut menu = CompositeNode::new("menu");
    menu.push(drinks)?;
    menu.push(Leaf::new("cake", serde_json::json!("cake")))?;

    let json = menu.operation()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json).map_err(|e| EngineError::evaluation("menu", e))?
    );

    Ok(())
}
