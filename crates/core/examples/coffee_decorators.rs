//! Decorator Chains
//!
//! Run with: cargo run -p composable-core --example coffee_decorators
//!
//! This example demonstrates:
//! - Stacking cost decorators (applied innermost first)
//! - Reusing one increment object across several chains
//! - Custom increments from closures
//! - Timing a chain with `traced()`

use std::sync::Arc;

use composable_core::{
    AddCost, Append, Component, ComponentExt, EngineError, FnIncrement, Increment, Leaf,
};

fn main() -> Result<(), EngineError> {
    println!("=== Decorator Chains ===\n");

    // -------------------------------------------------------------------------
    // 1. Cost
    // -------------------------------------------------------------------------
    println!("1. Cost");
    println!("-------");

    let coffee = Leaf::new("coffee", 2.0)
        .decorate(AddCost(0.5)) // milk
        .decorate(AddCost(0.2)); // sugar
    println!("coffee + milk + sugar = {:.2}\n", coffee.operation()?);

    // -------------------------------------------------------------------------
    // 2. Description, with a shared increment
    // -------------------------------------------------------------------------
    println!("2. Description");
    println!("--------------");

    let milk: Arc<dyn Increment<String>> = Arc::new(Append::new(", milk"));

    let latte = Leaf::new("latte", "Simple coffee".to_string())
        .decorate_shared(Arc::clone(&milk))
        .decorate(Append::new(", sugar"));
    let flat_white = Leaf::new("flat white", "Double espresso".to_string())
        .decorate_shared(Arc::clone(&milk));

    println!("{}", latte.operation()?);
    println!("{}", flat_white.operation()?);
    println!("'milk' increment is used by {} chains\n", Arc::strong_count(&milk) - 1);

    // -------------------------------------------------------------------------
    // 3. Custom increments
    // -------------------------------------------------------------------------
    println!("3. Custom increments");
    println!("--------------------");

    let happy_hour = FnIncrement::new("happy hour", |price: f64| -> Result<f64, EngineError> {
        Ok(price * 0.5)
    });
    let discounted = Leaf::new("coffee", 2.0)
        .decorate(AddCost(0.5))
        .decorate(happy_hour);
    println!("(2.00 + 0.50) * 0.5 = {:.2}", discounted.operation()?);

    let cap = FnIncrement::new("cap", |price: f64| {
        if price > 10.0 {
            Err(EngineError::evaluation("order", "price above cap"))
        } else {
            Ok(price)
        }
    });
    let luxury = Leaf::new("gold flakes", 25.0).decorate(cap);
    match luxury.operation() {
        Ok(price) => println!("luxury: {:.2}\n", price),
        Err(e) => println!("luxury: {}\n", e),
    }

    // -------------------------------------------------------------------------
    // 4. Timing
    // -------------------------------------------------------------------------
    println!("4. Timing");
    println!("---------");

    let (price, trace) = coffee.traced().operation()?;
    println!("price {:.2}", price);
    print!("{}", trace);

    Ok(())
}
