//! Engine Context and Logging
//!
//! Run with: RUST_LOG=debug cargo run -p composable-core --example engine_context
//!
//! This example demonstrates:
//! - Loading an `EngineConfig` from JSON
//! - Construction and rebind events logged through `tracing`
//! - Process-wide singletons from the context

use std::sync::Arc;

use composable_core::{
    Abstraction, Component, ComponentRegistry, EngineConfig, EngineContext, EngineError, Leaf,
    Rebind,
};
use tracing_subscriber::EnvFilter;

struct Pricing {
    currency: &'static str,
}

trait Unit: Send + Sync {
    fn format(&self, value: f64) -> String;
}

struct Celsius;

impl Unit for Celsius {
    fn format(&self, value: f64) -> String {
        format!("{:.1} °C", value)
    }
}

struct Fahrenheit;

impl Unit for Fahrenheit {
    fn format(&self, value: f64) -> String {
        format!("{:.1} °F", value * 9.0 / 5.0 + 32.0)
    }
}

struct Thermometer {
    reading: f64,
}

impl Abstraction<dyn Unit> for Thermometer {
    type Output = String;

    fn operation(&self, unit: &dyn Unit) -> Result<String, EngineError> {
        Ok(unit.format(self.reading))
    }

    fn name(&self) -> &str {
        "Thermometer"
    }
}

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let config = EngineConfig::from_json(
        r#"{ "context_name": "cafe", "log_constructions": true, "verbose": true }"#,
    )?;
    let context = EngineContext::new(config);
    println!("context: {:?}", context);

    let pricing = context.instance(|| Ok(Pricing { currency: "EUR" }))?;
    let again = context.instance::<Pricing, _>(|| Ok(Pricing { currency: "USD" }))?;
    println!(
        "pricing singleton: {} (same instance: {})",
        again.currency,
        Arc::ptr_eq(&pricing, &again)
    );

    let menu: ComponentRegistry<&str, Leaf<f64>> = context.registry();
    menu.intern("espresso", || Leaf::new("espresso", 2.0));
    menu.intern("espresso", || Leaf::new("espresso", 2.0));
    println!("menu stats: {:?}", menu.stats());

    let thermometer = context.bridge(Thermometer { reading: 21.5 }, Arc::new(Celsius) as Arc<dyn Unit>);
    println!("{}", thermometer.operation()?);
    thermometer.set_implementor(Arc::new(Fahrenheit))?;
    println!("{}", thermometer.operation()?);

    match EngineConfig::from_json("{ not json") {
        Ok(_) => println!("unexpected: bad config accepted"),
        Err(e) => println!("bad config: {}", e),
    }

    Ok(())
}
