//! Flyweight Registry
//!
//! Run with: cargo run -p composable-core --example website_flyweight
//!
//! This example demonstrates:
//! - One canonical instance per website kind
//! - Concurrent first requests building each kind once
//! - Registry statistics

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use composable_core::{
    Component, ComponentExt, ComponentRegistry, EngineError, Leaf, SharedComponent,
};

type WebsiteRegistry = ComponentRegistry<String, dyn Component<Output = String>>;

fn website(kind: &str, builds: &AtomicUsize) -> Result<SharedComponent<String>, EngineError> {
    builds.fetch_add(1, Ordering::SeqCst);
    // Simulate loading templates.
    thread::sleep(Duration::from_millis(10));
    Ok(Leaf::new(kind, format!("Website type: {}", kind)).shared())
}

fn main() -> Result<(), EngineError> {
    println!("=== Flyweight Registry ===\n");

    let registry = Arc::new(WebsiteRegistry::new());
    let builds = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = ["news", "blog", "news", "shop", "blog", "news"]
        .into_iter()
        .enumerate()
        .map(|(user, kind)| {
            let registry = Arc::clone(&registry);
            let builds = Arc::clone(&builds);
            thread::spawn(move || {
                let site = registry.get_or_create(kind.to_string(), || website(kind, &builds))?;
                Ok::<_, EngineError>(format!("user {} -> {}", user, site.operation()?))
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok(line) => println!("{}", line?),
            Err(_) => return Err(EngineError::TaskFailed {
                reason: "user thread panicked".into(),
            }),
        }
    }

    let news1 = registry.get_or_create("news".into(), || website("news", &builds))?;
    let news2 = registry.get_or_create("news".into(), || website("news", &builds))?;
    println!("\nsame news instance: {}", Arc::ptr_eq(&news1, &news2));
    println!("websites built: {}", builds.load(Ordering::SeqCst));

    let stats = registry.stats();
    println!(
        "stats: {}",
        serde_json::to_string(&stats).map_err(|e| EngineError::evaluation("stats", e))?
    );

    Ok(())
}
