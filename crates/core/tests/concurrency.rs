//! Concurrency tests: single-flight construction and in-flight rebinding.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use composable_core::{
    evaluate_all, Abstraction, Bridge, Component, ComponentExt, ComponentRegistry, CompositeNode,
    EngineError, LazyHandle, Leaf, NodeId, Rebind, SharedComponent, SharedNode,
};

const THREADS: usize = 16;

fn slow_image(loads: Arc<AtomicUsize>) -> LazyHandle<String, Leaf<String>> {
    LazyHandle::new("big.png".to_string(), move |filename: &String| {
        loads.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(Leaf::new(filename.clone(), format!("Displaying {}", filename)))
    })
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn registry_single_flight_under_contention() {
    let registry: Arc<ComponentRegistry<&'static str, dyn Component<Output = String>>> =
        Arc::new(ComponentRegistry::new());
    let builds = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let builds = Arc::clone(&builds);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry
                    .get_or_create("news", || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok(Leaf::new("news", "news website".to_string()).shared())
                    })
                    .map_err(|e| e.to_string())
            })
        })
        .collect();

    let instances: Vec<SharedComponent<String>> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
    let stats = registry.stats();
    assert_eq!(stats.constructions, 1);
    assert_eq!(stats.hits as usize, THREADS - 1);
}

#[test]
fn registry_distinct_keys_build_independently() {
    let registry: Arc<ComponentRegistry<usize, Leaf<usize>>> = Arc::new(ComponentRegistry::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.intern(i % 4, || Leaf::new("slot", i % 4))
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 4);
    assert_eq!(registry.stats().constructions, 4);
}

// ============================================================================
// Lazy Handles
// ============================================================================

#[test]
fn lazy_builds_exactly_once_across_threads() {
    let loads = Arc::new(AtomicUsize::new(0));
    let image = Arc::new(slow_image(Arc::clone(&loads)));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let image = Arc::clone(&image);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                image.operation().map_err(|e| e.to_string())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), "Displaying big.png");
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lazy_builds_once_under_parallel_evaluation() {
    let loads = Arc::new(AtomicUsize::new(0));
    let image: SharedComponent<String> = Arc::new(slow_image(Arc::clone(&loads)));
    let components: Vec<SharedComponent<String>> = (0..8).map(|_| Arc::clone(&image)).collect();

    let results = evaluate_all(&components).await.unwrap();

    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r == "Displaying big.png"));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Bridge
// ============================================================================

trait Sender: Send + Sync {
    fn send(&self, message: &str) -> String;
}

/// Blocks inside `send` until the test lets it go.
struct Gated {
    entered: Barrier,
    release: Barrier,
}

impl Sender for Gated {
    fn send(&self, message: &str) -> String {
        self.entered.wait();
        self.release.wait();
        format!("normal: {}", message)
    }
}

struct Encrypted;

impl Sender for Encrypted {
    fn send(&self, message: &str) -> String {
        format!("encrypted: {}", message)
    }
}

struct Email;

impl Abstraction<dyn Sender> for Email {
    type Output = String;

    fn operation(&self, sender: &dyn Sender) -> Result<String, EngineError> {
        Ok(sender.send("meeting at 9"))
    }
}

#[test]
fn rebind_does_not_affect_in_flight_call() {
    let gated = Arc::new(Gated {
        entered: Barrier::new(2),
        release: Barrier::new(2),
    });
    let email = Arc::new(Bridge::new(Email, Arc::clone(&gated) as Arc<dyn Sender>));

    let in_flight = {
        let email = Arc::clone(&email);
        thread::spawn(move || email.operation().map_err(|e| e.to_string()))
    };

    // The first call is now parked inside the old implementor.
    gated.entered.wait();
    email.set_implementor(Arc::new(Encrypted)).unwrap();
    assert_eq!(email.operation().unwrap(), "encrypted: meeting at 9");

    gated.release.wait();
    assert_eq!(in_flight.join().unwrap().unwrap(), "normal: meeting at 9");
}

// ============================================================================
// Shared Composites
// ============================================================================

#[test]
fn shared_node_concurrent_adds_and_reads() {
    let node = SharedNode::new(CompositeNode::<String>::new("feed"));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let node = node.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                node.push(Leaf::new(format!("item{}", i), format!("item{}", i)))
                    .map_err(|e| e.to_string())?;
                node.operation().map_err(|e| e.to_string())
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
    assert_eq!(node.len(), THREADS);
}

/// A shared node whose subtree walk is slow, widening the window between
/// the walk and the insert.
struct SlowReach(SharedNode<String>);

impl Component for SlowReach {
    type Output = String;

    fn operation(&self) -> Result<String, EngineError> {
        self.0.operation()
    }

    fn name(&self) -> &str {
        self.0.name()
    }

    fn reaches(&self, id: NodeId) -> bool {
        thread::sleep(Duration::from_millis(50));
        self.0.reaches(id)
    }

    fn attach(&self, parent: NodeId) -> Result<(), EngineError> {
        self.0.attach(parent)
    }

    fn detach(&self) {
        self.0.detach()
    }
}

#[test]
fn crossed_shared_links_resolve_to_one_cycle() {
    let a = SharedNode::new(CompositeNode::<String>::new("a"));
    let b = SharedNode::new(CompositeNode::<String>::new("b"));
    let barrier = Arc::new(Barrier::new(2));
    let (tx, rx) = mpsc::channel();

    for (parent, child) in [(a.clone(), b.clone()), (b.clone(), a.clone())] {
        let barrier = Arc::clone(&barrier);
        let tx = tx.clone();
        thread::spawn(move || {
            barrier.wait();
            let _ = tx.send(parent.push(SlowReach(child)).map(|_| ()));
        });
    }

    let outcomes: Vec<Result<(), EngineError>> = (0..2)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, Err(EngineError::Cycle { .. }))));
    assert_eq!(a.len() + b.len(), 1);
    assert!(a.operation().is_ok());
    assert!(b.operation().is_ok());
}
