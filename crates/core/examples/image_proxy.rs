//! Lazy Handles
//!
//! Run with: cargo run -p composable-core --example image_proxy
//!
//! A gallery holds proxies for images that are expensive to load. Nothing
//! is loaded until the gallery is first displayed, and each image loads
//! once no matter how many concurrent displays race for it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use composable_core::{
    Component, CompositeNode, ConcatWith, EngineError, LazyHandle, Leaf, ParallelSet,
    SharedComponent,
};

/// What we know about an image before loading it.
#[derive(Debug)]
struct ImageFile {
    path: String,
    size_kb: u32,
}

fn image(path: &str, size_kb: u32, loads: &Arc<AtomicUsize>) -> LazyHandle<ImageFile, Leaf<String>> {
    let loads = Arc::clone(loads);
    LazyHandle::new(
        ImageFile {
            path: path.to_string(),
            size_kb,
        },
        move |file: &ImageFile| {
            loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(u64::from(file.size_kb / 100)));
            Ok(Leaf::new(
                file.path.clone(),
                format!("Displaying {} ({} KB)", file.path, file.size_kb),
            ))
        },
    )
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    println!("=== Lazy Handles ===\n");

    let loads = Arc::new(AtomicUsize::new(0));

    let beach = image("beach.jpg", 2400, &loads);
    println!("before display: initialized = {}, name = {}", beach.is_initialized(), beach.name());
    println!("descriptor: {:?}", beach.descriptor());

    let mut gallery = CompositeNode::with_combiner("gallery", ConcatWith::new("\n  "));
    gallery.push(beach)?;
    gallery.push(image("forest.png", 1800, &loads))?;
    println!("loads before display: {}\n", loads.load(Ordering::SeqCst));

    println!("{}", gallery.operation()?);
    println!("{}", gallery.operation()?);
    println!("loads after two displays: {}\n", loads.load(Ordering::SeqCst));

    // Four concurrent viewers share one unloaded proxy.
    let poster: SharedComponent<String> = Arc::new(image("poster.tiff", 900, &loads));
    let viewers = (0..4).fold(ParallelSet::new(), |set, _| set.with(Arc::clone(&poster)));
    let shown = viewers.evaluate_all().await?;
    println!("{} viewers saw: {}", shown.len(), shown[0]);
    println!("total loads: {}", loads.load(Ordering::SeqCst));

    Ok(())
}
