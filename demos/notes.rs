// Examples are allowed to use expect/unwrap for simplicity
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::unnecessary_debug_formatting
)]

//! Loading-window walkthrough
//!
//! Demonstrates the race a latency wrap eliminates: a notes controller
//! answers `create` in ~5ms, far too fast for a test to observe the
//! client's loading state. With a one-second wrap installed, a probe at
//! t=200ms sees the request still in flight; after restore, the handler
//! is back to its original speed and binding.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example notes
//!
//! # With harness tracing
//! RUST_LOG=demora=debug cargo run --example notes
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use demora::{async_handler_fn, HandlerTable, LatencySession};

#[derive(Debug, Clone)]
struct NoteResponse {
    status: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let notes: Arc<HandlerTable<String, NoteResponse>> = Arc::new(HandlerTable::new("notes"));
    notes
        .register(
            "create",
            async_handler_fn(|body: String| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                println!("[HANDLER] create({body:?}) processed");
                NoteResponse {
                    status: "ok".to_string(),
                }
            }),
        )
        .expect("register create");

    // Without the harness: the response beats any assertion.
    let start = Instant::now();
    let response = notes
        .dispatch("create", "buy milk".to_string())
        .await
        .expect("dispatch");
    println!(
        "[BASELINE] create -> {} in {:?} (loading state unobservable)",
        response.status,
        start.elapsed()
    );

    // Before hook: install a one-second wrap.
    let session = LatencySession::new();
    session.install(&notes, "create").expect("install latency");
    println!("[INSTALL] create wrapped with {:?}", session.default_delay());

    let loading = Arc::new(AtomicBool::new(false));
    let client = {
        let notes = Arc::clone(&notes);
        let loading = Arc::clone(&loading);
        tokio::spawn(async move {
            loading.store(true, Ordering::SeqCst);
            let response = notes.dispatch("create", "buy milk".to_string()).await;
            loading.store(false, Ordering::SeqCst);
            response
        })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    println!(
        "[PROBE t=200ms] loading indicator present: {}",
        loading.load(Ordering::SeqCst)
    );

    let start = Instant::now();
    let response = client.await.expect("client task").expect("dispatch");
    println!(
        "[WRAPPED] create -> {} (joined after {:?})",
        response.status,
        start.elapsed()
    );

    // After hook: restore the original binding.
    session.restore_all().expect("restore latency");
    let start = Instant::now();
    let response = notes
        .dispatch("create", "buy milk".to_string())
        .await
        .expect("dispatch");
    println!(
        "[RESTORED] create -> {} in {:?}",
        response.status,
        start.elapsed()
    );
}
