extern crate lumen_macros;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lumen::errors::Error;
use lumen::utils::task;

#[lumen_macros::runtime]
async fn example_runtime_function() {
    println!("Running example runtime function");
}

#[lumen_macros::runtime]
async fn example_runtime_with_result() -> Result<u8, Error> {
    Ok(42)
}

#[lumen_macros::test]
async fn example_test_function() {
    println!("Running example test function");
}

#[lumen_macros::test]
async fn test_runtime_waits_for_spawned_tasks() {
    let flag = Arc::new(AtomicBool::new(false));
    let moved_flag = flag.clone();
    task::run(async move {
        lumen::pause!(50);
        moved_flag.store(true, Ordering::SeqCst);
    })
    .unwrap();
    assert!(!flag.load(Ordering::SeqCst));
    lumen::pause!(100);
    assert!(flag.load(Ordering::SeqCst));
}

#[test]
fn test_runtime_macro() {
    assert_eq!(example_runtime_function(), ());
}

#[test]
fn test_runtime_macro_with_result() {
    assert_eq!(example_runtime_with_result().unwrap(), 42);
}
