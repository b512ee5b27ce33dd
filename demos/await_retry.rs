//! Await/retry bridging: block on a property reaching a target value, then
//! cancel a detached wait that would never finish.
//!
//! Run with: `cargo run --example await_retry`

use std::time::Duration;

use liveprop::{await_until, retry, ObservableValue, Property};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let progress = Property::with_value(0_u32);

    // A producer task pushing updates.
    let writer = progress.clone();
    tokio::spawn(async move {
        for step in 1..=5 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            writer.set(step * 20);
        }
    });

    // Retry form: poll the cached value until it is complete.
    let finished = retry(move || {
        progress
            .get()
            .filter(|percent| **percent >= 100)
            .map(|percent| *percent)
    })
    .with_retry_interval(Duration::from_millis(20))
    .with_message("progress never completed")
    .at_most(Duration::from_secs(5))
    .await
    .expect("progress completes");
    println!("finished at {finished}%");

    // Detached form: cancel a wait that would never be satisfied.
    let stuck = await_until(|| false)
        .with_retry_interval(Duration::from_millis(25))
        .spawn();
    stuck.cancel();
    match stuck.outcome().await {
        Err(err) => println!("detached wait ended: {}", err.as_label()),
        Ok(()) => unreachable!("the predicate is never satisfied"),
    }
}
