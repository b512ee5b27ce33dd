//! # liveprop
//!
//! **liveprop** is a reactive observable/property library for Rust.
//!
//! It provides live-updating values with a cached latest state, thread-safe
//! fan-out to subscribers, composable stream operators, and a blocking
//! await/retry bridge. The crate is designed as a building block for
//! monitoring and control applications with many producers and consumers of
//! live values.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Producers                       Consumers
//!   ─────────                      ──────────
//!   Property::set ─┐                  ┌─► observer worker ─► on_value()
//!   Dispatcher  ───┼─► SourceCore ────┼─► observer worker ─► on_value()
//!                  │   ├─ ValueCell   └─► observer worker ─► on_value()
//!                  │   │  (latest value, compare-and-retry commit)
//!                  │   └─ Registry
//!                  │      (identity-keyed entries, per-observer queues)
//!                  │
//!                  └─► derived stages (map/filter/derive, zip,
//!                      combine_latest, merge, debounce, buffer, Connector)
//!                           │
//!                           │ upstream registrations held via Anchor:
//!                           │   0→1 downstream subscribers → promote (pin)
//!                           │   1→0 downstream subscribers → demote
//!                           │   stage dropped → release + sweeper backstop
//!                           ▼
//!                      stage output core (same SourceCore machinery)
//!
//!   await_until / retry ──► poll loop ──► blocking, awaited, or detached
//!                                         (cancellable, memoized future)
//! ```
//!
//! ### Stage lifecycle
//! A derived stage subscribes upstream the moment it is constructed. The
//! upstream registration holds the stage through a weak relation plus a
//! strong pin that toggles with the stage's own subscriber count:
//!
//! - zero downstream subscribers — the stage lives only as long as some
//!   handle to it does; dropping the last handle tears its upstream
//!   registrations down;
//! - one or more downstream subscribers — the stage is pinned through the
//!   upstream registry and keeps flowing even with no external handles.
//!
//! A process-wide sweeper task reaps registrations whose stage is gone, and
//! any delivery that finds its stage gone unsubscribes on the spot.
//!
//! ## Features
//! | Area            | Description                                              | Key types / functions                        |
//! |-----------------|----------------------------------------------------------|----------------------------------------------|
//! | **Values**      | Settable/source-facing cached observable values.         | [`Property`], [`Dispatcher`], [`Transition`] |
//! | **Subscribing** | Observer callbacks, options, subscription handles.       | [`Observer`], [`SubscribeOptions`], [`Subscription`] |
//! | **Operators**   | Derivation and multi-source combinators.                 | [`ObservableExt`], [`zip`], [`combine_latest`], [`merge`], [`Connector`] |
//! | **Waiting**     | Poll-based await/retry with timeout and cancellation.    | [`await_until`], [`retry`], [`WaitHandle`]   |
//! | **Faults**      | Per-observer exception routing with a process-wide sink. | [`Fault`], [`sink`]                          |
//!
//! Deliveries, stage construction, and detached waits need a Tokio runtime;
//! value mutation and the blocking wait forms do not.
//!
//! ## Example
//! ```rust
//! use liveprop::{FnObserver, Observable, ObservableExt, Property, SubscribeOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let celsius = Property::with_value(21.5_f64);
//!     let fahrenheit = celsius.map(|c| c * 9.0 / 5.0 + 32.0);
//!
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!     let _subscription = fahrenheit.subscribe_with(
//!         FnObserver::arc(move |f: &f64| {
//!             let _ = tx.send(*f);
//!         }),
//!         SubscribeOptions::new().first_update(),
//!     );
//!
//!     celsius.set(25.0);
//!
//!     // Replay of the current value first, then the live update.
//!     assert_eq!(rx.recv().await, Some(21.5 * 9.0 / 5.0 + 32.0));
//!     assert_eq!(rx.recv().await, Some(77.0));
//! }
//! ```

mod error;
mod lifecycle;
mod observe;
mod operators;
mod ring;
mod value;
mod waiting;

pub mod sink;

// ---- Public re-exports ----

pub use error::{fault, AwaitError, Fault, PanicFault, StageError};
pub use observe::{
    FnObserver, Observable, ObservableExt, ObservableValue, Observer, SubscribeOptions,
    Subscription,
};
pub use operators::{combine_latest, merge, zip, Connector, ConnectorState, Derived};
pub use ring::RingBuffer;
pub use value::{Dispatcher, Property, Transition, Value};
pub use waiting::{await_until, retry, Await, Retry, SharedWait, WaitHandle};
