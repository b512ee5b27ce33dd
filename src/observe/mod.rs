//! # Subscription registry and dispatch core.
//!
//! This module provides the observer-facing surface of the crate: the
//! [`Observer`] trait, the [`Observable`]/[`ObservableValue`] capability
//! traits with their [`ObservableExt`] combinators, subscription handles,
//! and the per-instance registry that fans dispatched values out to
//! per-observer worker tasks.
//!
//! ## Architecture
//! ```text
//! Producer (Property::set / Dispatcher::dispatch_value)
//!     │
//!     ▼
//! Registry ── enqueue per matching entry ──► per-observer queue + worker
//!     │                                              │
//!     ├─ 0→1 / 1→0 entry transitions ─► LifecycleHook (stage promote/demote)
//!     └─ fault with no entries ─► process-wide sink
//! ```

mod observable;
mod observer;
mod options;
mod registry;
mod subscription;

pub use observable::{Observable, ObservableExt, ObservableValue};
pub use observer::{FnObserver, Observer};
pub use options::SubscribeOptions;
pub use subscription::Subscription;

pub(crate) use registry::{LifecycleHook, Registry};
