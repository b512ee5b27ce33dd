//! # Await/retry: bridging push-based updates into synchronous code.
//!
//! A builder-style, poll-based wait:
//! - [`await_until`] waits on a boolean predicate;
//! - [`retry`] waits on a producer and returns the unwrapped value.
//!
//! Both configure an interval (default 100 ms; zero yields instead of
//! spinning), a retry budget, and a diagnostic message, then run in one of
//! three forms: awaited on the caller's task, blocking a plain thread, or
//! detached as a cancellable [`WaitHandle`] on the shared runtime.
//!
//! ## Architecture
//! ```text
//! await_until(pred) / retry(producer)
//!     .with_retry_interval(..)  .with_retry_count(..)  .with_message(..)
//!         │
//!         ├─ .indefinitely().await / .at_most(d).await      (caller's task)
//!         ├─ .block_indefinitely() / .block_at_most(d)      (plain thread)
//!         └─ .spawn() / .spawn_at_most(d) ──► WaitHandle    (detached)
//!                                               ├─ future()  (memoized)
//!                                               └─ cancel()  (≤ 1 interval)
//! ```

mod awaiting;
mod handle;
mod poll;
mod retrying;

pub use awaiting::{await_until, Await};
pub use handle::{SharedWait, WaitHandle};
pub use retrying::{retry, Retry};
