//! # Derived-stage lifecycle.
//!
//! The machinery that lets an unconsumed pipeline stage be reclaimed while a
//! consumed one stays alive, without explicit teardown calls:
//!
//! - [`Anchor`](anchor::Anchor) — the weak relation + strong pin toggle held
//!   by a stage's upstream registrations.
//! - [`sweeper`] — the process-wide reaper bounding how long a dead stage's
//!   upstream registrations can linger.
//!
//! A stage is alive iff it is externally referenced OR it has at least one
//! downstream subscriber. Everything in here exists to make that invariant
//! hold under concurrent subscribe/unsubscribe/drop traffic.

pub(crate) mod anchor;
pub(crate) mod sweeper;

pub(crate) use anchor::{Anchor, AnchorControl};
