//! # Derivation and combinator operators.
//!
//! Every operator follows one shape (see [`stage`]): upstreams watched
//! through anchors, a per-instance critical section, and a step yielding
//! zero-or-one outputs per keyed item.
//!
//! - Single upstream: `derive`/`map`/`filter`, `debounce`, `buffer` —
//!   exposed through [`ObservableExt`](crate::ObservableExt).
//! - Multi upstream: [`zip`], [`combine_latest`], [`merge`].
//! - Reconnectable binding: [`Connector`].

mod buffer;
mod combine;
mod connector;
mod debounce;
mod derive;
mod merge;
pub(crate) mod stage;
mod zip;

pub use combine::combine_latest;
pub use connector::{Connector, ConnectorState};
pub use merge::merge;
pub use stage::Derived;
pub use zip::zip;

pub(crate) use buffer::buffer;
pub(crate) use debounce::debounce;
pub(crate) use derive::derive;
