//! # Subscription options.
//!
//! [`SubscribeOptions`] is an immutable flag set fixed at subscribe time.
//! A plain `Copy` struct with builder-style setters; implementations ignore
//! flags they do not support.

/// Options fixed at subscribe time.
///
/// - `first_update`: replay the currently cached value (if any) as an
///   immediate synthetic update, delivered off the calling thread but
///   guaranteed to precede any later dispatched update.
/// - `on_change`: skip deliveries whose old and new value are equal.
/// - `weak`: hold the observer weakly; the registration is removed once the
///   observer is dropped elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Replay the cached value on subscribe.
    pub first_update: bool,
    /// Deliver only distinct consecutive values.
    pub on_change: bool,
    /// Hold the observer weakly.
    pub weak: bool,
}

impl SubscribeOptions {
    /// Returns the empty option set (every update, strong observer, no replay).
    pub const fn new() -> Self {
        Self {
            first_update: false,
            on_change: false,
            weak: false,
        }
    }

    /// Enables the cached-value replay on subscribe.
    ///
    /// # Example
    /// ```
    /// use liveprop::SubscribeOptions;
    ///
    /// let opts = SubscribeOptions::new().first_update();
    /// assert!(opts.first_update && !opts.on_change);
    /// ```
    pub const fn first_update(mut self) -> Self {
        self.first_update = true;
        self
    }

    /// Restricts deliveries to distinct consecutive values.
    pub const fn on_change(mut self) -> Self {
        self.on_change = true;
        self
    }

    /// Holds the observer weakly.
    pub const fn weak(mut self) -> Self {
        self.weak = true;
        self
    }
}
