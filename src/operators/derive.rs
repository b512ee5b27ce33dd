//! # Single-upstream derivation.
//!
//! `derive` is the primitive: a partial mapping emitting `f(item)` when
//! present and nothing when absent. `map` and `filter` are expressed in
//! terms of it (see [`ObservableExt`](crate::ObservableExt)).
//!
//! A panic inside the step is caught and redirected to the stage's own
//! fault channel, never rethrown into the source's dispatch.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::error::{self, Fault};
use crate::lifecycle::Anchor;
use crate::observe::Observable;
use crate::operators::stage::{watch, Derived, StageAccess, StageShell, StageSink};
use crate::value::Value;

pub(crate) struct DeriveStage<I, O> {
    shell: StageShell<O>,
    step: Box<dyn Fn(&I) -> Option<O> + Send + Sync>,
}

impl<I: Value, O: Value> StageSink<I> for DeriveStage<I, O> {
    fn accept(&self, _key: usize, value: &I) {
        match std::panic::catch_unwind(AssertUnwindSafe(|| (self.step)(value))) {
            Ok(Some(output)) => {
                self.shell.core().publish(output);
            }
            Ok(None) => {}
            Err(payload) => self.shell.core().raise(error::panic_fault(payload)),
        }
    }

    fn accept_fault(&self, _key: usize, fault: Fault) {
        self.shell.core().raise(fault);
    }
}

impl<I: Value, O: Value> StageAccess<O> for DeriveStage<I, O> {
    fn shell(&self) -> &StageShell<O> {
        &self.shell
    }
}

pub(crate) fn derive<I, O, F, U>(upstream: &U, f: F) -> Derived<O>
where
    I: Value,
    O: Value,
    F: Fn(&I) -> Option<O> + Send + Sync + 'static,
    U: Observable<I> + ?Sized,
{
    let stage = Arc::new(DeriveStage {
        shell: StageShell::new(),
        step: Box::new(f),
    });
    let anchor = Anchor::new(&stage);
    stage.shell.bind(&anchor);
    watch(upstream, &anchor, 0).expect("freshly constructed stage cannot be reclaimed");
    Derived { inner: stage }
}
