//! Operators that turn a [`Publisher`](crate::Publisher) into one of the
//! terminal shapes.
//!
//! All of them subscribe upstream through the same terminal adapter, which:
//!
//! - wraps the upstream subscription in a
//!   [`ConcurrentSubscription`](crate::ConcurrentSubscription), because the
//!   downstream may cancel from any thread while the upstream is emitting;
//! - hands the downstream only the cancel half of that subscription;
//! - requests demand on behalf of the downstream, which cannot request;
//! - feeds elements to an [`Accumulator`] and turns the upstream terminal
//!   signal into the downstream one.
//!
//! Once the downstream cancelled, no terminal signal reaches it.
mod pub_to_completable;
mod pub_to_single;
mod terminal;

pub use pub_to_completable::*;
pub use pub_to_single::*;

pub(crate) use terminal::{TerminalAdapter, TerminalSink};

use std::{ops::ControlFlow, sync::Arc};

use crate::subscription::UNBOUNDED;

/// Folds the elements of a stream into the value of the terminal signal.
pub trait Accumulator<T>: Send {
    type Output: Send;

    /// Demand requested from upstream on subscribe.
    fn initial_demand(&self) -> i64 {
        UNBOUNDED
    }

    /// Consumes one element. Returning `Break` cancels the upstream and
    /// terminates right away.
    fn accept(&mut self, item: T) -> ControlFlow<()>;

    /// Produces the value delivered on success.
    fn finish(self) -> Self::Output;
}

/// Drops every element.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl<T> Accumulator<T> for Discard {
    type Output = ();

    fn accept(&mut self, _: T) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn finish(self) {}
}

/// Left fold over the elements.
pub struct Reducer<R, F> {
    acc: Option<R>,
    f: Arc<F>,
}

impl<R, F> Reducer<R, F> {
    pub fn new(seed: R, f: Arc<F>) -> Self {
        Reducer { acc: Some(seed), f }
    }
}

impl<T, R, F> Accumulator<T> for Reducer<R, F>
where
    R: Send,
    F: Fn(R, T) -> R + Send + Sync,
{
    type Output = R;

    fn accept(&mut self, item: T) -> ControlFlow<()> {
        // Only empty if `f` panicked, and then no more elements arrive.
        if let Some(acc) = self.acc.take() {
            self.acc = Some((self.f)(acc, item));
        }
        ControlFlow::Continue(())
    }

    fn finish(self) -> R {
        match self.acc {
            Some(acc) => acc,
            None => unreachable!("reducer finished after its function panicked"),
        }
    }
}

/// Keeps the first element and stops.
pub struct FirstValue<T>(Option<T>);

impl<T> Default for FirstValue<T> {
    fn default() -> Self {
        FirstValue(None)
    }
}

impl<T: Send> Accumulator<T> for FirstValue<T> {
    type Output = Option<T>;

    fn initial_demand(&self) -> i64 {
        1
    }

    fn accept(&mut self, item: T) -> ControlFlow<()> {
        self.0 = Some(item);
        ControlFlow::Break(())
    }

    fn finish(self) -> Option<T> {
        self.0
    }
}
