//! The `completable` module provides the element-less source shape.
//!
//! A [`Completable`] only ever delivers `on_subscribe` followed by one
//! terminal signal. Its subscribers receive a [`Cancellable`](crate::Cancellable)
//! instead of a full subscription since there is no demand to signal.
mod timer;

pub use timer::*;

use std::sync::Arc;

use crate::errors::Cause;
use crate::future::CompletableFuture;
use crate::subscriber::{
    deliver_completable_error,
    guard::{run_guarded, GuardedCompletableSubscriber, SignalFlag},
    BoxCompletableSubscriber, CompletableSubscriber,
};
use crate::subscription::EmptySubscription;

/// Source of a single terminal signal.
pub trait Completable: Send + Sync {
    /// Called once per subscribe. Must deliver `on_subscribe`, then exactly
    /// one of `on_complete`/`on_error` unless cancelled first.
    fn handle_subscribe(&self, subscriber: BoxCompletableSubscriber);
}

impl<C: Completable + ?Sized> Completable for Arc<C> {
    fn handle_subscribe(&self, subscriber: BoxCompletableSubscriber) {
        (**self).handle_subscribe(subscriber);
    }
}

impl<C: Completable + ?Sized> Completable for Box<C> {
    fn handle_subscribe(&self, subscriber: BoxCompletableSubscriber) {
        (**self).handle_subscribe(subscriber);
    }
}

/// Extension methods available on every [`Completable`].
pub trait CompletableExt: Completable {
    /// Subscribes `subscriber`, guarding the signal order the same way as
    /// [`PublisherExt::subscribe`](crate::PublisherExt::subscribe).
    fn subscribe<S>(&self, subscriber: S)
    where
        S: CompletableSubscriber + 'static,
    {
        let in_signal = SignalFlag::default();
        let guarded = GuardedCompletableSubscriber::new(Box::new(subscriber), in_signal.clone());
        run_guarded("completable", &in_signal, || {
            self.handle_subscribe(Box::new(guarded));
        });
    }

    /// Subscribes and returns a future resolving with the terminal signal.
    ///
    /// Dropping the future cancels the subscription.
    fn into_future(self) -> CompletableFuture
    where
        Self: Sized,
    {
        CompletableFuture::subscribe(&self)
    }
}

impl<C: Completable + ?Sized> CompletableExt for C {}

/// Completable that completes right after `on_subscribe`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Completed;

/// Creates a completable that completes immediately.
pub fn completed() -> Completed {
    Completed
}

impl Completable for Completed {
    fn handle_subscribe(&self, mut subscriber: BoxCompletableSubscriber) {
        subscriber.on_subscribe(Arc::new(EmptySubscription));
        subscriber.on_complete();
    }
}

/// Completable that fails every subscriber with the same cause.
pub struct Failed {
    cause: Cause,
}

/// Creates a completable terminating with `cause`.
pub fn failed(cause: Cause) -> Failed {
    Failed { cause }
}

impl Completable for Failed {
    fn handle_subscribe(&self, mut subscriber: BoxCompletableSubscriber) {
        deliver_completable_error(subscriber.as_mut(), Arc::clone(&self.cause));
    }
}

/// Completable that never terminates.
#[derive(Debug, Default, Clone, Copy)]
pub struct Never;

/// Creates a completable that never terminates.
pub fn never() -> Never {
    Never
}

impl Completable for Never {
    fn handle_subscribe(&self, mut subscriber: BoxCompletableSubscriber) {
        subscriber.on_subscribe(Arc::new(EmptySubscription));
    }
}

/// Completable defined by a subscribe function.
pub struct FromFn<F> {
    subscribe_fn: F,
}

/// Creates a [`FromFn`] completable.
pub fn from_fn<F>(subscribe_fn: F) -> FromFn<F>
where
    F: Fn(BoxCompletableSubscriber) + Send + Sync + 'static,
{
    FromFn { subscribe_fn }
}

impl<F> Completable for FromFn<F>
where
    F: Fn(BoxCompletableSubscriber) + Send + Sync + 'static,
{
    fn handle_subscribe(&self, subscriber: BoxCompletableSubscriber) {
        (self.subscribe_fn)(subscriber);
    }
}
