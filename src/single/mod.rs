//! The `single` module provides the one-value source shape.
//!
//! A [`Single`] terminates with either `on_success(value)` or `on_error`.
//! It is what the element-aggregating operators of
//! [`PublisherExt`](crate::PublisherExt) produce.
use std::sync::Arc;

use crate::errors::Cause;
use crate::future::SingleFuture;
use crate::subscriber::{
    deliver_single_error,
    guard::{run_guarded, GuardedSingleSubscriber, SignalFlag},
    BoxSingleSubscriber, SingleSubscriber,
};
use crate::subscription::EmptySubscription;

/// Source of exactly one value or one error.
pub trait Single: Send + Sync {
    type Output: Send + 'static;

    /// Called once per subscribe. Must deliver `on_subscribe`, then exactly
    /// one of `on_success`/`on_error` unless cancelled first.
    fn handle_subscribe(&self, subscriber: BoxSingleSubscriber<Self::Output>);
}

impl<S: Single + ?Sized> Single for Arc<S> {
    type Output = S::Output;

    fn handle_subscribe(&self, subscriber: BoxSingleSubscriber<Self::Output>) {
        (**self).handle_subscribe(subscriber);
    }
}

impl<S: Single + ?Sized> Single for Box<S> {
    type Output = S::Output;

    fn handle_subscribe(&self, subscriber: BoxSingleSubscriber<Self::Output>) {
        (**self).handle_subscribe(subscriber);
    }
}

/// Extension methods available on every [`Single`].
pub trait SingleExt: Single {
    /// Subscribes `subscriber` behind the protocol guard.
    fn subscribe<S>(&self, subscriber: S)
    where
        S: SingleSubscriber<Self::Output> + 'static,
    {
        let in_signal = SignalFlag::default();
        let guarded = GuardedSingleSubscriber::new(Box::new(subscriber), in_signal.clone());
        run_guarded("single", &in_signal, || {
            self.handle_subscribe(Box::new(guarded));
        });
    }

    /// Subscribes and returns a future resolving with the value or the error.
    ///
    /// Dropping the future cancels the subscription.
    fn into_future(self) -> SingleFuture<Self::Output>
    where
        Self: Sized,
    {
        SingleFuture::subscribe(&self)
    }
}

impl<S: Single + ?Sized> SingleExt for S {}

/// Single that succeeds with a clone of the same value for every subscriber.
#[derive(Debug, Clone)]
pub struct Succeeded<T> {
    value: T,
}

/// Creates a single emitting `value`.
pub fn succeeded<T: Clone + Send + Sync + 'static>(value: T) -> Succeeded<T> {
    Succeeded { value }
}

impl<T: Clone + Send + Sync + 'static> Single for Succeeded<T> {
    type Output = T;

    fn handle_subscribe(&self, mut subscriber: BoxSingleSubscriber<T>) {
        subscriber.on_subscribe(Arc::new(EmptySubscription));
        subscriber.on_success(self.value.clone());
    }
}

/// Single failing every subscriber with the same cause.
pub struct Failed<T> {
    cause: Cause,
    _output: std::marker::PhantomData<fn() -> T>,
}

/// Creates a single terminating with `cause`.
pub fn failed<T: Send + 'static>(cause: Cause) -> Failed<T> {
    Failed {
        cause,
        _output: std::marker::PhantomData,
    }
}

impl<T: Send + 'static> Single for Failed<T> {
    type Output = T;

    fn handle_subscribe(&self, mut subscriber: BoxSingleSubscriber<T>) {
        deliver_single_error(subscriber.as_mut(), Arc::clone(&self.cause));
    }
}

/// Single defined by a subscribe function.
pub struct FromFn<T, F> {
    subscribe_fn: F,
    _output: std::marker::PhantomData<fn() -> T>,
}

/// Creates a [`FromFn`] single.
///
/// ```
/// use std::sync::Arc;
/// use rxr_streams::{
///     single, BoxSingleSubscriber, EmptySubscription, FnSingleSubscriber, SingleExt,
///     SingleSubscriber,
/// };
///
/// let answer = single::from_fn(|mut subscriber: BoxSingleSubscriber<u32>| {
///     subscriber.on_subscribe(Arc::new(EmptySubscription));
///     subscriber.on_success(42);
/// });
/// answer.subscribe(FnSingleSubscriber::new(|v: u32| assert_eq!(v, 42), |_| {}));
/// ```
pub fn from_fn<T, F>(subscribe_fn: F) -> FromFn<T, F>
where
    T: Send + 'static,
    F: Fn(BoxSingleSubscriber<T>) + Send + Sync + 'static,
{
    FromFn {
        subscribe_fn,
        _output: std::marker::PhantomData,
    }
}

impl<T, F> Single for FromFn<T, F>
where
    T: Send + 'static,
    F: Fn(BoxSingleSubscriber<T>) + Send + Sync + 'static,
{
    type Output = T;

    fn handle_subscribe(&self, subscriber: BoxSingleSubscriber<T>) {
        (self.subscribe_fn)(subscriber);
    }
}
