//! The `publisher` module provides the backpressured multi-element source
//! shape and its sources.
//!
//! A [`Publisher`] is cold: nothing happens until it is subscribed to, and
//! every subscription runs independently unless a source documents otherwise
//! (see [`from_receiver`]).
mod from_fn;
mod from_iter;
mod from_receiver;

pub use from_fn::*;
pub use from_iter::*;
pub use from_receiver::*;

use std::{marker::PhantomData, sync::Arc};

use crate::errors::Cause;
use crate::operators::{First, PubToCompletable, Reduce};
use crate::subscriber::{
    deliver_error,
    guard::{run_guarded, GuardedSubscriber, SignalFlag},
    BoxSubscriber, Subscriber,
};
use crate::subscription::EmptySubscription;

/// Source of an ordered, backpressured sequence of `Item`s.
///
/// Implementors only provide [`handle_subscribe`](Self::handle_subscribe).
/// Consumers attach with [`PublisherExt::subscribe`], which installs the
/// protocol guard first.
pub trait Publisher: Send + Sync {
    /// The type of elements emitted.
    type Item: Send + 'static;

    /// Called once per subscribe with the subscriber to serve.
    ///
    /// The implementation must eventually deliver `on_subscribe`, then at most
    /// as many `on_next` signals as were requested, then exactly one terminal
    /// signal unless the subscription is cancelled first. A source that fails
    /// before it has a subscription uses [`deliver_error`].
    fn handle_subscribe(&self, subscriber: BoxSubscriber<Self::Item>);
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    type Item = P::Item;

    fn handle_subscribe(&self, subscriber: BoxSubscriber<Self::Item>) {
        (**self).handle_subscribe(subscriber);
    }
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    type Item = P::Item;

    fn handle_subscribe(&self, subscriber: BoxSubscriber<Self::Item>) {
        (**self).handle_subscribe(subscriber);
    }
}

/// Extension methods available on every [`Publisher`].
pub trait PublisherExt: Publisher {
    /// Subscribes `subscriber` to this publisher.
    ///
    /// The subscriber is wrapped in a guard that keeps the signal order
    /// intact. If the source panics, the panic is logged and the subscriber
    /// receives `on_subscribe` (if it had none yet) followed by
    /// `on_error(StreamError::SourcePanicked)`.
    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Self::Item> + 'static,
    {
        let in_signal = SignalFlag::default();
        let guarded = GuardedSubscriber::new(Box::new(subscriber), in_signal.clone());
        run_guarded("publisher", &in_signal, || {
            self.handle_subscribe(Box::new(guarded));
        });
    }

    /// Converts into a [`Completable`](crate::Completable) that discards all
    /// elements and only forwards the terminal signal.
    fn ignore_elements(self) -> PubToCompletable<Self>
    where
        Self: Sized,
    {
        PubToCompletable::new(self)
    }

    /// Folds all elements into one value, emitted by a
    /// [`Single`](crate::Single) when the publisher completes.
    ///
    /// `init` creates the seed for every subscription.
    fn reduce<R, I, F>(self, init: I, f: F) -> Reduce<Self, I, F>
    where
        Self: Sized,
        R: Send + 'static,
        I: Fn() -> R + Send + Sync + 'static,
        F: Fn(R, Self::Item) -> R + Send + Sync + 'static,
    {
        Reduce::new(self, init, f)
    }

    /// Collects all elements into a `Vec`.
    #[allow(clippy::type_complexity)]
    fn collect_vec(
        self,
    ) -> Reduce<Self, fn() -> Vec<Self::Item>, fn(Vec<Self::Item>, Self::Item) -> Vec<Self::Item>>
    where
        Self: Sized,
    {
        fn push<T>(mut items: Vec<T>, item: T) -> Vec<T> {
            items.push(item);
            items
        }
        let init: fn() -> Vec<Self::Item> = Vec::new;
        let f: fn(Vec<Self::Item>, Self::Item) -> Vec<Self::Item> = push::<Self::Item>;
        Reduce::new(self, init, f)
    }

    /// Emits the first element, or `None` for an empty publisher, then
    /// cancels the upstream subscription.
    fn first(self) -> First<Self>
    where
        Self: Sized,
    {
        First::new(self)
    }
}

impl<P: Publisher + ?Sized> PublisherExt for P {}

/// Publisher that completes right after `on_subscribe`.
pub struct Empty<T>(PhantomData<fn() -> T>);

/// Creates a publisher that emits no elements and completes.
pub fn empty<T: Send + 'static>() -> Empty<T> {
    Empty(PhantomData)
}

impl<T: Send + 'static> Publisher for Empty<T> {
    type Item = T;

    fn handle_subscribe(&self, mut subscriber: BoxSubscriber<T>) {
        subscriber.on_subscribe(Arc::new(EmptySubscription));
        subscriber.on_complete();
    }
}

/// Publisher that never signals anything after `on_subscribe`.
pub struct Never<T>(PhantomData<fn() -> T>);

/// Creates a publisher that never emits nor terminates.
pub fn never<T: Send + 'static>() -> Never<T> {
    Never(PhantomData)
}

impl<T: Send + 'static> Publisher for Never<T> {
    type Item = T;

    fn handle_subscribe(&self, mut subscriber: BoxSubscriber<T>) {
        subscriber.on_subscribe(Arc::new(EmptySubscription));
    }
}

/// Publisher that fails every subscriber with the same cause.
pub struct Failed<T> {
    cause: Cause,
    _item: PhantomData<fn() -> T>,
}

/// Creates a publisher that terminates with `cause` right after
/// `on_subscribe`.
pub fn failed<T: Send + 'static>(cause: Cause) -> Failed<T> {
    Failed {
        cause,
        _item: PhantomData,
    }
}

impl<T: Send + 'static> Publisher for Failed<T> {
    type Item = T;

    fn handle_subscribe(&self, mut subscriber: BoxSubscriber<T>) {
        deliver_error(subscriber.as_mut(), Arc::clone(&self.cause));
    }
}
