//! Consumer-side capability sets of the protocol.
//!
//! Every source shape has its own subscriber trait:
//!
//! - [`Subscriber`] receives `on_subscribe`, any number of `on_next` within the
//!   granted demand, and one terminal signal from a [`Publisher`].
//! - [`CompletableSubscriber`] receives `on_subscribe` and one terminal signal
//!   from a [`Completable`].
//! - [`SingleSubscriber`] receives `on_subscribe` and either one value or one
//!   error from a [`Single`].
//!
//! Signals to one subscriber never overlap and nothing follows a terminal
//! signal. Sources are responsible for that; the `subscribe` methods of the
//! extension traits additionally wrap subscribers in a guard that drops and
//! logs anything arriving out of order.
//!
//! [`Publisher`]: crate::Publisher
//! [`Completable`]: crate::Completable
//! [`Single`]: crate::Single
mod fns;
pub(crate) mod guard;

pub use fns::*;

use std::sync::Arc;

use crate::errors::Cause;
use crate::subscription::{Cancellable, EmptySubscription, Subscription};

/// Receives the signals of a backpressured stream of `T`.
pub trait Subscriber<T>: Send {
    /// Called exactly once, before any other signal.
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>);

    /// Called for every element, never beyond the demand requested through
    /// the subscription.
    fn on_next(&mut self, item: T);

    /// Terminal signal carrying the failure cause.
    fn on_error(&mut self, cause: Cause);

    /// Terminal signal for successful completion.
    fn on_complete(&mut self);
}

/// Receives the terminal signal of a stream without elements.
pub trait CompletableSubscriber: Send {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>);
    fn on_error(&mut self, cause: Cause);
    fn on_complete(&mut self);
}

/// Receives the single value, or the error, of a [`Single`](crate::Single).
pub trait SingleSubscriber<T>: Send {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>);
    fn on_success(&mut self, value: T);
    fn on_error(&mut self, cause: Cause);
}

pub type BoxSubscriber<T> = Box<dyn Subscriber<T>>;
pub type BoxCompletableSubscriber = Box<dyn CompletableSubscriber>;
pub type BoxSingleSubscriber<T> = Box<dyn SingleSubscriber<T>>;

impl<T, S: Subscriber<T> + ?Sized> Subscriber<T> for Box<S> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        (**self).on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        (**self).on_next(item);
    }

    fn on_error(&mut self, cause: Cause) {
        (**self).on_error(cause);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}

impl<S: CompletableSubscriber + ?Sized> CompletableSubscriber for Box<S> {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        (**self).on_subscribe(cancellable);
    }

    fn on_error(&mut self, cause: Cause) {
        (**self).on_error(cause);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}

impl<T, S: SingleSubscriber<T> + ?Sized> SingleSubscriber<T> for Box<S> {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        (**self).on_subscribe(cancellable);
    }

    fn on_success(&mut self, value: T) {
        (**self).on_success(value);
    }

    fn on_error(&mut self, cause: Cause) {
        (**self).on_error(cause);
    }
}

/// Fails a subscriber that has not received `on_subscribe` yet.
///
/// Delivers an [`EmptySubscription`] first so that `on_subscribe` always
/// precedes the terminal signal.
pub fn deliver_error<T>(subscriber: &mut dyn Subscriber<T>, cause: Cause) {
    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_error(cause);
}

/// [`deliver_error`] for completable subscribers.
pub fn deliver_completable_error(subscriber: &mut dyn CompletableSubscriber, cause: Cause) {
    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_error(cause);
}

/// [`deliver_error`] for single subscribers.
pub fn deliver_single_error<T>(subscriber: &mut dyn SingleSubscriber<T>, cause: Cause) {
    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_error(cause);
}

/// Exposes only the cancel half of a subscription.
pub(crate) struct CancelOnly(pub(crate) Arc<dyn Subscription>);

impl Cancellable for CancelOnly {
    fn cancel(&self) {
        self.0.cancel();
    }
}
