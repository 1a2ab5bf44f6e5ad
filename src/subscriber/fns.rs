use std::sync::Arc;

use crate::errors::Cause;
use crate::subscription::{Cancellable, DelayedCancellable, Subscription, UNBOUNDED};

use super::{CancelOnly, CompletableSubscriber, SingleSubscriber, Subscriber};

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type SuccessFn<T> = Box<dyn FnOnce(T) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;
type ErrorFn = Box<dyn FnOnce(Cause) + Send>;

/// A [`Subscriber`] built from closures.
///
/// By default it requests [`UNBOUNDED`] demand on subscribe. Use
/// [`with_batch`](Self::with_batch) to request `n` elements at a time instead.
///
/// ```
/// use rxr_streams::{publisher, FnSubscriber, PublisherExt};
///
/// let subscriber = FnSubscriber::new(
///     |v: i32| println!("Emitted {}", v),
///     |e| eprintln!("Error {}", e),
///     || println!("Completed"),
/// );
/// publisher::from_iter(vec![1, 2, 3]).subscribe(subscriber);
/// ```
pub struct FnSubscriber<T> {
    next_fn: NextFn<T>,
    error_fn: Option<ErrorFn>,
    complete_fn: Option<CompleteFn>,
    batch: i64,
    received: i64,
    subscription: Option<Arc<dyn Subscription>>,
    cancel_handle: Arc<DelayedCancellable>,
}

impl<T> FnSubscriber<T> {
    /// Creates a subscriber handling elements, errors and completion.
    pub fn new(
        next_fn: impl FnMut(T) + Send + 'static,
        error_fn: impl FnOnce(Cause) + Send + 'static,
        complete_fn: impl FnOnce() + Send + 'static,
    ) -> Self {
        FnSubscriber {
            next_fn: Box::new(next_fn),
            error_fn: Some(Box::new(error_fn)),
            complete_fn: Some(Box::new(complete_fn)),
            batch: UNBOUNDED,
            received: 0,
            subscription: None,
            cancel_handle: Arc::new(DelayedCancellable::new()),
        }
    }

    /// Creates a subscriber that only handles elements.
    pub fn from_next(next_fn: impl FnMut(T) + Send + 'static) -> Self {
        FnSubscriber {
            next_fn: Box::new(next_fn),
            error_fn: None,
            complete_fn: None,
            batch: UNBOUNDED,
            received: 0,
            subscription: None,
            cancel_handle: Arc::new(DelayedCancellable::new()),
        }
    }

    /// Sets the error handler.
    #[must_use]
    pub fn with_error(mut self, error_fn: impl FnOnce(Cause) + Send + 'static) -> Self {
        self.error_fn = Some(Box::new(error_fn));
        self
    }

    /// Sets the completion handler.
    #[must_use]
    pub fn with_complete(mut self, complete_fn: impl FnOnce() + Send + 'static) -> Self {
        self.complete_fn = Some(Box::new(complete_fn));
        self
    }

    /// Requests `n` elements on subscribe and `n` more every time `n`
    /// elements were received.
    ///
    /// `n` is passed to the source unchecked, so `n <= 0` makes the source
    /// fail with `StreamError::InvalidDemand`.
    #[must_use]
    pub fn with_batch(mut self, n: i64) -> Self {
        self.batch = n;
        self
    }

    /// Returns a handle that cancels the subscription, even if it is used
    /// before the source delivered `on_subscribe`.
    pub fn cancel_handle(&self) -> Arc<dyn Cancellable> {
        Arc::clone(&self.cancel_handle) as Arc<dyn Cancellable>
    }
}

impl<T> Subscriber<T> for FnSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.cancel_handle
            .set_delayed(Arc::new(CancelOnly(Arc::clone(&subscription))));
        subscription.request(self.batch);
        self.subscription = Some(subscription);
    }

    fn on_next(&mut self, item: T) {
        (self.next_fn)(item);
        if self.batch == UNBOUNDED {
            return;
        }
        self.received += 1;
        if self.received == self.batch {
            self.received = 0;
            if let Some(s) = &self.subscription {
                s.request(self.batch);
            }
        }
    }

    fn on_error(&mut self, cause: Cause) {
        self.subscription = None;
        match self.error_fn.take() {
            Some(efn) => efn(cause),
            None => tracing::debug!(error = %cause, "error signal without an error handler"),
        }
    }

    fn on_complete(&mut self) {
        self.subscription = None;
        if let Some(cfn) = self.complete_fn.take() {
            cfn();
        }
    }
}

/// A [`CompletableSubscriber`] built from closures.
pub struct FnCompletableSubscriber {
    error_fn: Option<ErrorFn>,
    complete_fn: Option<CompleteFn>,
    cancel_handle: Arc<DelayedCancellable>,
}

impl FnCompletableSubscriber {
    pub fn new(
        error_fn: impl FnOnce(Cause) + Send + 'static,
        complete_fn: impl FnOnce() + Send + 'static,
    ) -> Self {
        FnCompletableSubscriber {
            error_fn: Some(Box::new(error_fn)),
            complete_fn: Some(Box::new(complete_fn)),
            cancel_handle: Arc::new(DelayedCancellable::new()),
        }
    }

    /// See [`FnSubscriber::cancel_handle`].
    pub fn cancel_handle(&self) -> Arc<dyn Cancellable> {
        Arc::clone(&self.cancel_handle) as Arc<dyn Cancellable>
    }
}

impl CompletableSubscriber for FnCompletableSubscriber {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        self.cancel_handle.set_delayed(cancellable);
    }

    fn on_error(&mut self, cause: Cause) {
        if let Some(efn) = self.error_fn.take() {
            efn(cause);
        }
    }

    fn on_complete(&mut self) {
        if let Some(cfn) = self.complete_fn.take() {
            cfn();
        }
    }
}

/// A [`SingleSubscriber`] built from closures.
pub struct FnSingleSubscriber<T> {
    success_fn: Option<SuccessFn<T>>,
    error_fn: Option<ErrorFn>,
    cancel_handle: Arc<DelayedCancellable>,
}

impl<T> FnSingleSubscriber<T> {
    pub fn new(
        success_fn: impl FnOnce(T) + Send + 'static,
        error_fn: impl FnOnce(Cause) + Send + 'static,
    ) -> Self {
        FnSingleSubscriber {
            success_fn: Some(Box::new(success_fn)),
            error_fn: Some(Box::new(error_fn)),
            cancel_handle: Arc::new(DelayedCancellable::new()),
        }
    }

    /// See [`FnSubscriber::cancel_handle`].
    pub fn cancel_handle(&self) -> Arc<dyn Cancellable> {
        Arc::clone(&self.cancel_handle) as Arc<dyn Cancellable>
    }
}

impl<T> SingleSubscriber<T> for FnSingleSubscriber<T> {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        self.cancel_handle.set_delayed(cancellable);
    }

    fn on_success(&mut self, value: T) {
        if let Some(sfn) = self.success_fn.take() {
            sfn(value);
        }
    }

    fn on_error(&mut self, cause: Cause) {
        if let Some(efn) = self.error_fn.take() {
            efn(cause);
        }
    }
}
