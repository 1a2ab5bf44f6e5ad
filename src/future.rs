//! Bridges from the terminal shapes to `async` code.
//!
//! ```
//! use rxr_streams::{publisher, PublisherExt, SingleExt};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let items = publisher::from_iter(vec![1, 2, 3]).collect_vec().into_future().await;
//! assert_eq!(items.unwrap(), vec![1, 2, 3]);
//! # }
//! ```
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::sync::oneshot;

use crate::completable::{Completable, CompletableExt};
use crate::errors::{Cause, StreamError};
use crate::single::{Single, SingleExt};
use crate::subscriber::{CompletableSubscriber, SingleSubscriber};
use crate::subscription::{Cancellable, DelayedCancellable};

struct FutureSubscriber<T> {
    tx: Option<oneshot::Sender<Result<T, Cause>>>,
    cancellable: Arc<DelayedCancellable>,
}

impl<T> FutureSubscriber<T> {
    fn new(cancellable: Arc<DelayedCancellable>) -> (Self, oneshot::Receiver<Result<T, Cause>>) {
        let (tx, rx) = oneshot::channel();
        let subscriber = FutureSubscriber {
            tx: Some(tx),
            cancellable,
        };
        (subscriber, rx)
    }

    fn resolve(&mut self, result: Result<T, Cause>) {
        if let Some(tx) = self.tx.take() {
            // The future is gone, nobody is interested in the result.
            let _ = tx.send(result);
        }
    }
}

impl CompletableSubscriber for FutureSubscriber<()> {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        self.cancellable.set_delayed(cancellable);
    }

    fn on_error(&mut self, cause: Cause) {
        self.resolve(Err(cause));
    }

    fn on_complete(&mut self) {
        self.resolve(Ok(()));
    }
}

impl<T: Send> SingleSubscriber<T> for FutureSubscriber<T> {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        self.cancellable.set_delayed(cancellable);
    }

    fn on_success(&mut self, value: T) {
        self.resolve(Ok(value));
    }

    fn on_error(&mut self, cause: Cause) {
        self.resolve(Err(cause));
    }
}

fn poll_result<T>(
    rx: &mut oneshot::Receiver<Result<T, Cause>>,
    cx: &mut Context<'_>,
) -> Poll<Result<T, Cause>> {
    match Pin::new(rx).poll(cx) {
        Poll::Ready(Ok(result)) => Poll::Ready(result),
        Poll::Ready(Err(_)) => {
            tracing::warn!("subscriber dropped without a terminal signal");
            Poll::Ready(Err(StreamError::Abandoned.into_cause()))
        }
        Poll::Pending => Poll::Pending,
    }
}

/// Future resolving with the terminal signal of a [`Completable`].
///
/// Created by [`CompletableExt::into_future`]. Resolves to
/// `Err(StreamError::Abandoned)` if the source drops its subscriber without
/// terminating. Dropping the future cancels the subscription.
#[must_use = "futures do nothing unless polled, dropping it cancels the subscription"]
pub struct CompletableFuture {
    rx: oneshot::Receiver<Result<(), Cause>>,
    cancellable: Arc<DelayedCancellable>,
}

impl CompletableFuture {
    pub(crate) fn subscribe<C: Completable>(source: &C) -> Self {
        let cancellable = Arc::new(DelayedCancellable::new());
        let (subscriber, rx) = FutureSubscriber::new(Arc::clone(&cancellable));
        source.subscribe(subscriber);
        CompletableFuture { rx, cancellable }
    }
}

impl Future for CompletableFuture {
    type Output = Result<(), Cause>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        poll_result(&mut self.rx, cx)
    }
}

impl Drop for CompletableFuture {
    fn drop(&mut self) {
        self.cancellable.cancel();
    }
}

/// Future resolving with the outcome of a [`Single`].
///
/// Created by [`SingleExt::into_future`]; behaves like
/// [`CompletableFuture`] otherwise.
#[must_use = "futures do nothing unless polled, dropping it cancels the subscription"]
pub struct SingleFuture<T> {
    rx: oneshot::Receiver<Result<T, Cause>>,
    cancellable: Arc<DelayedCancellable>,
}

impl<T: Send + 'static> SingleFuture<T> {
    pub(crate) fn subscribe<S: Single<Output = T>>(source: &S) -> Self {
        let cancellable = Arc::new(DelayedCancellable::new());
        let (subscriber, rx) = FutureSubscriber::new(Arc::clone(&cancellable));
        source.subscribe(subscriber);
        SingleFuture { rx, cancellable }
    }
}

impl<T> Future for SingleFuture<T> {
    type Output = Result<T, Cause>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        poll_result(&mut self.rx, cx)
    }
}

impl<T> Drop for SingleFuture<T> {
    fn drop(&mut self) {
        self.cancellable.cancel();
    }
}
