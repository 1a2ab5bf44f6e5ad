use std::sync::Arc;

use crate::publisher::{Publisher, PublisherExt};
use crate::single::Single;
use crate::subscriber::BoxSingleSubscriber;

use super::{FirstValue, Reducer, TerminalAdapter};

/// Left fold of a [`Publisher`] into a [`Single`].
///
/// A new seed is created for every subscription. If the fold function
/// panics, the upstream is cancelled and the subscriber receives
/// `on_error(StreamError::OperatorPanicked)`.
///
/// ```
/// use rxr_streams::{publisher, FnSingleSubscriber, PublisherExt, SingleExt};
///
/// publisher::from_iter(1..=4)
///     .reduce(|| 0, |acc: i32, v| acc + v)
///     .subscribe(FnSingleSubscriber::new(|sum| assert_eq!(sum, 10), |_| {}));
/// ```
pub struct Reduce<P, I, F> {
    source: P,
    init: I,
    f: Arc<F>,
}

impl<P, I, F> Reduce<P, I, F> {
    pub fn new(source: P, init: I, f: F) -> Self {
        Reduce {
            source,
            init,
            f: Arc::new(f),
        }
    }
}

impl<P, R, I, F> Single for Reduce<P, I, F>
where
    P: Publisher,
    R: Send + 'static,
    I: Fn() -> R + Send + Sync + 'static,
    F: Fn(R, P::Item) -> R + Send + Sync + 'static,
{
    type Output = R;

    fn handle_subscribe(&self, subscriber: BoxSingleSubscriber<R>) {
        let reducer = Reducer::new((self.init)(), Arc::clone(&self.f));
        self.source.subscribe(TerminalAdapter::new(reducer, subscriber));
    }
}

/// [`Single`] emitting the first element of a [`Publisher`], or `None` if
/// it completes empty.
///
/// Only one element is requested and the upstream is cancelled as soon as
/// it arrived.
#[derive(Debug, Clone)]
pub struct First<P> {
    source: P,
}

impl<P: Publisher> First<P> {
    pub fn new(source: P) -> Self {
        First { source }
    }
}

impl<P: Publisher> Single for First<P> {
    type Output = Option<P::Item>;

    fn handle_subscribe(&self, subscriber: BoxSingleSubscriber<Self::Output>) {
        self.source
            .subscribe(TerminalAdapter::new(FirstValue::default(), subscriber));
    }
}
