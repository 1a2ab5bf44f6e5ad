use std::marker::PhantomData;

use crate::subscriber::BoxSubscriber;

use super::Publisher;

/// Publisher defined by a subscribe function.
///
/// The function runs once per subscription and is responsible for the whole
/// protocol: `on_subscribe` first, elements within demand, one terminal
/// signal.
///
/// ```
/// use std::sync::Arc;
/// use rxr_streams::{
///     publisher, BoxSubscriber, EmptySubscription, FnSubscriber, PublisherExt, Subscriber,
/// };
///
/// let source = publisher::from_fn(|mut subscriber: BoxSubscriber<u8>| {
///     subscriber.on_subscribe(Arc::new(EmptySubscription));
///     subscriber.on_complete();
/// });
/// source.subscribe(FnSubscriber::from_next(|_| {}).with_complete(|| println!("done")));
/// ```
pub struct FromFn<T, F> {
    subscribe_fn: F,
    _item: PhantomData<fn() -> T>,
}

/// Creates a [`FromFn`] publisher.
pub fn from_fn<T, F>(subscribe_fn: F) -> FromFn<T, F>
where
    T: Send + 'static,
    F: Fn(BoxSubscriber<T>) + Send + Sync + 'static,
{
    FromFn {
        subscribe_fn,
        _item: PhantomData,
    }
}

impl<T, F> Publisher for FromFn<T, F>
where
    T: Send + 'static,
    F: Fn(BoxSubscriber<T>) + Send + Sync + 'static,
{
    type Item = T;

    fn handle_subscribe(&self, subscriber: BoxSubscriber<T>) {
        (self.subscribe_fn)(subscriber);
    }
}
