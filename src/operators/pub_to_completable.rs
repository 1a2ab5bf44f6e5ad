use crate::completable::Completable;
use crate::publisher::{Publisher, PublisherExt};
use crate::subscriber::BoxCompletableSubscriber;

use super::{Discard, TerminalAdapter};

/// [`Completable`] view of a [`Publisher`] that ignores its elements.
///
/// Every element is requested and dropped. The upstream `on_complete` and
/// `on_error` are forwarded unchanged; cancelling the completable cancels the
/// upstream subscription.
///
/// ```
/// use rxr_streams::{publisher, CompletableExt, FnCompletableSubscriber, PublisherExt};
///
/// publisher::from_iter(vec!["a", "b", "c"])
///     .ignore_elements()
///     .subscribe(FnCompletableSubscriber::new(|_| {}, || println!("done")));
/// ```
#[derive(Debug, Clone)]
pub struct PubToCompletable<P> {
    source: P,
}

impl<P: Publisher> PubToCompletable<P> {
    pub fn new(source: P) -> Self {
        PubToCompletable { source }
    }
}

impl<P: Publisher> Completable for PubToCompletable<P> {
    fn handle_subscribe(&self, subscriber: BoxCompletableSubscriber) {
        self.source
            .subscribe(TerminalAdapter::new(Discard, subscriber));
    }
}
