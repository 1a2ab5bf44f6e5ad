use std::{
    iter::Peekable,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::errors::StreamError;
use crate::subscriber::BoxSubscriber;
use crate::subscription::{Cancellable, Demand, Subscription, UNBOUNDED};

use super::Publisher;

/// Publisher emitting the elements of an iterable.
///
/// Every subscription iterates a fresh clone of the iterable. Elements are
/// only emitted within the requested demand. Demand requested from inside
/// `on_next` is picked up by the running emission loop instead of recursing,
/// so the stack depth stays constant however small the batches are.
pub struct FromIter<I> {
    iterable: I,
}

/// Creates a [`FromIter`] publisher.
///
/// ```
/// use rxr_streams::{publisher, FnSubscriber, PublisherExt};
///
/// publisher::from_iter(1..=3).subscribe(FnSubscriber::from_next(|v: i32| println!("{}", v)));
/// ```
pub fn from_iter<I>(iterable: I) -> FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    FromIter { iterable }
}

impl<I> Publisher for FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    type Item = I::Item;

    fn handle_subscribe(&self, mut subscriber: BoxSubscriber<Self::Item>) {
        let subscription: Arc<IterSubscription<I::IntoIter>> = Arc::new(IterSubscription {
            emitter: Mutex::new(None),
            demand: Demand::new(),
            // Held by this thread until `on_subscribe` returned, so demand
            // requested from inside `on_subscribe` does not emit yet.
            wip: AtomicUsize::new(1),
            cancelled: AtomicBool::new(false),
        });

        subscriber.on_subscribe(Arc::clone(&subscription) as Arc<dyn Subscription>);

        *subscription.emitter.lock() = Some(Emitter {
            iter: self.iterable.clone().into_iter().peekable(),
            subscriber,
        });
        subscription.drain_loop(1);
    }
}

struct Emitter<It: Iterator> {
    iter: Peekable<It>,
    subscriber: BoxSubscriber<It::Item>,
}

struct IterSubscription<It: Iterator> {
    // Only touched by the thread that owns `wip`.
    emitter: Mutex<Option<Emitter<It>>>,
    demand: Demand,
    wip: AtomicUsize,
    cancelled: AtomicBool,
}

impl<It> IterSubscription<It>
where
    It: Iterator + Send,
    It::Item: Send,
{
    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::SeqCst) == 0 {
            self.drain_loop(1);
        }
    }

    fn drain_loop(&self, mut missed: usize) {
        loop {
            self.emit();
            let remaining = self.wip.fetch_sub(missed, Ordering::SeqCst) - missed;
            if remaining == 0 {
                return;
            }
            missed = remaining;
        }
    }

    fn emit(&self) {
        // Taken out while emitting so that no lock is held across signals and
        // a panicking iterator drops the subscriber during unwinding.
        let Some(mut emitter) = self.emitter.lock().take() else {
            return;
        };
        if self.emit_within_demand(&mut emitter) {
            *self.emitter.lock() = Some(emitter);
        }
    }

    /// Returns `false` once the emitter is finished.
    fn emit_within_demand(&self, emitter: &mut Emitter<It>) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return false;
        }
        if let Some(n) = self.demand.take_invalid() {
            let err = StreamError::InvalidDemand(n);
            tracing::warn!(error = err.as_label(), demand = n, "terminating iterator source");
            emitter.subscriber.on_error(err.into_cause());
            return false;
        }

        let requested = self.demand.outstanding();
        let mut emitted = 0;
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                return false;
            }
            if emitter.iter.peek().is_none() {
                emitter.subscriber.on_complete();
                return false;
            }
            if requested != UNBOUNDED && emitted == requested {
                break;
            }
            if let Some(item) = emitter.iter.next() {
                emitted += 1;
                emitter.subscriber.on_next(item);
            }
        }
        self.demand.consume(emitted);
        true
    }
}

impl<It> Cancellable for IterSubscription<It>
where
    It: Iterator + Send,
    It::Item: Send,
{
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Releases the iterator and the subscriber as soon as possible.
        self.drain();
    }
}

impl<It> Subscription for IterSubscription<It>
where
    It: Iterator + Send,
    It::Item: Send,
{
    fn request(&self, n: i64) {
        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }
        self.demand.add(n);
        self.drain();
    }
}
