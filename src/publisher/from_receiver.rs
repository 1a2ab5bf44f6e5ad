use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::{
    runtime::Handle,
    sync::{mpsc, Notify},
};

use crate::errors::StreamError;
use crate::subscriber::{deliver_error, BoxSubscriber};
use crate::subscription::{Cancellable, Demand, Subscription};

use super::Publisher;

/// Publisher draining a Tokio `mpsc` channel.
///
/// This is a single-subscription source: the channel can only be consumed
/// once, so a second subscriber receives
/// `on_error(StreamError::AlreadySubscribed)`.
///
/// A Tokio task spawned on the runtime that is current at subscribe time
/// pumps the channel, but only while demand is outstanding, so a slow
/// subscriber pushes back on the channel's senders. Cancelling stops the task
/// and drops the receiver; closing all senders completes the stream.
pub struct FromReceiver<T> {
    receiver: Mutex<Option<mpsc::Receiver<T>>>,
}

/// Creates a [`FromReceiver`] publisher.
pub fn from_receiver<T: Send + 'static>(receiver: mpsc::Receiver<T>) -> FromReceiver<T> {
    FromReceiver {
        receiver: Mutex::new(Some(receiver)),
    }
}

impl<T: Send + 'static> Publisher for FromReceiver<T> {
    type Item = T;

    fn handle_subscribe(&self, mut subscriber: BoxSubscriber<T>) {
        let Ok(handle) = Handle::try_current() else {
            deliver_error(subscriber.as_mut(), StreamError::NoRuntime.into_cause());
            return;
        };
        let Some(receiver) = self.receiver.lock().take() else {
            deliver_error(subscriber.as_mut(), StreamError::AlreadySubscribed.into_cause());
            return;
        };

        let subscription = Arc::new(ReceiverSubscription {
            demand: Demand::new(),
            cancelled: AtomicBool::new(false),
            wake: Notify::new(),
        });
        subscriber.on_subscribe(Arc::clone(&subscription) as Arc<dyn Subscription>);

        tracing::debug!("spawning channel pump");
        handle.spawn(pump(receiver, subscriber, subscription));
    }
}

struct ReceiverSubscription {
    demand: Demand,
    cancelled: AtomicBool,
    wake: Notify,
}

impl Cancellable for ReceiverSubscription {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }
}

impl Subscription for ReceiverSubscription {
    fn request(&self, n: i64) {
        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }
        self.demand.add(n);
        self.wake.notify_one();
    }
}

async fn pump<T>(
    mut receiver: mpsc::Receiver<T>,
    mut subscriber: BoxSubscriber<T>,
    subscription: Arc<ReceiverSubscription>,
) {
    loop {
        if subscription.cancelled.load(Ordering::SeqCst) {
            tracing::debug!("channel pump cancelled");
            return;
        }
        if let Some(n) = subscription.demand.take_invalid() {
            let err = StreamError::InvalidDemand(n);
            tracing::warn!(error = err.as_label(), demand = n, "terminating channel pump");
            subscriber.on_error(err.into_cause());
            return;
        }
        if subscription.demand.outstanding() == 0 {
            // `notify_one` stores a permit, so a request that raced with the
            // check above is not missed.
            subscription.wake.notified().await;
            continue;
        }

        tokio::select! {
            biased;
            () = subscription.wake.notified() => {}
            item = receiver.recv() => match item {
                Some(item) => {
                    subscription.demand.consume(1);
                    subscriber.on_next(item);
                }
                None => {
                    subscriber.on_complete();
                    return;
                }
            },
        }
    }
}
