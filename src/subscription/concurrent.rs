use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use super::{Cancellable, Demand, Subscription};

const IDLE: u8 = 0;
const DRAINING: u8 = 1;
// A cancel arrived while another thread was inside the wrapped `request`.
// The draining thread forwards it once it leaves the wrapped subscription.
const CANCEL_PENDING: u8 = 2;
const CANCELLED: u8 = 3;

/// A [`Subscription`] decorator that makes a raw subscription safe to drive
/// from several threads.
///
/// The wrapped subscription never observes overlapping `request`/`cancel`
/// invocations. Demand that arrives while another thread is forwarding is
/// accumulated and picked up by that thread, so nothing is lost and nothing
/// is forwarded twice. `cancel` is forwarded at most once, and after it every
/// `request` is a no-op.
///
/// The state is a small atomic state machine over idle, draining and
/// cancelled, plus a saturating demand counter. No locks are taken, so a
/// producer thread calling `request` is never blocked by a consumer.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rxr_streams::{Cancellable, ConcurrentSubscription, EmptySubscription, Subscription};
///
/// let cs = ConcurrentSubscription::wrap(Arc::new(EmptySubscription));
/// cs.request(10);
/// cs.cancel();
/// cs.cancel();
/// assert!(cs.is_cancelled());
/// ```
pub struct ConcurrentSubscription {
    inner: Arc<dyn Subscription>,
    pending: Demand,
    state: AtomicU8,
}

impl ConcurrentSubscription {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn Subscription>) -> Self {
        ConcurrentSubscription {
            inner,
            pending: Demand::new(),
            state: AtomicU8::new(IDLE),
        }
    }

    /// Wraps `inner` and returns the decorator ready to be shared.
    pub fn wrap(inner: Arc<dyn Subscription>) -> Arc<Self> {
        Arc::new(Self::new(inner))
    }

    /// Returns `true` once `cancel` was called, even if forwarding it to the
    /// wrapped subscription is still pending.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.state.load(Ordering::SeqCst), CANCEL_PENDING | CANCELLED)
    }

    fn drain(&self) {
        loop {
            if self
                .state
                .compare_exchange(IDLE, DRAINING, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                // Either another thread drains and will see our demand, or
                // the subscription is cancelled.
                return;
            }

            if let Some(n) = self.pending.take_invalid() {
                tracing::warn!(demand = n, "forwarding invalid demand to wrapped subscription");
                self.inner.request(n);
                // The source terminates with an error, nothing else is forwarded.
                if self.state.swap(CANCELLED, Ordering::SeqCst) == CANCEL_PENDING {
                    self.inner.cancel();
                }
                return;
            }

            let n = self.pending.take_all();
            if n > 0 {
                self.inner.request(n);
            }

            match self
                .state
                .compare_exchange(DRAINING, IDLE, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    if !self.pending.has_pending() {
                        return;
                    }
                }
                Err(_) => {
                    self.state.store(CANCELLED, Ordering::SeqCst);
                    self.inner.cancel();
                    return;
                }
            }
        }
    }
}

impl Cancellable for ConcurrentSubscription {
    fn cancel(&self) {
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            let next = match current {
                IDLE => CANCELLED,
                DRAINING => CANCEL_PENDING,
                _ => return,
            };
            match self
                .state
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    if next == CANCELLED {
                        self.inner.cancel();
                    }
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Subscription for ConcurrentSubscription {
    fn request(&self, n: i64) {
        if self.is_cancelled() {
            return;
        }
        self.pending.add(n);
        self.drain();
    }
}

impl std::fmt::Debug for ConcurrentSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentSubscription")
            .field("pending", &self.pending.outstanding())
            .field("state", &self.state.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
