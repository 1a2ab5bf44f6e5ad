//! Provides the producer-side handles of the subscriber/subscription protocol.
//!
//! A [`Subscription`] is handed to a subscriber in `on_subscribe` and lets it
//! signal demand with `request(n)` or stop the stream with `cancel()`. Shapes
//! without elements only hand out a [`Cancellable`].
//!
//! Raw subscriptions are not required to tolerate concurrent callers. Wrap
//! them in a [`ConcurrentSubscription`] when demand and cancellation may come
//! from different threads.
mod concurrent;
mod delayed;

pub use concurrent::*;
pub use delayed::*;

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use crate::errors::StreamError;

/// Demand value meaning "no limit". Once requested the producer does not need
/// to track demand any more.
pub const UNBOUNDED: i64 = i64::MAX;

/// Handle used to stop a running stream.
pub trait Cancellable: Send + Sync {
    /// Requests that no further signals are delivered.
    ///
    /// Must be idempotent. Signals already in flight may still arrive.
    fn cancel(&self);
}

/// Handle used by a [`Subscriber`](crate::Subscriber) to control a backpressured
/// stream.
pub trait Subscription: Cancellable {
    /// Signals willingness to receive up to `n` more elements.
    ///
    /// Demand is cumulative and saturates at [`UNBOUNDED`]. Values `n <= 0` are
    /// a protocol violation: the producer answers with
    /// `on_error(StreamError::InvalidDemand(n))`.
    fn request(&self, n: i64);
}

/// Subscription that ignores every call.
///
/// Delivered when a source has to fail before it established a real
/// subscription, so subscribers can always rely on `on_subscribe` preceding
/// a terminal signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySubscription;

impl Cancellable for EmptySubscription {
    fn cancel(&self) {}
}

impl Subscription for EmptySubscription {
    fn request(&self, _: i64) {}
}

/// Checks that `n` is a legal argument for [`Subscription::request`].
///
/// # Errors
///
/// Returns [`StreamError::InvalidDemand`] when `n <= 0`.
pub fn validate_demand(n: i64) -> Result<i64, StreamError> {
    if n > 0 {
        Ok(n)
    } else {
        Err(StreamError::InvalidDemand(n))
    }
}

/// Lock-free demand accumulator shared between requesting and emitting threads.
#[derive(Debug, Default)]
pub(crate) struct Demand {
    outstanding: AtomicI64,
    invalid: AtomicBool,
    invalid_value: AtomicI64,
}

impl Demand {
    pub(crate) const fn new() -> Self {
        Demand {
            outstanding: AtomicI64::new(0),
            invalid: AtomicBool::new(false),
            invalid_value: AtomicI64::new(0),
        }
    }

    /// Adds `n` to the outstanding demand, saturating at [`UNBOUNDED`].
    ///
    /// Invalid values are latched instead and `false` is returned.
    pub(crate) fn add(&self, n: i64) -> bool {
        match validate_demand(n) {
            Ok(n) => {
                let _ = self
                    .outstanding
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                        Some(current.saturating_add(n))
                    });
                true
            }
            Err(_) => {
                self.invalid_value.store(n, Ordering::SeqCst);
                self.invalid.store(true, Ordering::SeqCst);
                false
            }
        }
    }

    /// Takes the latched invalid request, if any.
    pub(crate) fn take_invalid(&self) -> Option<i64> {
        if self.invalid.swap(false, Ordering::SeqCst) {
            Some(self.invalid_value.load(Ordering::SeqCst))
        } else {
            None
        }
    }

    pub(crate) fn outstanding(&self) -> i64 {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Removes and returns everything accumulated so far.
    pub(crate) fn take_all(&self) -> i64 {
        self.outstanding.swap(0, Ordering::SeqCst)
    }

    /// Records `n` delivered elements. Unbounded demand is never decremented.
    pub(crate) fn consume(&self, n: i64) {
        let _ = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                if current == UNBOUNDED {
                    None
                } else {
                    Some(current - n)
                }
            });
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.outstanding() > 0 || self.invalid.load(Ordering::SeqCst)
    }
}
