//! Protocol guards installed by the `subscribe` methods of the extension
//! traits.
//!
//! A guard enforces the ordering rules on behalf of the wrapped subscriber:
//! `on_subscribe` exactly once and first, at most one terminal signal, nothing
//! after it. Out of order signals are dropped and logged. When a source
//! panics while it owns the guard, the guard delivers `on_error` during
//! unwinding so the subscriber is not left waiting forever.
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use crate::errors::{panic_message, Cause, StreamError};
use crate::subscription::{Cancellable, EmptySubscription, Subscription};

use super::{
    BoxCompletableSubscriber, BoxSingleSubscriber, BoxSubscriber, CompletableSubscriber,
    SingleSubscriber, Subscriber,
};

/// Set while a guard is inside a call into its subscriber.
///
/// A panic that leaves it set came from the subscriber and is re-raised by
/// [`run_guarded`] instead of being reported as a source failure.
#[derive(Clone, Default)]
pub(crate) struct SignalFlag(Arc<AtomicBool>);

impl SignalFlag {
    fn enter(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct GuardState {
    subscribed: bool,
    terminated: bool,
    in_signal: SignalFlag,
}

impl GuardState {
    fn new(in_signal: SignalFlag) -> Self {
        GuardState {
            subscribed: false,
            terminated: false,
            in_signal,
        }
    }

    fn deliver<R>(&self, f: impl FnOnce() -> R) -> R {
        self.in_signal.enter();
        let r = f();
        self.in_signal.exit();
        r
    }

    /// Decides whether a dropped guard has to fail its subscriber.
    fn must_fail_on_drop(&self) -> bool {
        thread::panicking() && !self.terminated && !self.in_signal.is_set()
    }

    fn accept_subscribe(&mut self, cancel_extra: impl FnOnce()) -> bool {
        if self.subscribed {
            tracing::warn!("duplicate on_subscribe, cancelling the extra subscription");
            cancel_extra();
            return false;
        }
        self.subscribed = true;
        true
    }

    /// Returns `false` if a terminal signal must be dropped.
    fn accept_terminal(&mut self, signal: &'static str) -> bool {
        if self.terminated {
            tracing::warn!(signal, "signal after terminal signal dropped");
            return false;
        }
        self.terminated = true;
        true
    }
}

fn source_panicked() -> Cause {
    StreamError::SourcePanicked("panic while the source owned the subscriber".to_string())
        .into_cause()
}

/// Runs a source's `handle_subscribe`, turning a source panic into a log
/// record. Panics raised by the subscriber itself propagate unchanged.
pub(crate) fn run_guarded(source: &'static str, in_signal: &SignalFlag, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        if in_signal.is_set() {
            panic::resume_unwind(payload);
        }
        log_source_panic(source, payload.as_ref());
    }
}

fn log_source_panic(source: &'static str, payload: &(dyn Any + Send)) {
    tracing::error!(
        source,
        panic = %panic_message(payload),
        "source panicked while handling subscribe"
    );
}

pub(crate) struct GuardedSubscriber<T> {
    inner: BoxSubscriber<T>,
    state: GuardState,
}

impl<T> GuardedSubscriber<T> {
    pub(crate) fn new(inner: BoxSubscriber<T>, in_signal: SignalFlag) -> Self {
        GuardedSubscriber {
            inner,
            state: GuardState::new(in_signal),
        }
    }

    fn subscribe_empty_if_needed(&mut self) {
        if !self.state.subscribed {
            self.state.subscribed = true;
            let inner = &mut self.inner;
            self.state
                .deliver(|| inner.on_subscribe(Arc::new(EmptySubscription)));
        }
    }
}

impl<T> Subscriber<T> for GuardedSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        if !self.state.accept_subscribe(|| subscription.cancel()) {
            return;
        }
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_subscribe(subscription));
    }

    fn on_next(&mut self, item: T) {
        if self.state.terminated {
            tracing::warn!("on_next after terminal signal dropped");
            return;
        }
        if !self.state.subscribed {
            tracing::warn!("on_next before on_subscribe, failing the subscriber");
            self.subscribe_empty_if_needed();
            self.state.terminated = true;
            let inner = &mut self.inner;
            self.state.deliver(|| {
                inner.on_error(
                    StreamError::ProtocolViolation("on_next before on_subscribe").into_cause(),
                );
            });
            return;
        }
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_next(item));
    }

    fn on_error(&mut self, cause: Cause) {
        if !self.state.accept_terminal("on_error") {
            return;
        }
        self.subscribe_empty_if_needed();
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_error(cause));
    }

    fn on_complete(&mut self) {
        if !self.state.accept_terminal("on_complete") {
            return;
        }
        self.subscribe_empty_if_needed();
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_complete());
    }
}

impl<T> Drop for GuardedSubscriber<T> {
    fn drop(&mut self) {
        if self.state.must_fail_on_drop() {
            self.on_error(source_panicked());
        }
    }
}

pub(crate) struct GuardedCompletableSubscriber {
    inner: BoxCompletableSubscriber,
    state: GuardState,
}

impl GuardedCompletableSubscriber {
    pub(crate) fn new(inner: BoxCompletableSubscriber, in_signal: SignalFlag) -> Self {
        GuardedCompletableSubscriber {
            inner,
            state: GuardState::new(in_signal),
        }
    }

    fn subscribe_empty_if_needed(&mut self) {
        if !self.state.subscribed {
            self.state.subscribed = true;
            let inner = &mut self.inner;
            self.state
                .deliver(|| inner.on_subscribe(Arc::new(EmptySubscription)));
        }
    }
}

impl CompletableSubscriber for GuardedCompletableSubscriber {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        if !self.state.accept_subscribe(|| cancellable.cancel()) {
            return;
        }
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_subscribe(cancellable));
    }

    fn on_error(&mut self, cause: Cause) {
        if !self.state.accept_terminal("on_error") {
            return;
        }
        self.subscribe_empty_if_needed();
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_error(cause));
    }

    fn on_complete(&mut self) {
        if !self.state.accept_terminal("on_complete") {
            return;
        }
        self.subscribe_empty_if_needed();
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_complete());
    }
}

impl Drop for GuardedCompletableSubscriber {
    fn drop(&mut self) {
        if self.state.must_fail_on_drop() {
            self.on_error(source_panicked());
        }
    }
}

pub(crate) struct GuardedSingleSubscriber<T> {
    inner: BoxSingleSubscriber<T>,
    state: GuardState,
}

impl<T> GuardedSingleSubscriber<T> {
    pub(crate) fn new(inner: BoxSingleSubscriber<T>, in_signal: SignalFlag) -> Self {
        GuardedSingleSubscriber {
            inner,
            state: GuardState::new(in_signal),
        }
    }

    fn subscribe_empty_if_needed(&mut self) {
        if !self.state.subscribed {
            self.state.subscribed = true;
            let inner = &mut self.inner;
            self.state
                .deliver(|| inner.on_subscribe(Arc::new(EmptySubscription)));
        }
    }
}

impl<T> SingleSubscriber<T> for GuardedSingleSubscriber<T> {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        if !self.state.accept_subscribe(|| cancellable.cancel()) {
            return;
        }
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_subscribe(cancellable));
    }

    fn on_success(&mut self, value: T) {
        if !self.state.accept_terminal("on_success") {
            return;
        }
        self.subscribe_empty_if_needed();
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_success(value));
    }

    fn on_error(&mut self, cause: Cause) {
        if !self.state.accept_terminal("on_error") {
            return;
        }
        self.subscribe_empty_if_needed();
        let inner = &mut self.inner;
        self.state.deliver(|| inner.on_error(cause));
    }
}

impl<T> Drop for GuardedSingleSubscriber<T> {
    fn drop(&mut self) {
        if self.state.must_fail_on_drop() {
            self.on_error(source_panicked());
        }
    }
}
