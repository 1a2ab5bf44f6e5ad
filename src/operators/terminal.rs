use std::{
    mem,
    ops::ControlFlow,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use crate::errors::{panic_message, Cause, StreamError};
use crate::subscriber::{
    BoxCompletableSubscriber, BoxSingleSubscriber, CompletableSubscriber, SingleSubscriber,
    Subscriber,
};
use crate::subscription::{Cancellable, ConcurrentSubscription, Subscription};

use super::Accumulator;

/// Downstream end of a [`TerminalAdapter`].
pub(crate) trait TerminalSink<O>: Send {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>);
    fn on_success(&mut self, value: O);
    fn on_error(&mut self, cause: Cause);
}

impl TerminalSink<()> for BoxCompletableSubscriber {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        CompletableSubscriber::on_subscribe(self.as_mut(), cancellable);
    }

    fn on_success(&mut self, (): ()) {
        self.on_complete();
    }

    fn on_error(&mut self, cause: Cause) {
        CompletableSubscriber::on_error(self.as_mut(), cause);
    }
}

impl<T> TerminalSink<T> for BoxSingleSubscriber<T> {
    fn on_subscribe(&mut self, cancellable: Arc<dyn Cancellable>) {
        SingleSubscriber::on_subscribe(self.as_mut(), cancellable);
    }

    fn on_success(&mut self, value: T) {
        SingleSubscriber::on_success(self.as_mut(), value);
    }

    fn on_error(&mut self, cause: Cause) {
        SingleSubscriber::on_error(self.as_mut(), cause);
    }
}

/// Subscriber that folds a publisher into a terminal sink.
pub(crate) struct TerminalAdapter<A, D> {
    accumulator: Option<A>,
    downstream: D,
    upstream: Option<Arc<ConcurrentSubscription>>,
    done: bool,
}

impl<A, D> TerminalAdapter<A, D> {
    pub(crate) fn new(accumulator: A, downstream: D) -> Self {
        TerminalAdapter {
            accumulator: Some(accumulator),
            downstream,
            upstream: None,
            done: false,
        }
    }

    /// Marks the adapter done. Returns `true` if the downstream still expects
    /// a terminal signal.
    fn terminate(&mut self) -> bool {
        if mem::replace(&mut self.done, true) {
            return false;
        }
        let cancelled = self.upstream.as_ref().is_some_and(|s| s.is_cancelled());
        if cancelled {
            tracing::debug!("downstream cancelled, terminal signal suppressed");
        }
        !cancelled
    }

    fn cancel_upstream(&self) {
        if let Some(upstream) = &self.upstream {
            upstream.cancel();
        }
    }
}

impl<T, A, D> Subscriber<T> for TerminalAdapter<A, D>
where
    A: Accumulator<T>,
    D: TerminalSink<A::Output>,
{
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        let upstream = ConcurrentSubscription::wrap(subscription);
        self.upstream = Some(Arc::clone(&upstream));
        let demand = self
            .accumulator
            .as_ref()
            .map_or(0, |a| a.initial_demand());

        self.downstream
            .on_subscribe(Arc::clone(&upstream) as Arc<dyn Cancellable>);
        if demand > 0 {
            upstream.request(demand);
        }
    }

    fn on_next(&mut self, item: T) {
        if self.done {
            return;
        }
        let Some(accumulator) = self.accumulator.as_mut() else {
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| accumulator.accept(item))) {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => {
                let deliver = self.terminate();
                self.cancel_upstream();
                if deliver {
                    finish::<T, _, _>(&mut self.accumulator, &mut self.downstream);
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(panic = %message, "accumulator panicked, cancelling upstream");
                self.accumulator = None;
                let deliver = self.terminate();
                self.cancel_upstream();
                if deliver {
                    self.downstream
                        .on_error(StreamError::OperatorPanicked(message).into_cause());
                }
            }
        }
    }

    fn on_error(&mut self, cause: Cause) {
        if self.terminate() {
            self.accumulator = None;
            self.downstream.on_error(cause);
        }
    }

    fn on_complete(&mut self) {
        if self.terminate() {
            finish::<T, _, _>(&mut self.accumulator, &mut self.downstream);
        }
    }
}

fn finish<T, A, D>(accumulator: &mut Option<A>, downstream: &mut D)
where
    A: Accumulator<T>,
    D: TerminalSink<A::Output>,
{
    let Some(accumulator) = accumulator.take() else {
        return;
    };
    match panic::catch_unwind(AssertUnwindSafe(|| accumulator.finish())) {
        Ok(value) => downstream.on_success(value),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(panic = %message, "accumulator panicked while finishing");
            downstream.on_error(StreamError::OperatorPanicked(message).into_cause());
        }
    }
}
