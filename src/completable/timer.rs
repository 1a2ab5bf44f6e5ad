use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle};

use crate::errors::StreamError;
use crate::subscriber::{deliver_completable_error, BoxCompletableSubscriber};
use crate::subscription::Cancellable;

use super::Completable;

/// Completable that completes after a delay, measured on the Tokio runtime
/// that is current at subscribe time.
///
/// Subscribing outside of a runtime fails with `StreamError::NoRuntime`.
/// Cancelling aborts the timer task.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    delay: Duration,
}

/// Creates a [`Timer`] completable.
pub fn timer(delay: Duration) -> Timer {
    Timer { delay }
}

struct TimerCancellable {
    cancelled: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Cancellable for TimerCancellable {
    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self.task.lock().take() {
            tracing::debug!("aborting timer task");
            task.abort();
        }
    }
}

impl Completable for Timer {
    fn handle_subscribe(&self, mut subscriber: BoxCompletableSubscriber) {
        let Ok(handle) = Handle::try_current() else {
            deliver_completable_error(subscriber.as_mut(), StreamError::NoRuntime.into_cause());
            return;
        };

        let cancellable = Arc::new(TimerCancellable {
            cancelled: AtomicBool::new(false),
            task: Mutex::new(None),
        });
        subscriber.on_subscribe(Arc::clone(&cancellable) as Arc<dyn Cancellable>);
        if cancellable.cancelled.load(Ordering::SeqCst) {
            return;
        }

        let delay = self.delay;
        let state = Arc::clone(&cancellable);
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if !state.cancelled.load(Ordering::SeqCst) {
                subscriber.on_complete();
            }
        });

        *cancellable.task.lock() = Some(task);
        // A cancel racing with the spawn found no task to abort.
        if cancellable.cancelled.load(Ordering::SeqCst) {
            if let Some(task) = cancellable.task.lock().take() {
                task.abort();
            }
        }
    }
}
