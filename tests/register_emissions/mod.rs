use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use rxr_streams::{FnCompletableSubscriber, FnSingleSubscriber};

/// Counts the terminal signals received by a subscriber.
#[derive(Default)]
pub struct Terminals {
    completes: AtomicUsize,
    errors: Mutex<Vec<String>>,
}

impl Terminals {
    pub fn completes(&self) -> usize {
        self.completes.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.completes() + self.errors.lock().unwrap().len()
    }
}

pub fn register_completable_subscriber() -> (FnCompletableSubscriber, Arc<Terminals>) {
    let terminals = Arc::new(Terminals::default());
    let terminals_e = Arc::clone(&terminals);
    let terminals_c = Arc::clone(&terminals);

    let subscriber = FnCompletableSubscriber::new(
        move |e| {
            // Track on_error() calls.
            terminals_e.errors.lock().unwrap().push(e.to_string());
        },
        move || {
            // Track on_complete() calls.
            terminals_c.completes.fetch_add(1, Ordering::SeqCst);
        },
    );
    (subscriber, terminals)
}

pub fn register_single_subscriber<T: Send + 'static>(
) -> (FnSingleSubscriber<T>, Arc<Mutex<Vec<T>>>, Arc<Terminals>) {
    let values = Arc::new(Mutex::new(Vec::new()));
    let values_c = Arc::clone(&values);
    let terminals = Arc::new(Terminals::default());
    let terminals_s = Arc::clone(&terminals);
    let terminals_e = Arc::clone(&terminals);

    let subscriber = FnSingleSubscriber::new(
        move |v| {
            values_c.lock().unwrap().push(v);
            terminals_s.completes.fetch_add(1, Ordering::SeqCst);
        },
        move |e| {
            terminals_e.errors.lock().unwrap().push(e.to_string());
        },
    );
    (subscriber, values, terminals)
}
