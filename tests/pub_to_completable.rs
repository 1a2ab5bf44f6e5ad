mod custom_error;
mod logging;
mod register_emissions;
mod test_publisher;

use custom_error::custom_cause;
use register_emissions::register_completable_subscriber;
use test_publisher::TestPublisher;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier, Mutex,
    },
    thread,
};

use rxr_streams::{
    publisher, Cancellable, CompletableExt, CompletableSubscriber, PublisherExt, StreamError,
    UNBOUNDED,
};

#[test]
fn completes_once_after_all_elements() {
    logging::init();
    let (subscriber, terminals) = register_completable_subscriber();

    publisher::from_iter(vec!["a", "b", "c"])
        .ignore_elements()
        .subscribe(subscriber);

    assert_eq!(terminals.completes(), 1, "expected exactly one completion");
    assert!(terminals.errors().is_empty());
}

#[test]
fn observed_signals_are_subscribe_then_complete() {
    logging::init();

    #[derive(Debug, PartialEq)]
    enum Signal {
        Subscribe,
        Error,
        Complete,
    }

    struct Recording(Arc<Mutex<Vec<Signal>>>);

    impl CompletableSubscriber for Recording {
        fn on_subscribe(&mut self, _: Arc<dyn Cancellable>) {
            self.0.lock().unwrap().push(Signal::Subscribe);
        }

        fn on_error(&mut self, _: rxr_streams::Cause) {
            self.0.lock().unwrap().push(Signal::Error);
        }

        fn on_complete(&mut self) {
            self.0.lock().unwrap().push(Signal::Complete);
        }
    }

    let upstream = TestPublisher::<i32>::new();
    let signals = Arc::new(Mutex::new(Vec::new()));
    upstream
        .clone()
        .ignore_elements()
        .subscribe(Recording(Arc::clone(&signals)));

    let subscription = upstream.start();
    assert_eq!(subscription.requested(), vec![UNBOUNDED]);

    for v in 1..=3 {
        upstream.next(v);
    }
    upstream.complete();

    assert_eq!(
        *signals.lock().unwrap(),
        vec![Signal::Subscribe, Signal::Complete]
    );
}

#[test]
fn upstream_error_is_forwarded_without_completion() {
    logging::init();
    let upstream = TestPublisher::<&str>::new();
    let (subscriber, terminals) = register_completable_subscriber();
    upstream.clone().ignore_elements().subscribe(subscriber);

    upstream.start();
    upstream.next("a");
    upstream.error(custom_cause("E"));
    upstream.complete();

    assert_eq!(terminals.completes(), 0);
    assert_eq!(terminals.errors(), vec!["custom error: E".to_string()]);
}

#[test]
fn cancel_before_complete_prevents_completion() {
    logging::init();
    let upstream = TestPublisher::<i32>::new();
    let (subscriber, terminals) = register_completable_subscriber();
    let cancel = subscriber.cancel_handle();
    upstream.clone().ignore_elements().subscribe(subscriber);

    let subscription = upstream.start();
    upstream.next(1);
    cancel.cancel();
    cancel.cancel();
    upstream.next(2);
    upstream.complete();

    assert_eq!(subscription.cancels(), 1, "cancel must reach upstream once");
    assert_eq!(terminals.total(), 0);
}

#[test]
fn cancel_before_upstream_subscribes_is_applied_later() {
    logging::init();
    let upstream = TestPublisher::<u8>::new();
    let (subscriber, terminals) = register_completable_subscriber();
    let cancel = subscriber.cancel_handle();
    upstream.clone().ignore_elements().subscribe(subscriber);

    cancel.cancel();
    let subscription = upstream.start();
    upstream.complete();

    assert_eq!(subscription.cancels(), 1);
    assert_eq!(terminals.total(), 0);
}

#[test]
fn empty_and_failed_publishers() {
    logging::init();
    let (subscriber, terminals) = register_completable_subscriber();
    publisher::empty::<u8>().ignore_elements().subscribe(subscriber);
    assert_eq!(terminals.completes(), 1);

    let (subscriber, terminals) = register_completable_subscriber();
    publisher::failed::<u8>(StreamError::Abandoned.into_cause())
        .ignore_elements()
        .subscribe(subscriber);
    assert_eq!(terminals.completes(), 0);
    assert_eq!(terminals.errors(), vec![StreamError::Abandoned.to_string()]);
}

#[test]
fn concurrent_cancel_reaches_upstream_once() {
    logging::init();
    for _ in 0..50 {
        let upstream = TestPublisher::<i32>::new();
        let (subscriber, terminals) = register_completable_subscriber();
        let cancel = subscriber.cancel_handle();
        upstream.clone().ignore_elements().subscribe(subscriber);
        let subscription = upstream.start();

        let barrier = Arc::new(Barrier::new(9));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cancel = Arc::clone(&cancel);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cancel.cancel();
                })
            })
            .collect();

        barrier.wait();
        for v in 0..100 {
            upstream.next(v);
        }
        for h in handles {
            h.join().unwrap();
        }
        upstream.complete();

        assert_eq!(subscription.cancels(), 1);
        assert_eq!(terminals.total(), 0);
    }
}

#[test]
fn converted_completable_can_be_subscribed_repeatedly() {
    logging::init();
    let completable = publisher::from_iter(1..=3).ignore_elements();
    let completions = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let completions = Arc::clone(&completions);
        completable.subscribe(rxr_streams::FnCompletableSubscriber::new(
            |e| panic!("unexpected error {}", e),
            move || {
                completions.fetch_add(1, Ordering::SeqCst);
            },
        ));
    }

    assert_eq!(completions.load(Ordering::SeqCst), 3);
}
