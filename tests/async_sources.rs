mod custom_error;
mod logging;
mod register_emissions;

use custom_error::custom_cause;
use register_emissions::register_completable_subscriber;

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::{sync::mpsc, time::sleep};

use rxr_streams::{
    completable, publisher, single, BoxCompletableSubscriber, Cancellable, CompletableExt,
    CompletableSubscriber, FnSubscriber, PublisherExt, SingleExt, StreamError, Subscriber,
    Subscription,
};

fn stream_error(cause: &rxr_streams::Cause) -> Option<&StreamError> {
    cause.downcast_ref::<StreamError>()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn from_receiver_collects_until_senders_close() {
    logging::init();
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        for i in 0..20 {
            tx.send(i).await.unwrap();
        }
    });

    let items = publisher::from_receiver(rx)
        .collect_vec()
        .into_future()
        .await
        .unwrap();

    assert_eq!(items, (0..20).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn from_receiver_respects_demand() {
    logging::init();
    let (tx, rx) = mpsc::channel(16);
    for i in 0..10 {
        tx.send(i).await.unwrap();
    }

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_c = Arc::clone(&received);
    let subscriber = FnSubscriber::from_next(move |v: i32| received_c.lock().unwrap().push(v))
        .with_batch(3);
    let cancel = subscriber.cancel_handle();

    publisher::from_receiver(rx).subscribe(subscriber);
    sleep(Duration::from_millis(100)).await;

    // Every full batch requests the next one.
    assert_eq!(*received.lock().unwrap(), (0..10).collect::<Vec<_>>());

    cancel.cancel();
    sleep(Duration::from_millis(20)).await;
    assert!(tx.send(10).await.is_err(), "cancel must drop the receiver");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn from_receiver_waits_for_request() {
    logging::init();

    struct Manual {
        subscription: Arc<Mutex<Option<Arc<dyn Subscription>>>>,
        received: Arc<AtomicUsize>,
    }

    impl Subscriber<u8> for Manual {
        fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
            *self.subscription.lock().unwrap() = Some(subscription);
        }

        fn on_next(&mut self, _: u8) {
            self.received.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&mut self, _: rxr_streams::Cause) {}

        fn on_complete(&mut self) {}
    }

    let (tx, rx) = mpsc::channel(8);
    for i in 0..5 {
        tx.send(i).await.unwrap();
    }
    let subscription = Arc::new(Mutex::new(None));
    let received = Arc::new(AtomicUsize::new(0));

    publisher::from_receiver(rx).subscribe(Manual {
        subscription: Arc::clone(&subscription),
        received: Arc::clone(&received),
    });

    sleep(Duration::from_millis(50)).await;
    assert_eq!(received.load(Ordering::SeqCst), 0, "nothing was requested yet");

    let handle = subscription.lock().unwrap().clone().unwrap();
    handle.request(2);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(received.load(Ordering::SeqCst), 2);

    handle.request(10);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(received.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn from_receiver_allows_one_subscriber() {
    logging::init();
    let (_tx, rx) = mpsc::channel::<u8>(1);
    let source = publisher::from_receiver(rx);

    let first = Arc::new(AtomicBool::new(false));
    let first_c = Arc::clone(&first);
    source.subscribe(FnSubscriber::from_next(|_| {}).with_error(move |_| {
        first_c.store(true, Ordering::SeqCst);
    }));

    let second = source.ignore_elements().into_future().await;
    let err = second.unwrap_err();

    assert!(!first.load(Ordering::SeqCst));
    assert_eq!(stream_error(&err), Some(&StreamError::AlreadySubscribed));
}

#[test]
fn from_receiver_outside_runtime_fails() {
    logging::init();
    let (_tx, rx) = mpsc::channel::<u8>(1);
    let error = Arc::new(Mutex::new(None));
    let error_c = Arc::clone(&error);

    publisher::from_receiver(rx).subscribe(
        FnSubscriber::from_next(|_| {}).with_error(move |e| *error_c.lock().unwrap() = Some(e)),
    );

    let error = error.lock().unwrap().take().unwrap();
    assert_eq!(stream_error(&error), Some(&StreamError::NoRuntime));
}

#[tokio::test]
async fn timer_completes() {
    logging::init();
    let result = completable::timer(Duration::from_millis(10))
        .into_future()
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn cancelled_timer_never_completes() {
    logging::init();
    let (subscriber, terminals) = register_completable_subscriber();
    let cancel = subscriber.cancel_handle();

    completable::timer(Duration::from_millis(20)).subscribe(subscriber);
    cancel.cancel();
    sleep(Duration::from_millis(60)).await;

    assert_eq!(terminals.total(), 0);
}

#[test]
fn timer_outside_runtime_fails() {
    logging::init();
    let (subscriber, terminals) = register_completable_subscriber();

    completable::timer(Duration::from_millis(1)).subscribe(subscriber);

    assert_eq!(terminals.errors(), vec![StreamError::NoRuntime.to_string()]);
}

#[tokio::test]
async fn futures_resolve_with_terminal_signal() {
    logging::init();
    assert!(completable::completed().into_future().await.is_ok());

    let err = completable::failed(custom_cause("late"))
        .into_future()
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "custom error: late");

    assert_eq!(single::succeeded(5u8).into_future().await.unwrap(), 5);
    assert_eq!(
        publisher::from_iter(vec![3, 1, 2]).first().into_future().await.unwrap(),
        Some(3)
    );
}

#[tokio::test]
async fn abandoned_subscriber_resolves_future_with_error() {
    logging::init();
    let source = completable::from_fn(|mut subscriber: BoxCompletableSubscriber| {
        subscriber.on_subscribe(Arc::new(rxr_streams::EmptySubscription));
    });

    let err = source.into_future().await.unwrap_err();
    assert_eq!(stream_error(&err), Some(&StreamError::Abandoned));
}

#[test]
fn dropping_future_cancels_subscription() {
    logging::init();

    struct Flag(Arc<AtomicBool>);

    impl Cancellable for Flag {
        fn cancel(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_c = Arc::clone(&cancelled);
    let kept = Arc::new(Mutex::new(Vec::new()));
    let kept_c = Arc::clone(&kept);

    let source = completable::from_fn(move |mut subscriber: BoxCompletableSubscriber| {
        subscriber.on_subscribe(Arc::new(Flag(Arc::clone(&cancelled_c))));
        // Keeps the subscriber alive without ever terminating it.
        kept_c.lock().unwrap().push(subscriber);
    });

    let future = source.into_future();
    assert!(!cancelled.load(Ordering::SeqCst));
    drop(future);
    assert!(cancelled.load(Ordering::SeqCst));
}
