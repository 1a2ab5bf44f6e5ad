use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use rxr_streams::{BoxSubscriber, Cancellable, Cause, Publisher, Subscriber, Subscription};

/// Raw subscription recording what the subscriber asked for.
#[derive(Default)]
pub struct TestSubscription {
    requested: Mutex<Vec<i64>>,
    cancels: AtomicUsize,
}

impl TestSubscription {
    pub fn requested(&self) -> Vec<i64> {
        self.requested.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl Cancellable for TestSubscription {
    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

impl Subscription for TestSubscription {
    fn request(&self, n: i64) {
        self.requested.lock().unwrap().push(n);
    }
}

/// Publisher driven by the test. It keeps the subscriber it was given and
/// lets the test deliver signals to it one by one.
pub struct TestPublisher<T> {
    subscriber: Arc<Mutex<Option<BoxSubscriber<T>>>>,
}

impl<T> Clone for TestPublisher<T> {
    fn clone(&self) -> Self {
        TestPublisher {
            subscriber: Arc::clone(&self.subscriber),
        }
    }
}

impl<T: Send + 'static> TestPublisher<T> {
    pub fn new() -> Self {
        TestPublisher {
            subscriber: Arc::new(Mutex::new(None)),
        }
    }

    /// Delivers `on_subscribe` with a fresh [`TestSubscription`].
    pub fn start(&self) -> Arc<TestSubscription> {
        let subscription = Arc::new(TestSubscription::default());
        let handle = Arc::clone(&subscription) as Arc<dyn Subscription>;
        self.with_subscriber(|s| s.on_subscribe(handle));
        subscription
    }

    pub fn next(&self, item: T) {
        self.with_subscriber(|s| s.on_next(item));
    }

    pub fn complete(&self) {
        self.with_subscriber(|s| s.on_complete());
    }

    pub fn error(&self, cause: Cause) {
        self.with_subscriber(|s| s.on_error(cause));
    }

    fn with_subscriber(&self, f: impl FnOnce(&mut BoxSubscriber<T>)) {
        let mut subscriber = self.subscriber.lock().unwrap();
        let subscriber = subscriber.as_mut().expect("publisher was not subscribed");
        f(subscriber);
    }
}

impl<T: Send + 'static> Publisher for TestPublisher<T> {
    type Item = T;

    fn handle_subscribe(&self, subscriber: BoxSubscriber<T>) {
        *self.subscriber.lock().unwrap() = Some(subscriber);
    }
}
