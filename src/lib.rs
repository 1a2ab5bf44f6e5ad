//! Backpressured reactive streams.
//!
//! The crate provides the subscriber/subscription protocol and three source
//! shapes built on it:
//!
//! - [`Publisher`]: zero or more elements, delivered only within the demand
//!   the subscriber requested, followed by one terminal signal.
//! - [`Completable`]: no elements, only completion or failure.
//! - [`Single`]: exactly one value or a failure.
//!
//! Subscribers receive `on_subscribe` first and at most one terminal signal.
//! Demand is signalled with [`Subscription::request`] and a stream is stopped
//! with [`Cancellable::cancel`]. [`ConcurrentSubscription`] makes any
//! subscription safe to drive from several threads.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use rxr_streams::{publisher, FnCompletableSubscriber, CompletableExt, PublisherExt};
//!
//! let completed = Arc::new(Mutex::new(false));
//! let completed_c = Arc::clone(&completed);
//!
//! publisher::from_iter(vec!["a", "b", "c"])
//!     .ignore_elements()
//!     .subscribe(FnCompletableSubscriber::new(
//!         |e| panic!("unexpected error {}", e),
//!         move || *completed_c.lock().unwrap() = true,
//!     ));
//!
//! assert!(*completed.lock().unwrap());
//! ```
pub mod completable;
pub mod errors;
pub mod future;
pub mod operators;
pub mod publisher;
pub mod single;
pub mod subscriber;
pub mod subscription;

pub use completable::{Completable, CompletableExt};
pub use errors::*;
pub use future::{CompletableFuture, SingleFuture};
pub use publisher::{Publisher, PublisherExt};
pub use single::{Single, SingleExt};
pub use subscriber::*;
pub use subscription::*;
