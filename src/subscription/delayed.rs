use std::{mem, sync::Arc};

use parking_lot::Mutex;

use super::Cancellable;

enum Slot {
    Empty,
    Set(Arc<dyn Cancellable>),
    Cancelled,
}

/// A [`Cancellable`] whose target is only known later.
///
/// Useful when a handle must be returned before the source delivered
/// `on_subscribe`. Cancelling before the target arrives cancels the target as
/// soon as [`set_delayed`](Self::set_delayed) is called.
pub struct DelayedCancellable {
    slot: Mutex<Slot>,
}

impl DelayedCancellable {
    pub fn new() -> Self {
        DelayedCancellable {
            slot: Mutex::new(Slot::Empty),
        }
    }

    /// Sets the target. Only the first target is kept; later ones are
    /// cancelled right away.
    pub fn set_delayed(&self, cancellable: Arc<dyn Cancellable>) {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Empty) {
            *slot = Slot::Set(cancellable);
            return;
        }
        let cancelled = matches!(*slot, Slot::Cancelled);
        drop(slot);
        if !cancelled {
            tracing::warn!("delayed cancellable already has a target, cancelling the new one");
        }
        cancellable.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Cancelled)
    }
}

impl Default for DelayedCancellable {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellable for DelayedCancellable {
    fn cancel(&self) {
        let previous = mem::replace(&mut *self.slot.lock(), Slot::Cancelled);
        if let Slot::Set(target) = previous {
            target.cancel();
        }
    }
}
