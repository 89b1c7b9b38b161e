#![forbid(unsafe_code)]

//! The foundational state cell.
//!
//! A [`Transceiver<T>`] owns a value and a [`ReceiverQueue`] of
//! [`Mutation<T>`] pulses. Cloning a transceiver yields another handle to the
//! same cell.
//!
//! # Invariants
//!
//! 1. Every write emits exactly one `Mutation { old: Some(previous), new }`,
//!    after the value has been stored. A receiver reading the cell sees `new`,
//!    or a later value written back by a receiver called before it; that
//!    write-back's mutation reaches it next.
//! 2. A new subscriber is called once with `Mutation { old: None, new: current }`
//!    before it is registered for future writes.
//! 3. Writes are never deduplicated: storing an equal value still emits.
//! 4. The version increments exactly once per write.
//!
//! The stored value sits behind its own short-lived mutex which is never held
//! while a receiver or a `modify` closure runs. Writes, replays, and dispatch are serialized by the
//! queue's dispatch lock, so a write from another thread cannot slip between
//! a subscriber's replay and its registration.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::channel::Channel;
use crate::config::QueueConfig;
use crate::lock::Lock;
use crate::mutation::Mutation;
use crate::queue::{Receiver, ReceiverQueue};
use crate::receipt::Receipt;
use crate::source::StateSource;

struct TransceiverInner<T> {
    value: Mutex<T>,
    version: AtomicU64,
    queue: Arc<ReceiverQueue<Mutation<T>>>,
}

/// A shared, observable, writable value.
pub struct Transceiver<T> {
    inner: Arc<TransceiverInner<T>>,
}

impl<T> Clone for Transceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Transceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transceiver")
            .field("value", &*self.inner.value.lock())
            .field("version", &self.version())
            .field("receivers", &self.inner.queue.len())
            .finish()
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Transceiver<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Transceiver<T> {
    /// Number of writes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Number of live receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.inner.queue.len()
    }

    /// Emissions dropped by the re-entrancy cutoff.
    #[must_use]
    pub fn reentrant_drops(&self) -> u64 {
        self.inner.queue.reentrant_drops()
    }

    /// Borrow the current value without cloning.
    ///
    /// `f` must not write to this transceiver; doing so deadlocks.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.lock())
    }

    /// Whether both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + Send + Sync + 'static> Transceiver<T> {
    /// Create a cell using the default queue configuration.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_config(value, QueueConfig::default())
    }

    #[must_use]
    pub fn with_config(value: T, config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(TransceiverInner {
                value: Mutex::new(value),
                version: AtomicU64::new(0),
                queue: Arc::new(ReceiverQueue::new(config)),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.lock().clone()
    }

    /// Store `value` and emit the transition.
    pub fn set(&self, value: T) {
        self.modify(|_| value);
    }

    /// Replace the value with `f(current)` atomically with respect to other
    /// writers, then emit the transition.
    ///
    /// `f` runs without the value lock held, so it may read this cell (or a
    /// channel focused on it).
    pub fn modify(&self, f: impl FnOnce(T) -> T) {
        let queue = &self.inner.queue;
        let _guard = queue.lock().lock();
        let current = self.inner.value.lock().clone();
        let new = f(current);
        let old = std::mem::replace(&mut *self.inner.value.lock(), new.clone());
        let mutation = Mutation::new(Some(old), new);
        self.inner.version.fetch_add(1, Ordering::AcqRel);
        queue.receive(mutation);
    }

    /// Replay the current value to `receiver`, then register it.
    pub fn subscribe(&self, receiver: Receiver<Mutation<T>>) -> Receipt {
        let queue = &self.inner.queue;
        let _guard = queue.lock().lock();
        receiver(Mutation::replay(self.get()));
        queue.register(receiver)
    }

    /// Root channel over this cell.
    #[must_use]
    pub fn channel(&self) -> Channel<Self, Mutation<T>> {
        Channel::from_state(self.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> StateSource for Transceiver<T> {
    type Value = T;

    fn get(&self) -> T {
        Transceiver::get(self)
    }

    fn set(&self, value: T) {
        Transceiver::set(self, value);
    }

    fn modify(&self, f: impl FnOnce(T) -> T) {
        Transceiver::modify(self, f);
    }

    fn subscribe(&self, receiver: Receiver<Mutation<T>>) -> Receipt {
        Transceiver::subscribe(self, receiver)
    }
}
