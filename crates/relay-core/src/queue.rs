#![forbid(unsafe_code)]

//! Ordered fan-out of values to registered receivers.
//!
//! # Design
//!
//! A [`ReceiverQueue<T>`] keeps its receivers in a map keyed by a
//! monotonically increasing index, so registration order is iteration order
//! and indices are never reused. Dispatch iterates over a snapshot of the
//! map; before each call the receiver's index is checked against the live
//! map, which makes removal during dispatch safe and immediate.
//!
//! # Re-entrancy
//!
//! A receiver may synchronously push a value back into the queue that is
//! calling it. Such a nested emission is not delivered on the spot: it is
//! queued behind the emission in flight and delivered once every receiver
//! has seen the current one, so all receivers observe emissions in the same
//! order. Each queued emission carries a level, one more than the emission
//! that caused it; a level past `max_depth + 1` is dropped and
//! [`ReceiverQueue::reentrant_drops`] is incremented. With the default
//! `max_depth` of 1, a write-back from inside a receiver is delivered once and
//! a write-back from inside *that* delivery is dropped.
//!
//! # Invariants
//!
//! 1. Receivers are invoked in registration order for every emission, and
//!    every receiver sees the emissions of one queue in the same order.
//! 2. The entrancy counter, the current level and the pending list are
//!    restored on every exit path, unwinding included.
//! 3. A receiver removed before its turn in the current dispatch is skipped.
//! 4. Registering while a dispatch is in flight on the same thread is a
//!    programmer error (panics in debug builds).

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::QueueConfig;
use crate::error::{RelayError, Result};
use crate::lock::{DispatchLock, Lock};
use crate::receipt::Receipt;

/// A shared receiver callback.
pub type Receiver<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Opaque handle for one registration in a [`ReceiverQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceiverToken(u64);

impl ReceiverToken {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

struct Registry<T> {
    next_index: u64,
    receivers: BTreeMap<u64, Receiver<T>>,
}

/// Decrements the entrancy counter when dispatch exits.
struct EntrancyExit<'a>(&'a AtomicUsize);

impl Drop for EntrancyExit<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Resets the drain state of the outermost dispatch when it exits.
struct DrainExit<'a, T> {
    level: &'a AtomicUsize,
    pending: &'a Mutex<VecDeque<(usize, T)>>,
}

impl<T> Drop for DrainExit<'_, T> {
    fn drop(&mut self) {
        self.level.store(0, Ordering::Release);
        self.pending.lock().clear();
    }
}

/// An ordered registry of receivers for one emission point.
pub struct ReceiverQueue<T> {
    config: QueueConfig,
    lock: DispatchLock,
    registry: Mutex<Registry<T>>,
    entrancy: AtomicUsize,
    /// Level of the emission being delivered; 0 when idle.
    level: AtomicUsize,
    pending: Mutex<VecDeque<(usize, T)>>,
    reentrant_drops: AtomicU64,
}

impl<T> Default for ReceiverQueue<T> {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl<T> std::fmt::Debug for ReceiverQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverQueue")
            .field("receivers", &self.len())
            .field("depth", &self.depth())
            .field("reentrant_drops", &self.reentrant_drops())
            .field("config", &self.config)
            .finish()
    }
}

impl<T> ReceiverQueue<T> {
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        Self {
            lock: config.lock.build(),
            config,
            registry: Mutex::new(Registry {
                next_index: 0,
                receivers: BTreeMap::new(),
            }),
            entrancy: AtomicUsize::new(0),
            level: AtomicUsize::new(0),
            pending: Mutex::new(VecDeque::new()),
            reentrant_drops: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// The dispatch lock. Held for the whole of every [`receive`](Self::receive).
    pub fn lock(&self) -> &DispatchLock {
        &self.lock
    }

    /// Number of registered receivers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.lock().receivers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of dispatches currently in flight.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entrancy.load(Ordering::Acquire)
    }

    /// Emissions dropped by the re-entrancy cutoff since creation.
    #[must_use]
    pub fn reentrant_drops(&self) -> u64 {
        self.reentrant_drops.load(Ordering::Relaxed)
    }

    fn insert(&self, receiver: Receiver<T>) -> ReceiverToken {
        let mut registry = self.registry.lock();
        let index = registry.next_index;
        registry.next_index += 1;
        registry.receivers.insert(index, receiver);
        tracing::trace!(token = index, receivers = registry.receivers.len(), "receiver added");
        ReceiverToken(index)
    }

    /// Register a receiver, failing if a dispatch is in flight.
    pub fn try_add(&self, receiver: Receiver<T>) -> Result<ReceiverToken> {
        let _guard = self.lock.lock();
        let depth = self.depth();
        if depth > 0 {
            return Err(RelayError::AddDuringDispatch { depth });
        }
        Ok(self.insert(receiver))
    }

    /// Register a receiver.
    ///
    /// # Panics
    ///
    /// In debug builds, panics when called from inside a dispatch of this
    /// queue. Release builds log a warning and register anyway; the new
    /// receiver does not see the value currently in flight.
    pub fn add(&self, receiver: Receiver<T>) -> ReceiverToken {
        let _guard = self.lock.lock();
        let depth = self.depth();
        debug_assert_eq!(
            depth, 0,
            "cannot add a receiver while the queue is dispatching"
        );
        if depth > 0 {
            tracing::warn!(depth, "receiver registered during dispatch");
        }
        self.insert(receiver)
    }

    /// Deregister a receiver. Safe at any time, including mid-dispatch.
    /// Returns whether the token was still registered.
    pub fn remove(&self, token: ReceiverToken) -> bool {
        let _guard = self.lock.lock();
        let mut registry = self.registry.lock();
        let removed = registry.receivers.remove(&token.0).is_some();
        if removed {
            tracing::trace!(
                token = token.0,
                receivers = registry.receivers.len(),
                "receiver removed"
            );
        }
        removed
    }

    /// Deregister every receiver.
    pub fn clear(&self) {
        let _guard = self.lock.lock();
        self.registry.lock().receivers.clear();
    }

    fn is_live(&self, index: u64) -> bool {
        self.registry.lock().receivers.contains_key(&index)
    }
}

impl<T: Clone> ReceiverQueue<T> {
    /// Deliver `value` to every receiver in registration order.
    ///
    /// Called from inside one of this queue's receivers, the value is queued
    /// and delivered after the emission in flight has reached every receiver.
    pub fn receive(&self, value: T) {
        let _guard = self.lock.lock();
        let depth = self.entrancy.fetch_add(1, Ordering::AcqRel) + 1;
        let _exit = EntrancyExit(&self.entrancy);

        if depth > 1 {
            let level = self.level.load(Ordering::Acquire) + 1;
            if level > self.config.delivery_limit() {
                let drops = self.reentrant_drops.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(
                    depth = level,
                    max_depth = self.config.max_depth,
                    drops,
                    "reentrant emission dropped"
                );
                return;
            }
            self.pending.lock().push_back((level, value));
            return;
        }

        let _drain = DrainExit {
            level: &self.level,
            pending: &self.pending,
        };
        let mut next = Some((1, value));
        while let Some((level, value)) = next {
            self.level.store(level, Ordering::Release);
            self.deliver(value);
            next = self.pending.lock().pop_front();
        }
    }

    fn deliver(&self, value: T) {
        let snapshot: Vec<(u64, Receiver<T>)> = self
            .registry
            .lock()
            .receivers
            .iter()
            .map(|(index, receiver)| (*index, Arc::clone(receiver)))
            .collect();

        for (index, receiver) in snapshot {
            if self.is_live(index) {
                receiver(value.clone());
            }
        }
    }
}

impl<T: Send + 'static> ReceiverQueue<T> {
    /// Register `receiver` and wrap the registration in a [`Receipt`].
    ///
    /// The receipt holds the queue weakly: cancelling after the queue is gone
    /// is a no-op.
    pub fn register(self: &Arc<Self>, receiver: Receiver<T>) -> Receipt {
        let token = self.add(receiver);
        Self::receipt_for(Arc::downgrade(self), token)
    }

    pub(crate) fn receipt_for(queue: Weak<Self>, token: ReceiverToken) -> Receipt {
        Receipt::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue.remove(token);
            }
        })
    }
}
