#![forbid(unsafe_code)]

//! A bare push source: values go in with [`Emitter::emit`] and fan out to
//! every listener. There is no current value and nothing is replayed.

use std::sync::Arc;

use crate::channel::Channel;
use crate::config::QueueConfig;
use crate::queue::{Receiver, ReceiverQueue, ReceiverToken};
use crate::source::EventSource;

/// A cloneable handle to a [`ReceiverQueue`] that anyone can push into.
pub struct Emitter<T> {
    queue: Arc<ReceiverQueue<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").field("queue", &self.queue).finish()
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::with_config(QueueConfig::default())
    }
}

impl<T> Emitter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            queue: Arc::new(ReceiverQueue::new(config)),
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn reentrant_drops(&self) -> u64 {
        self.queue.reentrant_drops()
    }
}

impl<T: Clone> Emitter<T> {
    /// Push `value` to every listener.
    pub fn emit(&self, value: T) {
        self.queue.receive(value);
    }
}

impl<T: Clone + Send + 'static> Emitter<T> {
    /// Channel over this emitter. The channel's source is the emitter itself,
    /// so `channel.source().emit(..)` feeds it.
    #[must_use]
    pub fn channel(&self) -> Channel<Self, T> {
        Channel::from_events(self.clone())
    }
}

impl<T: Send + 'static> EventSource for Emitter<T> {
    type Event = T;
    type ListenerId = ReceiverToken;

    fn add_listener(&self, listener: Receiver<T>) -> ReceiverToken {
        self.queue.add(listener)
    }

    fn remove_listener(&self, id: ReceiverToken) {
        self.queue.remove(id);
    }
}
