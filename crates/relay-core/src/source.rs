#![forbid(unsafe_code)]

//! Contracts for things a [`Channel`](crate::Channel) can be rooted in.
//!
//! - [`StateSource`]: a readable, writable value that announces every write
//!   as a [`Mutation`] and replays its current value on subscribe.
//! - [`EventSource`]: a push-style emitter with raw listener registration and
//!   no notion of a current value.
//!
//! Platform adapters (property observers, notification centers, widget
//! bindings) live outside this crate and plug in by implementing one of these.

use crate::mutation::Mutation;
use crate::queue::Receiver;
use crate::receipt::Receipt;

/// A value that can be read, written, and observed.
pub trait StateSource: Clone + Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;

    /// Current value.
    fn get(&self) -> Self::Value;

    /// Store `value` and announce the transition.
    fn set(&self, value: Self::Value);

    /// Read-modify-write. Implementations that can make this atomic should
    /// override it; the default is a plain `get` followed by `set`.
    ///
    /// `f` may read this source; implementations must not hold a lock on the
    /// value while it runs.
    fn modify(&self, f: impl FnOnce(Self::Value) -> Self::Value) {
        let current = self.get();
        self.set(f(current));
    }

    /// Register `receiver`. It is called once immediately with
    /// `Mutation { old: None, new: current }`, then once per write.
    fn subscribe(&self, receiver: Receiver<Mutation<Self::Value>>) -> Receipt;
}

/// A push-style emitter that can register and unregister raw listeners.
pub trait EventSource: Clone + Send + Sync + 'static {
    type Event: Send + 'static;
    type ListenerId: Send + 'static;

    fn add_listener(&self, listener: Receiver<Self::Event>) -> Self::ListenerId;

    fn remove_listener(&self, id: Self::ListenerId);
}
