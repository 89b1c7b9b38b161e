#![forbid(unsafe_code)]

//! Core: receipts, locks, receiver queues, transceivers, and the channel
//! operator algebra.
//!
//! - [`Transceiver`]: a shared, observable value. Every write emits a
//!   [`Mutation`] carrying the old and new value; subscribing replays the
//!   current value first.
//! - [`Emitter`]: a push source with no current value.
//! - [`Channel`]: a source plus a lazily composed pipeline. Nothing is
//!   registered until [`Channel::receive`], which returns a [`Receipt`].
//! - [`ReceiverQueue`]: ordered fan-out with bounded re-entrancy, the
//!   dispatch engine under both sources.
//!
//! Dispatch is synchronous on the emitting thread. Cancellation is explicit:
//! dropping a [`Receipt`] does nothing, while [`Receipt::guard`] gives a
//! scoped handle that cancels on drop.

pub mod channel;
pub mod choice;
pub mod coerce;
pub mod config;
pub mod emitter;
pub mod error;
pub mod lock;
pub mod mutation;
pub mod queue;
pub mod receipt;
pub mod source;
pub mod transceiver;

pub use channel::{
    Channel, DispatchOptions, Executor, ImmediateExecutor, Job, ManualExecutor, Reception,
};
pub use choice::{Choice2, Choice3, Choice4, Choice5, Choice6, FlattenChoice};
pub use coerce::{coerce, from_bool, truthy};
pub use config::{MAX_REENTRANT_DEPTH, QueueConfig};
pub use emitter::Emitter;
pub use error::{RelayError, Result};
pub use lock::{DispatchLock, Lock, LockGuard, LockKind, NoopLock, ReentrantLock};
pub use mutation::Mutation;
pub use queue::{Receiver, ReceiverQueue, ReceiverToken};
pub use receipt::{Receipt, ReceiptGuard};
pub use source::{EventSource, StateSource};
pub use transceiver::Transceiver;
