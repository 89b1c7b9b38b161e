#![forbid(unsafe_code)]

//! Composable pipelines over sources.
//!
//! A [`Channel<S, P>`] pairs a *source* `S` (kept for its read/write
//! capability) with a *reception* closure that, given a receiver for pulses of
//! type `P`, registers it somewhere upstream and returns a [`Receipt`].
//! Every operator is a pure rewrite of that closure:
//!
//! ```text
//! upstream reception:   Fn(Receiver<P>) -> Receipt
//! operator (lift):      Fn(Receiver<U>) -> Receiver<P>
//! derived reception:    |down| upstream(op(down))
//! ```
//!
//! # Invariants
//!
//! 1. Building a channel never registers anything. Side effects happen only
//!    in [`Channel::receive`] (registration) and on emission (dispatch).
//! 2. Per-receiver operator state (counters, latest values, buffers) is
//!    created fresh on each `receive`, so two receivers of one derived channel
//!    never share it.
//! 3. Dispatch is synchronous: a pulse travels through every stage on the
//!    emitting thread before `set`/`emit` returns.
//! 4. Streams never fail. Fallible stages produce `Result` pulses.
//!
//! # Example
//!
//! ```
//! use relay_core::{Mutation, Transceiver};
//! use std::sync::{Arc, Mutex};
//!
//! let cell = Transceiver::new(0);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//!
//! let receipt = cell
//!     .channel()
//!     .changes()
//!     .new_values()
//!     .receive(move |v| sink.lock().unwrap().push(v));
//!
//! cell.set(5);
//! cell.set(5);
//! receipt.cancel();
//! cell.set(6);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![0, 5]);
//! ```

mod combine;
mod dispatch;
mod sequence;
mod sieve;
mod state;

use std::sync::Arc;

use crate::mutation::Mutation;
use crate::queue::Receiver;
use crate::receipt::Receipt;
use crate::source::{EventSource, StateSource};

pub use dispatch::{DispatchOptions, Executor, ImmediateExecutor, Job, ManualExecutor};

/// The registration closure at the heart of a [`Channel`].
pub type Reception<P> = Arc<dyn Fn(Receiver<P>) -> Receipt + Send + Sync>;

/// A source plus a composable stream of pulses.
pub struct Channel<S, P> {
    source: S,
    reception: Reception<P>,
}

impl<S: Clone, P> Clone for Channel<S, P> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            reception: Arc::clone(&self.reception),
        }
    }
}

impl<S: std::fmt::Debug, P> std::fmt::Debug for Channel<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("source", &self.source)
            .field("pulse", &std::any::type_name::<P>())
            .finish()
    }
}

impl<S, P: Send + 'static> Channel<S, P> {
    /// Build a channel from a source and a registration closure.
    pub fn new(
        source: S,
        reception: impl Fn(Receiver<P>) -> Receipt + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            reception: Arc::new(reception),
        }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// The registration closure, for adapters that want to wrap it.
    #[must_use]
    pub fn reception(&self) -> Reception<P> {
        Arc::clone(&self.reception)
    }

    /// Register `receiver` for this channel's pulses.
    pub fn receive(&self, receiver: impl Fn(P) + Send + Sync + 'static) -> Receipt {
        self.receive_with(Arc::new(receiver))
    }

    /// Register an already shared receiver.
    pub fn receive_with(&self, receiver: Receiver<P>) -> Receipt {
        (self.reception)(receiver)
    }

    /// Swap the source for `f(source)` without touching the pulse stream.
    pub fn resource<S2>(self, f: impl FnOnce(S) -> S2) -> Channel<S2, P> {
        Channel {
            source: f(self.source),
            reception: self.reception,
        }
    }

    /// Drop the source, keeping only the stream.
    pub fn erase(self) -> Channel<(), P> {
        self.resource(|_| ())
    }

    /// Rewrite the stream with a receiver transformer.
    ///
    /// `op` runs once per `receive`, turning the downstream receiver into the
    /// one registered upstream. Per-receiver state belongs inside `op`.
    pub fn lift<U: Send + 'static>(
        self,
        op: impl Fn(Receiver<U>) -> Receiver<P> + Send + Sync + 'static,
    ) -> Channel<S, U> {
        let upstream = self.reception;
        Channel {
            source: self.source,
            reception: Arc::new(move |downstream: Receiver<U>| upstream(op(downstream))),
        }
    }

    /// Transform every pulse.
    pub fn map<U: Send + 'static>(
        self,
        f: impl Fn(P) -> U + Send + Sync + 'static,
    ) -> Channel<S, U> {
        let f = Arc::new(f);
        self.lift(move |downstream: Receiver<U>| {
            let f = Arc::clone(&f);
            Arc::new(move |pulse| downstream(f(pulse)))
        })
    }

    /// Transform every pulse with a fallible function. Failures travel
    /// downstream as `Err` pulses; the stream itself keeps going.
    pub fn try_map<U: Send + 'static, E: Send + 'static>(
        self,
        f: impl Fn(P) -> Result<U, E> + Send + Sync + 'static,
    ) -> Channel<S, Result<U, E>> {
        self.map(f)
    }

    /// Drop pulses failing `predicate`.
    pub fn filter(self, predicate: impl Fn(&P) -> bool + Send + Sync + 'static) -> Self {
        let predicate = Arc::new(predicate);
        self.lift(move |downstream: Receiver<P>| {
            let predicate = Arc::clone(&predicate);
            Arc::new(move |pulse| {
                if predicate(&pulse) {
                    downstream(pulse);
                }
            })
        })
    }

    /// Map and filter in one step.
    pub fn filter_map<U: Send + 'static>(
        self,
        f: impl Fn(P) -> Option<U> + Send + Sync + 'static,
    ) -> Channel<S, U> {
        let f = Arc::new(f);
        self.lift(move |downstream: Receiver<U>| {
            let f = Arc::clone(&f);
            Arc::new(move |pulse| {
                if let Some(mapped) = f(pulse) {
                    downstream(mapped);
                }
            })
        })
    }

    /// Run `f` on each pulse before passing it on unchanged.
    pub fn inspect(self, f: impl Fn(&P) + Send + Sync + 'static) -> Self {
        self.filter(move |pulse| {
            f(pulse);
            true
        })
    }
}

impl<S, U: Send + 'static, E: Send + 'static> Channel<S, Result<U, E>> {
    /// Keep only successful pulses.
    pub fn successes(self) -> Channel<S, U> {
        self.filter_map(Result::ok)
    }

    /// Keep only failed pulses.
    pub fn failures(self) -> Channel<S, E> {
        self.filter_map(Result::err)
    }
}

impl<P: Clone + Send + Sync + 'static> Channel<(), P> {
    /// A finite, replay-only channel: every receiver gets each value in order
    /// during `receive`, and the returned receipt is already cancelled.
    pub fn of(values: impl IntoIterator<Item = P>) -> Self {
        let values: Arc<[P]> = values.into_iter().collect();
        Channel::new((), move |receiver: Receiver<P>| {
            for value in values.iter() {
                receiver(value.clone());
            }
            Receipt::cancelled()
        })
    }

    /// A replay-only channel with a single value.
    pub fn just(value: P) -> Self {
        Self::of([value])
    }

    /// A channel that never emits.
    pub fn empty() -> Self {
        Self::of([])
    }
}

impl<S: StateSource> Channel<S, Mutation<S::Value>> {
    /// Root a channel in a state source. Each receiver first gets the replay
    /// pulse, then every subsequent write.
    pub fn from_state(source: S) -> Self {
        let subscriber = source.clone();
        Channel::new(source, move |receiver| subscriber.subscribe(receiver))
    }
}

impl<E: EventSource> Channel<E, E::Event> {
    /// Lift a push-style emitter into a channel. Nothing is replayed.
    pub fn from_events(source: E) -> Self {
        let registrar = source.clone();
        Channel::new(source, move |receiver| {
            let id = registrar.add_listener(receiver);
            let remover = registrar.clone();
            Receipt::new(move || remover.remove_listener(id))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{Emitter, Transceiver};
    use parking_lot::Mutex;

    pub(crate) fn collect<S, P: Clone + Send + 'static>(
        channel: &Channel<S, P>,
    ) -> (Receipt, Arc<Mutex<Vec<P>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let receipt = channel.receive(move |p| sink.lock().push(p));
        (receipt, log)
    }

    #[test]
    fn scenario_without_dedup() {
        let t = Transceiver::new(0);
        let ch = t.channel();
        let (_receipt, log) = collect(&ch);
        t.set(5);
        t.set(5);
        assert_eq!(
            *log.lock(),
            vec![
                Mutation::replay(0),
                Mutation::new(Some(0), 5),
                Mutation::new(Some(5), 5),
            ]
        );
    }

    #[test]
    fn constructing_a_channel_registers_nothing() {
        let t = Transceiver::new(1);
        let derived = t.channel().map(|m| m.new * 2).filter(|v| *v > 0);
        assert_eq!(t.receiver_count(), 0);
        let receipt = derived.receive(|_| {});
        assert_eq!(t.receiver_count(), 1);
        receipt.cancel();
        assert_eq!(t.receiver_count(), 0);
    }

    #[test]
    fn map_transforms_pulses() {
        let t = Transceiver::new(2);
        let (_r, log) = collect(&t.channel().map(|m| m.new * 10));
        t.set(3);
        assert_eq!(*log.lock(), vec![20, 30]);
    }

    #[test]
    fn filter_suppresses_failing_replay() {
        let t = Transceiver::new(1);
        let (_r, log) = collect(&t.channel().new_values().filter(|v| v % 2 == 0));
        t.set(2);
        t.set(3);
        t.set(4);
        assert_eq!(*log.lock(), vec![2, 4]);
    }

    #[test]
    fn try_map_surfaces_failures_without_ending_stream() {
        let t = Transceiver::new("1".to_string());
        let parsed = t.channel().new_values().try_map(|s| s.parse::<i32>());
        let (_r, log) = collect(&parsed.map(|r| r.ok()));
        t.set("x".to_string());
        t.set("7".to_string());
        assert_eq!(*log.lock(), vec![Some(1), None, Some(7)]);
    }

    #[test]
    fn successes_and_failures_split_results() {
        let ch = Channel::of(vec![Ok(1), Err("bad"), Ok(3)]);
        let (_r, ok) = collect(&ch.clone().successes());
        let (_r, err) = collect(&ch.failures());
        assert_eq!(*ok.lock(), vec![1, 3]);
        assert_eq!(*err.lock(), vec!["bad"]);
    }

    #[test]
    fn of_replays_values_and_returns_cancelled_receipt() {
        let ch = Channel::of([1, 2, 3]);
        let (receipt, log) = collect(&ch);
        assert!(receipt.is_cancelled());
        assert_eq!(*log.lock(), vec![1, 2, 3]);
        let (_again, second) = collect(&ch);
        assert_eq!(*second.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_never_emits() {
        let (_r, log) = collect(&Channel::<(), u8>::empty());
        assert!(log.lock().is_empty());
        let (_r, one) = collect(&Channel::just('a'));
        assert_eq!(*one.lock(), vec!['a']);
    }

    #[test]
    fn resource_rebinds_source_but_keeps_stream() {
        let t = Transceiver::new(4);
        let ch = t.channel().resource(|source| (source, "label"));
        assert_eq!(ch.source().1, "label");
        let (_r, log) = collect(&ch);
        ch.source().0.set(5);
        assert_eq!(log.lock().len(), 2);
        let erased = ch.erase();
        let (_r, log) = collect(&erased);
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn from_events_registers_and_removes_listener() {
        let emitter = Emitter::new();
        let ch = Channel::from_events(emitter.clone());
        let (receipt, log) = collect(&ch);
        assert_eq!(emitter.listener_count(), 1);
        emitter.emit(1);
        receipt.cancel();
        assert_eq!(emitter.listener_count(), 0);
        emitter.emit(2);
        assert_eq!(*log.lock(), vec![1]);
    }

    #[test]
    fn inspect_sees_every_pulse() {
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let ch = Channel::of([1, 2, 3]).inspect(move |_| *counter.lock() += 1);
        let (_r, log) = collect(&ch);
        assert_eq!(*seen.lock(), 3);
        assert_eq!(log.lock().len(), 3);
    }

    #[test]
    fn receivers_of_one_channel_are_independent() {
        let t = Transceiver::new(0);
        let ch = t.channel().new_values();
        let (a, a_log) = collect(&ch);
        let (_b, b_log) = collect(&ch);
        t.set(1);
        a.cancel();
        t.set(2);
        assert_eq!(*a_log.lock(), vec![0, 1]);
        assert_eq!(*b_log.lock(), vec![0, 1, 2]);
    }
}
