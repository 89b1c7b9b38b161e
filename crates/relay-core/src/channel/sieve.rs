#![forbid(unsafe_code)]

//! De-duplication is opt-in. These operators compare consecutive values and
//! drop the ones a predicate rejects.

use std::sync::Arc;

use parking_lot::Mutex;

use super::Channel;
use crate::mutation::Mutation;
use crate::queue::Receiver;

impl<S, T: Send + 'static> Channel<S, Mutation<T>> {
    /// Keep a mutation only if `predicate(old, new)` holds. Replay pulses
    /// (no `old`) always pass.
    pub fn sieve(self, predicate: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        self.filter(move |m| m.old.as_ref().is_none_or(|old| predicate(old, &m.new)))
    }

    /// The current value of each mutation.
    pub fn new_values(self) -> Channel<S, T> {
        self.map(|m| m.new)
    }

    /// The previous value of each mutation; replay pulses are skipped.
    pub fn old_values(self) -> Channel<S, T> {
        self.filter_map(|m| m.old)
    }
}

impl<S, T: PartialEq + Send + 'static> Channel<S, Mutation<T>> {
    /// Drop mutations whose value did not change.
    pub fn changes(self) -> Self {
        self.sieve(|old, new| old != new)
    }
}

impl<S, P: Clone + Send + 'static> Channel<S, P> {
    /// Pair each pulse with the last pulse this receiver saw, as a
    /// [`Mutation`], keeping it only if `predicate(previous, current)` holds.
    /// The first pulse has no previous value and always passes. The
    /// comparison base advances on every pulse, kept or not.
    pub fn presieve(
        self,
        predicate: impl Fn(&P, &P) -> bool + Send + Sync + 'static,
    ) -> Channel<S, Mutation<P>> {
        let predicate = Arc::new(predicate);
        self.lift(move |downstream: Receiver<Mutation<P>>| {
            let predicate = Arc::clone(&predicate);
            let last: Mutex<Option<P>> = Mutex::new(None);
            Arc::new(move |pulse: P| {
                let previous = last.lock().replace(pulse.clone());
                let keep = previous
                    .as_ref()
                    .is_none_or(|previous| predicate(previous, &pulse));
                if keep {
                    downstream(Mutation::new(previous, pulse));
                }
            })
        })
    }
}

impl<S, P: Clone + PartialEq + Send + 'static> Channel<S, P> {
    /// Drop pulses equal to the one before.
    pub fn distinct(self) -> Self {
        self.presieve(|previous, current| previous != current)
            .new_values()
    }
}
