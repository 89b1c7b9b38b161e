#![forbid(unsafe_code)]

//! Read/write access through a channel's source, and two-way binding.

use std::sync::Arc;

use super::Channel;
use crate::mutation::Mutation;
use crate::receipt::Receipt;
use crate::source::StateSource;

impl<S: StateSource, P> Channel<S, P> {
    /// Current value of the source.
    #[must_use]
    pub fn value(&self) -> S::Value {
        self.source.get()
    }

    /// Write through to the source.
    pub fn set_value(&self, value: S::Value) {
        self.source.set(value);
    }

    /// Read-modify-write through to the source.
    pub fn modify(&self, f: impl FnOnce(S::Value) -> S::Value) {
        self.source.modify(f);
    }
}

impl<S> Channel<S, Mutation<S::Value>>
where
    S: StateSource,
    S::Value: PartialEq,
{
    /// Bind two state channels so a write to either is copied to the other.
    ///
    /// On link, `self`'s current value is pushed into `other`. A write is only
    /// forwarded when the target holds a different value, which ends the echo
    /// after one round trip; the queue's re-entrancy cutoff bounds anything
    /// an operator in between might still bounce back.
    pub fn link<S2>(&self, other: &Channel<S2, Mutation<S::Value>>) -> Receipt
    where
        S2: StateSource<Value = S::Value>,
    {
        let forward = {
            let target = other.source.clone();
            self.receive_with(Arc::new(move |m: Mutation<S::Value>| {
                copy_into(&target, m.new);
            }))
        };
        let backward = {
            let target = self.source.clone();
            other.receive_with(Arc::new(move |m: Mutation<S::Value>| {
                copy_into(&target, m.new);
            }))
        };
        Receipt::all([forward, backward])
    }
}

fn copy_into<S: StateSource>(target: &S, value: S::Value)
where
    S::Value: PartialEq,
{
    if target.get() != value {
        target.set(value);
    }
}
