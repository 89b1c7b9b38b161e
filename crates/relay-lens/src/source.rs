#![forbid(unsafe_code)]

//! State sources seen through a lens.
//!
//! A [`LensSource`] is a [`StateSource`] whose value is a part of its
//! parent's value. Reads go through the lens getter; every write is a single
//! read-modify-write on the parent, so it shows up as exactly one parent
//! mutation and is observed both through the lens and through the parent.

use std::fmt;
use std::sync::Arc;

use relay_core::{Channel, Mutation, Receipt, Receiver, StateSource};

use crate::lens::Lens;

/// A parent state source focused through a [`Lens`].
pub struct LensSource<S: StateSource, B> {
    parent: S,
    lens: Lens<S::Value, B>,
}

impl<S: StateSource, B> Clone for LensSource<S, B> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            lens: self.lens.clone(),
        }
    }
}

impl<S: StateSource + fmt::Debug, B> fmt::Debug for LensSource<S, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LensSource")
            .field("parent", &self.parent)
            .field("lens", &self.lens)
            .finish()
    }
}

impl<S: StateSource, B> LensSource<S, B> {
    pub fn new(parent: S, lens: Lens<S::Value, B>) -> Self {
        Self { parent, lens }
    }

    #[must_use]
    pub fn parent(&self) -> &S {
        &self.parent
    }

    #[must_use]
    pub fn lens(&self) -> &Lens<S::Value, B> {
        &self.lens
    }
}

impl<S, B> StateSource for LensSource<S, B>
where
    S: StateSource,
    B: Clone + Send + Sync + 'static,
{
    type Value = B;

    fn get(&self) -> B {
        self.lens.get(&self.parent.get())
    }

    fn set(&self, value: B) {
        self.modify(move |_| value);
    }

    fn modify(&self, f: impl FnOnce(B) -> B) {
        tracing::trace!(
            part = std::any::type_name::<B>(),
            "lens read-modify-write"
        );
        let lens = &self.lens;
        self.parent.modify(|whole| lens.modify(whole, f));
    }

    fn subscribe(&self, receiver: Receiver<Mutation<B>>) -> Receipt {
        let lens = self.lens.clone();
        self.parent
            .subscribe(Arc::new(move |m: Mutation<S::Value>| {
                receiver(lens.focus_mutation(&m));
            }))
    }
}

/// Focusing operators for state channels.
pub trait FocusExt<S: StateSource>: Sized {
    /// Derive a channel over part of this channel's value. Its pulses are
    /// this channel's mutations mapped through `lens`; its source writes
    /// through `lens` into this channel's source.
    fn focus<B>(self, lens: Lens<S::Value, B>) -> Channel<LensSource<S, B>, Mutation<B>>
    where
        B: Clone + Send + Sync + 'static;

    /// [`focus`](Self::focus) with an inline getter and setter.
    fn focus_with<B>(
        self,
        get: impl Fn(&S::Value) -> B + Send + Sync + 'static,
        set: impl Fn(S::Value, B) -> S::Value + Send + Sync + 'static,
    ) -> Channel<LensSource<S, B>, Mutation<B>>
    where
        B: Clone + Send + Sync + 'static,
    {
        self.focus(Lens::new(get, set))
    }
}

impl<S: StateSource> FocusExt<S> for Channel<S, Mutation<S::Value>> {
    fn focus<B>(self, lens: Lens<S::Value, B>) -> Channel<LensSource<S, B>, Mutation<B>>
    where
        B: Clone + Send + Sync + 'static,
    {
        let source = LensSource::new(self.source().clone(), lens.clone());
        self.map(move |m| lens.focus_mutation(&m))
            .resource(|_| source)
    }
}
