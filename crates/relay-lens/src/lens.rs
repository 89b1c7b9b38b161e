#![forbid(unsafe_code)]

//! Bidirectional accessors.
//!
//! A [`Lens<A, B>`] reads a part `B` out of a whole `A` and writes a part back
//! into a whole, producing the updated whole. Both directions are total: a
//! part that may be absent is modelled as `B = Option<_>`, and writing `None`
//! is whatever the lens defines it to be (often a no-op).
//!
//! # Laws
//!
//! For a well-behaved lens `l`:
//!
//! 1. `l.set(a, l.get(&a)) == a` (writing back what was read changes nothing)
//! 2. `l.get(&l.set(a, b)) == b` (reading back what was written)
//!
//! The collection lenses in [`crate::collection`] document where they bend
//! the second law.

use std::fmt;
use std::sync::Arc;

use relay_core::Mutation;

type Getter<A, B> = Arc<dyn Fn(&A) -> B + Send + Sync>;
type Setter<A, B> = Arc<dyn Fn(A, B) -> A + Send + Sync>;

/// A reified get/set pair focusing on part `B` of a whole `A`.
pub struct Lens<A, B> {
    get: Getter<A, B>,
    set: Setter<A, B>,
}

impl<A, B> Clone for Lens<A, B> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<A, B> fmt::Debug for Lens<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lens")
            .field("whole", &std::any::type_name::<A>())
            .field("part", &std::any::type_name::<B>())
            .finish()
    }
}

impl<A: 'static, B: 'static> Lens<A, B> {
    /// Build a lens from a getter and a functional setter.
    pub fn new(
        get: impl Fn(&A) -> B + Send + Sync + 'static,
        set: impl Fn(A, B) -> A + Send + Sync + 'static,
    ) -> Self {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Build a lens whose setter mutates the whole in place.
    pub fn in_place(
        get: impl Fn(&A) -> B + Send + Sync + 'static,
        mutate: impl Fn(&mut A, B) + Send + Sync + 'static,
    ) -> Self {
        Self::new(get, move |mut whole, part| {
            mutate(&mut whole, part);
            whole
        })
    }

    pub fn get(&self, whole: &A) -> B {
        (self.get)(whole)
    }

    pub fn set(&self, whole: A, part: B) -> A {
        (self.set)(whole, part)
    }

    /// Read the part, transform it, write it back.
    pub fn modify(&self, whole: A, f: impl FnOnce(B) -> B) -> A {
        let part = f(self.get(&whole));
        self.set(whole, part)
    }

    /// Focus further: `self` then `inner`.
    #[must_use]
    pub fn then<C: 'static>(&self, inner: &Lens<B, C>) -> Lens<A, C> {
        let (outer_get, outer_set) = (Arc::clone(&self.get), Arc::clone(&self.set));
        let (inner_get, inner_set) = (Arc::clone(&inner.get), Arc::clone(&inner.set));
        let read = Arc::clone(&outer_get);
        Lens::new(
            move |whole: &A| inner_get(&read(whole)),
            move |whole: A, part: C| {
                let middle = outer_get(&whole);
                outer_set(whole, inner_set(middle, part))
            },
        )
    }

    /// Project a whole-value mutation onto the part. A replay stays a replay.
    pub fn focus_mutation(&self, mutation: &Mutation<A>) -> Mutation<B> {
        mutation.by_ref().map(|whole| self.get(whole))
    }
}

impl<A: Clone + 'static> Lens<A, A> {
    /// The lens that focuses on the whole.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(A::clone, |_, part| part)
    }
}
