#![forbid(unsafe_code)]

//! Selector joins: keep a projection of a collection consistent with a
//! channel of keys.
//!
//! `data.select(selector)` emits `data.pick(keys)` whenever either side
//! changes. A selector change looks up the new keys in the latest data; a
//! data change re-applies the latest keys. Nothing is emitted until both
//! sides have delivered once, and the first pulse is a replay (`old: None`).
//!
//! Writing a projection back performs one `put` on the data source, using the
//! selector's current keys.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use relay_core::{Channel, Mutation, Receipt, Receiver, StateSource};

/// Collections that can be projected by a list of keys and updated from
/// such a projection.
///
/// Keys that do not resolve are skipped by both directions, so
/// `put(keys, pick(keys))` leaves the collection unchanged.
pub trait Selectable: Clone + Send + Sync + 'static {
    type Key: Clone + Send + Sync + 'static;
    type Item: Clone + Send + Sync + 'static;

    /// Items for the resolving keys, in key order.
    fn pick(&self, keys: &[Self::Key]) -> Vec<Self::Item>;

    /// Write `items` to the resolving keys, pairwise in key order.
    #[must_use]
    fn put(self, keys: &[Self::Key], items: Vec<Self::Item>) -> Self;
}

impl<T: Clone + Send + Sync + 'static> Selectable for Vec<T> {
    type Key = usize;
    type Item = T;

    fn pick(&self, keys: &[usize]) -> Vec<T> {
        keys.iter().filter_map(|&i| self.get(i).cloned()).collect()
    }

    fn put(mut self, keys: &[usize], items: Vec<T>) -> Self {
        let len = self.len();
        let slots = keys.iter().copied().filter(|&i| i < len);
        for (i, item) in slots.zip(items) {
            self[i] = item;
        }
        self
    }
}

impl<K, V> Selectable for HashMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Key = K;
    type Item = V;

    fn pick(&self, keys: &[K]) -> Vec<V> {
        keys.iter().filter_map(|k| self.get(k).cloned()).collect()
    }

    fn put(mut self, keys: &[K], items: Vec<V>) -> Self {
        let resolving: Vec<K> = keys
            .iter()
            .filter(|k| self.contains_key(*k))
            .cloned()
            .collect();
        for (k, item) in resolving.into_iter().zip(items) {
            self.insert(k, item);
        }
        self
    }
}

type Keys<D> = Vec<<D as Selectable>::Key>;
type Items<D> = Vec<<D as Selectable>::Item>;

/// The state source behind a selector join.
pub struct SelectSource<S, K> {
    data: S,
    selector: K,
}

impl<S: Clone, K: Clone> Clone for SelectSource<S, K> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            selector: self.selector.clone(),
        }
    }
}

impl<S: fmt::Debug, K: fmt::Debug> fmt::Debug for SelectSource<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectSource")
            .field("data", &self.data)
            .field("selector", &self.selector)
            .finish()
    }
}

impl<S, K> SelectSource<S, K> {
    #[must_use]
    pub fn data(&self) -> &S {
        &self.data
    }

    #[must_use]
    pub fn selector(&self) -> &K {
        &self.selector
    }
}

impl<S, K> StateSource for SelectSource<S, K>
where
    S: StateSource,
    S::Value: Selectable,
    K: StateSource<Value = Keys<S::Value>>,
{
    type Value = Items<S::Value>;

    fn get(&self) -> Self::Value {
        self.data.get().pick(&self.selector.get())
    }

    fn set(&self, items: Self::Value) {
        let keys = self.selector.get();
        self.data.modify(|data| data.put(&keys, items));
    }

    fn modify(&self, f: impl FnOnce(Self::Value) -> Self::Value) {
        let keys = self.selector.get();
        self.data.modify(|data| {
            let items = f(data.pick(&keys));
            data.put(&keys, items)
        });
    }

    fn subscribe(&self, receiver: Receiver<Mutation<Self::Value>>) -> Receipt {
        project(
            Channel::from_state(self.data.clone()),
            Channel::from_state(self.selector.clone()),
        )
        .receive_with(receiver)
    }
}

fn project<S, K, D>(
    data: Channel<S, Mutation<D>>,
    selector: Channel<K, Mutation<Keys<D>>>,
) -> Channel<(S, K), Mutation<Items<D>>>
where
    D: Selectable,
{
    data.new_values()
        .combine(selector.new_values())
        .map(|(data, keys): (D, Keys<D>)| data.pick(&keys))
        .presieve(|_, _| true)
}

/// Selector joins on collection-valued state channels.
pub trait SelectExt<S, D>
where
    S: StateSource<Value = D>,
    D: Selectable,
{
    /// Join with a channel of keys. See the [module docs](crate::select).
    fn select<K>(
        self,
        selector: Channel<K, Mutation<Keys<D>>>,
    ) -> Channel<SelectSource<S, K>, Mutation<Items<D>>>
    where
        K: StateSource<Value = Keys<D>>;
}

impl<S, D> SelectExt<S, D> for Channel<S, Mutation<D>>
where
    S: StateSource<Value = D>,
    D: Selectable,
{
    fn select<K>(
        self,
        selector: Channel<K, Mutation<Keys<D>>>,
    ) -> Channel<SelectSource<S, K>, Mutation<Items<D>>>
    where
        K: StateSource<Value = Keys<D>>,
    {
        project(self, selector).resource(|(data, selector)| SelectSource { data, selector })
    }
}
