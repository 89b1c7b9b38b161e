#![forbid(unsafe_code)]

//! Lenses into collections.
//!
//! | Lens            | Whole          | Part        | Missing target                 |
//! |-----------------|----------------|-------------|--------------------------------|
//! | [`index`]       | `Vec<T>`       | `Option<T>` | reads `None`; writing pads      |
//! | [`range`]       | `Vec<T>`       | `Vec<T>`    | range is clamped to the length  |
//! | [`prism`]       | `Vec<A>`       | `Vec<B>`    | extra parts are ignored         |
//! | [`at_key`]      | `HashMap<K,V>` | `Option<V>` | reads `None`; writing `None` removes |
//!
//! # Padding
//!
//! Writing `Some(x)` through `index(i)` on a vector shorter than `i + 1`
//! grows the vector to `i + 1` elements, filling every new slot with a copy
//! of `x`. Writing `None` never changes the vector.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use relay_core::{Channel, Mutation, StateSource};

use crate::lens::Lens;
use crate::source::{FocusExt, LensSource};

/// Focus on the element at `position`.
pub fn index<T>(position: usize) -> Lens<Vec<T>, Option<T>>
where
    T: Clone + Send + Sync + 'static,
{
    Lens::in_place(
        move |items: &Vec<T>| items.get(position).cloned(),
        move |items, part| {
            let Some(value) = part else {
                return;
            };
            if position < items.len() {
                items[position] = value;
            } else {
                items.resize(position + 1, value);
            }
        },
    )
}

/// Focus on a contiguous slice. Reading and writing use the range clamped
/// to the current length; writing splices the new items in place of the old
/// slice, so the vector may grow or shrink.
pub fn range<T>(span: Range<usize>) -> Lens<Vec<T>, Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let read = span.clone();
    Lens::in_place(
        move |items: &Vec<T>| items[clamp(&read, items.len())].to_vec(),
        move |items, part| {
            let span = clamp(&span, items.len());
            items.splice(span, part);
        },
    )
}

fn clamp(span: &Range<usize>, len: usize) -> Range<usize> {
    let end = span.end.min(len);
    span.start.min(end)..end
}

/// Apply `lens` to every element. Writing updates elements pairwise; when
/// lengths differ the surplus on either side is left alone.
pub fn prism<A, B>(lens: Lens<A, B>) -> Lens<Vec<A>, Vec<B>>
where
    A: Send + Sync + 'static,
    B: Send + Sync + 'static,
{
    let read = lens.clone();
    Lens::new(
        move |items: &Vec<A>| items.iter().map(|item| read.get(item)).collect(),
        move |items: Vec<A>, parts: Vec<B>| {
            let mut parts = parts.into_iter();
            items
                .into_iter()
                .map(|item| match parts.next() {
                    Some(part) => lens.set(item, part),
                    None => item,
                })
                .collect()
        },
    )
}

/// Focus on the entry for `key`.
pub fn at_key<K, V>(key: K) -> Lens<HashMap<K, V>, Option<V>>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let read = key.clone();
    Lens::in_place(
        move |map: &HashMap<K, V>| map.get(&read).cloned(),
        move |map, part| match part {
            Some(value) => {
                map.insert(key.clone(), value);
            }
            None => {
                map.remove(&key);
            }
        },
    )
}

/// Collection lenses as channel operators on vector-valued state.
pub trait VecFocusExt<S, T>
where
    S: StateSource<Value = Vec<T>>,
{
    fn focus_index(self, position: usize) -> Channel<LensSource<S, Option<T>>, Mutation<Option<T>>>;

    fn focus_range(self, span: Range<usize>) -> Channel<LensSource<S, Vec<T>>, Mutation<Vec<T>>>;

    fn focus_prism<B>(self, lens: Lens<T, B>) -> Channel<LensSource<S, Vec<B>>, Mutation<Vec<B>>>
    where
        B: Clone + Send + Sync + 'static;
}

impl<S, T> VecFocusExt<S, T> for Channel<S, Mutation<Vec<T>>>
where
    S: StateSource<Value = Vec<T>>,
    T: Clone + Send + Sync + 'static,
{
    fn focus_index(self, position: usize) -> Channel<LensSource<S, Option<T>>, Mutation<Option<T>>> {
        self.focus(index(position))
    }

    fn focus_range(self, span: Range<usize>) -> Channel<LensSource<S, Vec<T>>, Mutation<Vec<T>>> {
        self.focus(range(span))
    }

    fn focus_prism<B>(self, lens: Lens<T, B>) -> Channel<LensSource<S, Vec<B>>, Mutation<Vec<B>>>
    where
        B: Clone + Send + Sync + 'static,
    {
        self.focus(prism(lens))
    }
}

/// [`at_key`] as a channel operator on map-valued state.
pub trait MapFocusExt<S, K, V>
where
    S: StateSource<Value = HashMap<K, V>>,
{
    fn focus_key(self, key: K) -> Channel<LensSource<S, Option<V>>, Mutation<Option<V>>>;
}

impl<S, K, V> MapFocusExt<S, K, V> for Channel<S, Mutation<HashMap<K, V>>>
where
    S: StateSource<Value = HashMap<K, V>>,
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn focus_key(self, key: K) -> Channel<LensSource<S, Option<V>>, Mutation<Option<V>>> {
        self.focus(at_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Transceiver;

    #[test]
    fn index_reads_missing_as_none() {
        let lens = index::<u8>(5);
        assert_eq!(lens.get(&vec![1, 2]), None);
        assert_eq!(index::<u8>(1).get(&vec![1, 2]), Some(2));
    }

    #[test]
    fn index_write_in_range_replaces() {
        assert_eq!(index(0).set(vec!['a', 'b'], Some('z')), vec!['z', 'b']);
    }

    #[test]
    fn index_write_past_end_pads_with_written_value() {
        let padded = index(4).set(vec![1, 2], Some(9));
        assert_eq!(padded, vec![1, 2, 9, 9, 9]);
    }

    #[test]
    fn index_write_none_is_noop() {
        assert_eq!(index::<i32>(0).set(vec![1], None), vec![1]);
        assert_eq!(index::<i32>(3).set(vec![1], None), vec![1]);
    }

    #[test]
    fn range_is_clamped() {
        let lens = range::<i32>(1..10);
        assert_eq!(lens.get(&vec![0, 1, 2]), vec![1, 2]);
        assert_eq!(range::<i32>(5..8).get(&vec![0, 1]), Vec::<i32>::new());
    }

    #[test]
    fn range_write_splices() {
        let lens = range(1..3);
        assert_eq!(lens.set(vec![0, 1, 2, 3], vec![7]), vec![0, 7, 3]);
        assert_eq!(lens.set(vec![0, 1, 2, 3], vec![7, 8, 9]), vec![0, 7, 8, 9, 3]);
        assert_eq!(range(4..6).set(vec![0], vec![5]), vec![0, 5]);
    }

    #[test]
    fn prism_updates_pairwise() {
        let first = Lens::new(|p: &(u8, char)| p.0, |p, first| (first, p.1));
        let lens = prism(first);
        let items = vec![(1, 'a'), (2, 'b'), (3, 'c')];
        assert_eq!(lens.get(&items), vec![1, 2, 3]);
        assert_eq!(
            lens.set(items.clone(), vec![9, 8]),
            vec![(9, 'a'), (8, 'b'), (3, 'c')]
        );
        assert_eq!(lens.set(items, vec![0, 0, 0, 0]).len(), 3);
    }

    #[test]
    fn at_key_inserts_and_removes() {
        let lens = at_key::<&str, u32>("k");
        let map = lens.set(HashMap::new(), Some(1));
        assert_eq!(lens.get(&map), Some(1));
        let map = lens.set(map, None);
        assert!(map.is_empty());
        assert_eq!(lens.get(&map), None);
    }

    #[test]
    fn channel_shorthands_write_through() {
        let list = Transceiver::new(vec![10, 20, 30]);
        let second = list.channel().focus_index(1);
        second.set_value(Some(21));
        assert_eq!(list.get(), vec![10, 21, 30]);

        let middle = list.channel().focus_range(0..2);
        assert_eq!(middle.value(), vec![10, 21]);
        middle.set_value(vec![]);
        assert_eq!(list.get(), vec![30]);

        let doubled = list
            .channel()
            .focus_prism(Lens::new(|v: &i32| v * 2, |_, doubled: i32| doubled / 2));
        doubled.set_value(vec![100]);
        assert_eq!(list.get(), vec![50]);

        let table = Transceiver::new(HashMap::from([("a", 1)]));
        let entry = table.channel().focus_key("b");
        assert_eq!(entry.value(), None);
        entry.set_value(Some(2));
        assert_eq!(table.get().len(), 2);
    }
}
