#![forbid(unsafe_code)]

//! Operators joining two channels into one.
//!
//! All of them subscribe to both sides on `receive` and return an aggregate
//! receipt. Pulses interleave in the order the underlying emissions happen;
//! neither side has priority. Internal state is updated under a short lock
//! which is released before anything is delivered downstream.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Channel;
use crate::choice::{Choice2, FlattenChoice};
use crate::queue::Receiver;
use crate::receipt::Receipt;

impl<S, P: Send + 'static> Channel<S, P> {
    /// Forward pulses from both channels as they happen.
    pub fn merge<S2>(self, other: Channel<S2, P>) -> Channel<(S, S2), P> {
        let left = self.reception;
        let right = other.reception;
        Channel::new((self.source, other.source), move |downstream: Receiver<P>| {
            Receipt::all([left(Arc::clone(&downstream)), right(downstream)])
        })
    }

    /// Like [`merge`](Self::merge) for channels of different pulse types:
    /// each side's pulses are tagged with the branch they came from.
    pub fn either<S2, P2: Send + 'static>(
        self,
        other: Channel<S2, P2>,
    ) -> Channel<(S, S2), Choice2<P, P2>> {
        self.map(Choice2::V1).merge(other.map(Choice2::V2))
    }
}

impl<S, P: FlattenChoice + Send + 'static> Channel<S, P>
where
    P::Output: Send + 'static,
{
    /// Collapse a nested union produced by chained [`either`](Channel::either)
    /// calls into one flat union.
    pub fn flatten_choice(self) -> Channel<S, P::Output> {
        self.map(FlattenChoice::flatten)
    }
}

impl<S, P: Clone + Send + 'static> Channel<S, P> {
    /// Emit `(latest_left, latest_right)` whenever either side emits, once
    /// both sides have emitted at least once.
    pub fn combine<S2, P2: Clone + Send + 'static>(
        self,
        other: Channel<S2, P2>,
    ) -> Channel<(S, S2), (P, P2)> {
        let left = self.reception;
        let right = other.reception;
        Channel::new(
            (self.source, other.source),
            move |downstream: Receiver<(P, P2)>| {
                let latest: Arc<Mutex<(Option<P>, Option<P2>)>> =
                    Arc::new(Mutex::new((None, None)));

                let on_left = {
                    let latest = Arc::clone(&latest);
                    let downstream = Arc::clone(&downstream);
                    Arc::new(move |pulse: P| {
                        let ready = {
                            let mut latest = latest.lock();
                            latest.0 = Some(pulse.clone());
                            latest.1.clone().map(|r| (pulse, r))
                        };
                        if let Some(pair) = ready {
                            downstream(pair);
                        }
                    })
                };
                let on_right = {
                    let latest = Arc::clone(&latest);
                    Arc::new(move |pulse: P2| {
                        let ready = {
                            let mut latest = latest.lock();
                            latest.1 = Some(pulse.clone());
                            latest.0.clone().map(|l| (l, pulse))
                        };
                        if let Some(pair) = ready {
                            downstream(pair);
                        }
                    })
                };

                Receipt::all([left(on_left), right(on_right)])
            },
        )
    }

    /// Pair the i-th pulse of each side. Unpaired pulses wait for their
    /// partner; a finite side bounds the number of pairs.
    pub fn zip<S2, P2: Clone + Send + 'static>(
        self,
        other: Channel<S2, P2>,
    ) -> Channel<(S, S2), (P, P2)> {
        let left = self.reception;
        let right = other.reception;
        Channel::new(
            (self.source, other.source),
            move |downstream: Receiver<(P, P2)>| {
                let pending: Arc<Mutex<(VecDeque<P>, VecDeque<P2>)>> =
                    Arc::new(Mutex::new((VecDeque::new(), VecDeque::new())));

                let on_left = {
                    let pending = Arc::clone(&pending);
                    let downstream = Arc::clone(&downstream);
                    Arc::new(move |pulse: P| {
                        let ready = {
                            let mut pending = pending.lock();
                            match pending.1.pop_front() {
                                Some(r) => Some((pulse, r)),
                                None => {
                                    pending.0.push_back(pulse);
                                    None
                                }
                            }
                        };
                        if let Some(pair) = ready {
                            downstream(pair);
                        }
                    })
                };
                let on_right = {
                    let pending = Arc::clone(&pending);
                    Arc::new(move |pulse: P2| {
                        let ready = {
                            let mut pending = pending.lock();
                            match pending.0.pop_front() {
                                Some(l) => Some((l, pulse)),
                                None => {
                                    pending.1.push_back(pulse);
                                    None
                                }
                            }
                        };
                        if let Some(pair) = ready {
                            downstream(pair);
                        }
                    })
                };

                Receipt::all([left(on_left), right(on_right)])
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::collect;
    use crate::choice::Choice3;
    use crate::{Channel, Choice2, Emitter, Mutation, Transceiver};

    #[test]
    fn merge_interleaves_in_emission_order() {
        let a = Emitter::new();
        let b = Emitter::new();
        let (receipt, log) = collect(&a.channel().merge(b.channel()));
        a.emit(1);
        b.emit(2);
        a.emit(3);
        assert_eq!(*log.lock(), vec![1, 2, 3]);
        receipt.cancel();
        assert_eq!(a.listener_count(), 0);
        assert_eq!(b.listener_count(), 0);
    }

    #[test]
    fn either_tags_each_side() {
        let nums = Emitter::<i32>::new();
        let words = Emitter::<&'static str>::new();
        let (_r, log) = collect(&nums.channel().either(words.channel()));
        words.emit("hi");
        nums.emit(4);
        assert_eq!(*log.lock(), vec![Choice2::V2("hi"), Choice2::V1(4)]);
    }

    #[test]
    fn chained_either_flattens_to_flat_union() {
        let a = Emitter::<u8>::new();
        let b = Emitter::<char>::new();
        let c = Emitter::<bool>::new();
        let ch = a
            .channel()
            .either(b.channel())
            .either(c.channel())
            .flatten_choice();
        let (_r, log) = collect(&ch);
        c.emit(true);
        a.emit(1);
        b.emit('z');
        assert_eq!(
            *log.lock(),
            vec![Choice3::V3(true), Choice3::V1(1), Choice3::V2('z')]
        );
    }

    #[test]
    fn combine_waits_for_both_sides() {
        let a = Emitter::new();
        let b = Emitter::new();
        let (_r, log) = collect(&a.channel().combine(b.channel()));
        a.emit(1);
        a.emit(2);
        assert!(log.lock().is_empty());
        b.emit('x');
        a.emit(3);
        b.emit('y');
        assert_eq!(*log.lock(), vec![(2, 'x'), (3, 'x'), (3, 'y')]);
    }

    #[test]
    fn combine_of_transceivers_is_primed_by_replay() {
        let w = Transceiver::new(10);
        let h = Transceiver::new(20);
        let area = w
            .channel()
            .new_values()
            .combine(h.channel().new_values())
            .map(|(w, h)| w * h);
        let (_r, log) = collect(&area);
        w.set(5);
        h.set(30);
        assert_eq!(*log.lock(), vec![200, 100, 150]);
    }

    #[test]
    fn zip_pairs_by_position() {
        let a = Emitter::new();
        let b = Emitter::new();
        let (_r, log) = collect(&a.channel().zip(b.channel()));
        a.emit(1);
        a.emit(2);
        a.emit(3);
        b.emit("one");
        b.emit("two");
        assert_eq!(*log.lock(), vec![(1, "one"), (2, "two")]);
    }

    #[test]
    fn zip_of_finite_channels_is_bounded_by_shorter() {
        let ch = Channel::of([1, 2, 3]).zip(Channel::of(['a', 'b']));
        let (_r, log) = collect(&ch);
        assert_eq!(*log.lock(), vec![(1, 'a'), (2, 'b')]);
    }

    #[test]
    fn merged_receipt_cancels_both_registrations() {
        let a = Transceiver::new(0);
        let b = Transceiver::new(0);
        let ch = a.channel().merge(b.channel());
        let (receipt, log) = collect(&ch);
        receipt.cancel();
        a.set(1);
        b.set(1);
        assert_eq!(*log.lock(), vec![Mutation::replay(0), Mutation::replay(0)]);
        assert_eq!(a.receiver_count() + b.receiver_count(), 0);
    }
}
