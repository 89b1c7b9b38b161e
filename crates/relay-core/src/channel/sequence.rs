#![forbid(unsafe_code)]

//! Position-aware operators. Counters and buffers live per receiver.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::Channel;
use crate::queue::Receiver;
use crate::receipt::Receipt;

impl<S, P: Send + 'static> Channel<S, P> {
    /// Pair each pulse with its zero-based position for this receiver.
    pub fn enumerate(self) -> Channel<S, (usize, P)> {
        self.lift(|downstream: Receiver<(usize, P)>| {
            let counter = AtomicUsize::new(0);
            Arc::new(move |pulse| {
                let index = counter.fetch_add(1, Ordering::Relaxed);
                downstream((index, pulse));
            })
        })
    }

    /// Drop the first `n` pulses.
    pub fn skip(self, n: usize) -> Self {
        self.enumerate()
            .filter(move |(index, _)| *index >= n)
            .map(|(_, pulse)| pulse)
    }

    /// Forward only the first `n` pulses. The upstream registration stays in
    /// place until the receipt is cancelled.
    pub fn take(self, n: usize) -> Self {
        self.enumerate()
            .filter(move |(index, _)| *index < n)
            .map(|(_, pulse)| pulse)
    }

    /// Collect pulses into batches of `size`, emitting each full batch.
    /// A `size` of zero is treated as one.
    pub fn buffer(self, size: usize) -> Channel<S, Vec<P>> {
        let size = size.max(1);
        self.lift(move |downstream: Receiver<Vec<P>>| {
            let pending: Mutex<Vec<P>> = Mutex::new(Vec::with_capacity(size));
            Arc::new(move |pulse| {
                let batch = {
                    let mut pending = pending.lock();
                    pending.push(pulse);
                    (pending.len() >= size).then(|| std::mem::take(&mut *pending))
                };
                if let Some(batch) = batch {
                    downstream(batch);
                }
            })
        })
    }

    /// Deliver only pulses emitted after `receive` has returned, dropping
    /// whatever the source replays synchronously while registering.
    pub fn subsequent(self) -> Self {
        let upstream = self.reception;
        Channel::new(self.source, move |downstream: Receiver<P>| {
            let live = Arc::new(AtomicBool::new(false));
            let gate = Arc::clone(&live);
            let receipt: Receipt = upstream(Arc::new(move |pulse| {
                if gate.load(Ordering::Acquire) {
                    downstream(pulse);
                }
            }));
            live.store(true, Ordering::Release);
            receipt
        })
    }
}
