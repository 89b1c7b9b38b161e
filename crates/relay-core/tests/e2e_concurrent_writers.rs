#![forbid(unsafe_code)]

//! E2E tests for multi-threaded writers on shared transceivers.
//!
//! Validates that:
//! 1. Concurrent writes are serialized: every receiver sees a gap-free
//!    old/new chain ending at the final stored value.
//! 2. Receivers subscribing while writers run still get a consistent replay
//!    followed by the chain.
//! 3. A receipt cancelled from another thread stops delivery for good.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::Mutex;
use relay_core::{Mutation, Receipt, Transceiver};

const WRITERS: usize = 4;
const WRITES_PER_THREAD: usize = 250;

fn record(cell: &Transceiver<u64>) -> (Receipt, Arc<Mutex<Vec<Mutation<u64>>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let receipt = cell.subscribe(Arc::new(move |m: Mutation<u64>| sink.lock().push(m)));
    (receipt, log)
}

fn assert_chain(log: &[Mutation<u64>]) {
    assert!(log[0].is_replay(), "first pulse must be the replay");
    for (i, pair) in log.windows(2).enumerate() {
        assert_eq!(
            pair[1].old,
            Some(pair[0].new),
            "gap between pulse {i} and {}",
            i + 1
        );
    }
}

// ============================================================================
// Serialized writers
// ============================================================================

#[test]
fn concurrent_writers_produce_gap_free_chain() {
    let cell = Transceiver::new(0u64);
    let receivers: Vec<_> = (0..3).map(|_| record(&cell)).collect();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let cell = cell.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..WRITES_PER_THREAD {
                    cell.modify(|v| v + 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total = (WRITERS * WRITES_PER_THREAD) as u64;
    assert_eq!(cell.get(), total);
    assert_eq!(cell.version(), total);
    for (_receipt, log) in &receivers {
        let log = log.lock();
        assert_eq!(log.len(), WRITERS * WRITES_PER_THREAD + 1);
        assert_chain(&log);
        assert_eq!(log.last().map(|m| m.new), Some(total));
    }
}

// ============================================================================
// Late subscribers
// ============================================================================

#[test]
fn late_subscriber_replay_joins_chain_without_gap() {
    let cell = Transceiver::new(0u64);
    let running = Arc::new(AtomicBool::new(true));

    let writer = {
        let cell = cell.clone();
        let running = Arc::clone(&running);
        thread::spawn(move || {
            while running.load(Ordering::Acquire) {
                cell.modify(|v| v + 1);
            }
        })
    };

    let late: Vec<_> = (0..20)
        .map(|_| {
            thread::yield_now();
            record(&cell)
        })
        .collect();
    running.store(false, Ordering::Release);
    writer.join().unwrap();

    let last = cell.get();
    for (_receipt, log) in &late {
        let log = log.lock();
        assert_chain(&log);
        assert_eq!(log.last().map(|m| m.new), Some(last));
    }
}

// ============================================================================
// Cross-thread cancellation
// ============================================================================

#[test]
fn cancel_from_another_thread_is_final() {
    let cell = Transceiver::new(0u64);
    let (receipt, log) = record(&cell);

    cell.set(1);
    let canceller = {
        let receipt = receipt.clone();
        thread::spawn(move || receipt.cancel())
    };
    canceller.join().unwrap();

    let seen = log.lock().len();
    for v in 2..50 {
        cell.set(v);
    }
    assert_eq!(log.lock().len(), seen);
    assert_eq!(cell.receiver_count(), 0);
}
