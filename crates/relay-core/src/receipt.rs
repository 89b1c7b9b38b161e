#![forbid(unsafe_code)]

//! Cancellable subscription handles.
//!
//! A [`Receipt`] is what `receive` hands back: the only way to stop a
//! registration. Receipts are cheap shared handles (`Arc` inside); cloning one
//! yields another handle to the same registration.
//!
//! # Invariants
//!
//! 1. The teardown runs at most once, no matter how many handles call
//!    [`Receipt::cancel`] or from how many threads.
//! 2. `is_cancelled()` is monotone: once `true`, it stays `true`.
//! 3. Dropping a receipt does **not** cancel it. Use [`Receipt::guard`] for
//!    scope-bound cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

static NEXT_RECEIPT_ID: AtomicU64 = AtomicU64::new(1);

fn next_receipt_id() -> u64 {
    NEXT_RECEIPT_ID.fetch_add(1, Ordering::Relaxed)
}

type Teardown = Box<dyn FnOnce() + Send>;

struct ReceiptInner {
    id: u64,
    /// Number of `cancel` calls observed; teardown runs on the 0 -> 1 edge.
    cancellations: AtomicUsize,
    teardown: Mutex<Option<Teardown>>,
    children: Vec<Receipt>,
}

/// A cancellable handle representing one subscription.
#[derive(Clone)]
#[must_use = "dropping a Receipt leaves the receiver registered; keep it to cancel later"]
pub struct Receipt {
    inner: Arc<ReceiptInner>,
}

impl Receipt {
    /// A receipt whose cancellation runs `teardown`.
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self::build(Some(Box::new(teardown)), Vec::new(), 0)
    }

    /// A receipt that is already cancelled.
    ///
    /// Returned by replay-only sources that have nothing left to tear down.
    pub fn cancelled() -> Self {
        Self::build(None, Vec::new(), 1)
    }

    /// An aggregate receipt that cancels every child.
    ///
    /// An empty aggregate is already cancelled.
    pub fn all(children: impl IntoIterator<Item = Receipt>) -> Self {
        let children: Vec<Receipt> = children.into_iter().collect();
        let initial = usize::from(children.is_empty());
        Self::build(None, children, initial)
    }

    fn build(teardown: Option<Teardown>, children: Vec<Receipt>, cancellations: usize) -> Self {
        Self {
            inner: Arc::new(ReceiptInner {
                id: next_receipt_id(),
                cancellations: AtomicUsize::new(cancellations),
                teardown: Mutex::new(teardown),
                children,
            }),
        }
    }

    /// Unique id of this registration, shared by all clones.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether [`cancel`](Self::cancel) has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancellations.load(Ordering::Acquire) > 0
    }

    /// Cancel the registration. Idempotent and safe from any thread,
    /// including from inside the receiver being cancelled.
    pub fn cancel(&self) {
        if self.inner.cancellations.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        tracing::trace!(receipt = self.inner.id, "receipt cancelled");
        let teardown = self.inner.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
        for child in &self.inner.children {
            child.cancel();
        }
    }

    /// Convert into a guard that cancels when dropped.
    pub fn guard(self) -> ReceiptGuard {
        ReceiptGuard {
            receipt: Some(self),
        }
    }
}

impl std::fmt::Debug for Receipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receipt")
            .field("id", &self.inner.id)
            .field("cancelled", &self.is_cancelled())
            .field("children", &self.inner.children.len())
            .finish()
    }
}

impl FromIterator<Receipt> for Receipt {
    fn from_iter<I: IntoIterator<Item = Receipt>>(iter: I) -> Self {
        Self::all(iter)
    }
}

/// Scope guard around a [`Receipt`]: cancels on drop.
#[must_use = "the registration is cancelled as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ReceiptGuard {
    receipt: Option<Receipt>,
}

impl ReceiptGuard {
    /// Give the receipt back without cancelling it.
    pub fn disarm(mut self) -> Receipt {
        self.receipt.take().unwrap_or_else(Receipt::cancelled)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.receipt.as_ref().is_none_or(Receipt::is_cancelled)
    }
}

impl Drop for ReceiptGuard {
    fn drop(&mut self) {
        if let Some(receipt) = self.receipt.take() {
            receipt.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn counting_receipt() -> (Receipt, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let receipt = Receipt::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (receipt, count)
    }

    #[test]
    fn cancel_runs_teardown_once() {
        let (receipt, count) = counting_receipt();
        assert!(!receipt.is_cancelled());
        receipt.cancel();
        receipt.cancel();
        receipt.clone().cancel();
        assert!(receipt.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_from_many_threads_runs_teardown_once() {
        let (receipt, count) = counting_receipt();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = receipt.clone();
                thread::spawn(move || r.cancel())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn aggregate_cancels_children() {
        let (a, a_count) = counting_receipt();
        let (b, b_count) = counting_receipt();
        let all = Receipt::all([a.clone(), b.clone()]);
        assert!(!all.is_cancelled());
        all.cancel();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_aggregate_is_already_cancelled() {
        let none = Receipt::all(Vec::new());
        assert!(none.is_cancelled());
        assert!(Receipt::cancelled().is_cancelled());
    }

    #[test]
    fn cancelling_child_does_not_cancel_aggregate() {
        let (a, _) = counting_receipt();
        let all: Receipt = vec![a.clone()].into_iter().collect();
        a.cancel();
        assert!(!all.is_cancelled());
    }

    #[test]
    fn drop_does_not_cancel() {
        let (receipt, count) = counting_receipt();
        let observer = receipt.clone();
        drop(receipt);
        assert!(!observer.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn guard_cancels_on_drop() {
        let (receipt, count) = counting_receipt();
        let observer = receipt.clone();
        {
            let _guard = receipt.guard();
        }
        assert!(observer.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disarmed_guard_keeps_registration() {
        let (receipt, count) = counting_receipt();
        let receipt = receipt.guard().disarm();
        assert!(!receipt.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ids_are_unique_and_shared_by_clones() {
        let a = Receipt::cancelled();
        let b = Receipt::cancelled();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }
}
