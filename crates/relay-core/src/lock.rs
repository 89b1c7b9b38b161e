#![forbid(unsafe_code)]

//! Pluggable mutual exclusion for receiver dispatch.
//!
//! A [`ReceiverQueue`](crate::ReceiverQueue) holds its [`Lock`] for the whole
//! duration of a dispatch. Receivers routinely push a new value back into the
//! queue they are being called from (two-way bindings), so the multi-threaded
//! implementation must be reentrant: the holding thread may lock again without
//! deadlocking, while other threads wait their turn.
//!
//! Unlocking is tied to dropping the [`LockGuard`], which keeps the lock
//! balanced on every exit path including unwinding.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Which [`Lock`] implementation a queue should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockKind {
    /// No exclusion at all. Only correct when every emission and registration
    /// happens on one thread.
    Noop,
    /// A reentrant mutex.
    #[default]
    Reentrant,
}

impl LockKind {
    /// Build a fresh lock of this kind.
    #[must_use]
    pub fn build(self) -> DispatchLock {
        match self {
            Self::Noop => DispatchLock::Noop(NoopLock),
            Self::Reentrant => DispatchLock::Reentrant(ReentrantLock::new()),
        }
    }
}

/// RAII guard returned by [`Lock::lock`]. The lock is released on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    _held: Option<ReentrantMutexGuard<'a, ()>>,
}

impl LockGuard<'_> {
    /// Release the lock now. Equivalent to dropping the guard.
    pub fn unlock(self) {}
}

impl std::fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("held", &self._held.is_some())
            .finish()
    }
}

/// A mutual-exclusion primitive guarding receiver dispatch.
pub trait Lock: Send + Sync {
    /// Acquire the lock, blocking if another thread holds it.
    fn lock(&self) -> LockGuard<'_>;

    /// Run `f` while holding the lock.
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R
    where
        Self: Sized,
    {
        let _guard = self.lock();
        f()
    }
}

/// A lock that never blocks. For single-threaded use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLock;

impl Lock for NoopLock {
    fn lock(&self) -> LockGuard<'_> {
        LockGuard { _held: None }
    }
}

/// A mutex the owning thread may acquire repeatedly.
#[derive(Debug, Default)]
pub struct ReentrantLock {
    mutex: ReentrantMutex<()>,
}

impl ReentrantLock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mutex: ReentrantMutex::new(()),
        }
    }

    /// Whether any thread currently holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }
}

impl Lock for ReentrantLock {
    fn lock(&self) -> LockGuard<'_> {
        LockGuard {
            _held: Some(self.mutex.lock()),
        }
    }
}

/// The lock a queue actually stores, selected by [`LockKind`].
#[derive(Debug)]
pub enum DispatchLock {
    Noop(NoopLock),
    Reentrant(ReentrantLock),
}

impl DispatchLock {
    #[must_use]
    pub fn kind(&self) -> LockKind {
        match self {
            Self::Noop(_) => LockKind::Noop,
            Self::Reentrant(_) => LockKind::Reentrant,
        }
    }
}

impl Lock for DispatchLock {
    fn lock(&self) -> LockGuard<'_> {
        match self {
            Self::Noop(lock) => lock.lock(),
            Self::Reentrant(lock) => lock.lock(),
        }
    }
}
