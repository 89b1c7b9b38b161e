#![forbid(unsafe_code)]

//! Per-queue dispatch configuration.

use crate::error::{RelayError, Result};
use crate::lock::LockKind;

/// Upper bound accepted for [`QueueConfig::max_depth`].
pub const MAX_REENTRANT_DEPTH: usize = 64;

/// Configuration owned by each [`ReceiverQueue`](crate::ReceiverQueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Number of nested re-entrant emissions tolerated on one queue.
    /// An emission arriving at depth `max_depth + 2` or deeper is dropped.
    /// Default: 1.
    pub max_depth: usize,

    /// Lock guarding dispatch and registration.
    /// Default: [`LockKind::Reentrant`].
    pub lock: LockKind,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            lock: LockKind::Reentrant,
        }
    }
}

impl QueueConfig {
    /// Preset for queues that never leave one thread.
    #[must_use]
    pub fn single_threaded() -> Self {
        Self {
            lock: LockKind::Noop,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_lock(mut self, lock: LockKind) -> Self {
        self.lock = lock;
        self
    }

    /// Reject depths beyond [`MAX_REENTRANT_DEPTH`].
    pub fn validate(&self) -> Result<()> {
        if self.max_depth > MAX_REENTRANT_DEPTH {
            return Err(RelayError::invalid_config(format!(
                "max_depth {} exceeds {MAX_REENTRANT_DEPTH}",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Deepest entrancy level that still delivers.
    #[must_use]
    pub(crate) fn delivery_limit(&self) -> usize {
        self.max_depth.saturating_add(1)
    }
}
