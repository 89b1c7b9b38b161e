#![forbid(unsafe_code)]

//! Handing pulses to an external scheduler.
//!
//! The core never spawns threads or keeps timers. Anything that can run a
//! thunk, optionally after a delay or as an exclusive barrier, implements
//! [`Executor`]; [`Channel::dispatch`] reroutes each pulse through it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::Channel;
use crate::queue::Receiver;
use crate::receipt::Receipt;

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send>;

/// Scheduling hints passed along with each job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOptions {
    /// Run no earlier than this long after submission.
    pub delay: Option<Duration>,
    /// Run exclusively with respect to other jobs on the same executor.
    pub barrier: bool,
}

impl DispatchOptions {
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn as_barrier(mut self) -> Self {
        self.barrier = true;
        self
    }
}

/// Something that can schedule a thunk.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, job: Job, options: DispatchOptions);
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, job: Job, options: DispatchOptions) {
        (**self).execute(job, options);
    }
}

/// Runs every job inline on the submitting thread. Options are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateExecutor;

impl Executor for ImmediateExecutor {
    fn execute(&self, job: Job, _options: DispatchOptions) {
        job();
    }
}

/// Holds jobs until [`run_pending`](Self::run_pending) is called. Jobs run in
/// submission order; options are recorded for inspection.
#[derive(Clone, Default)]
pub struct ManualExecutor {
    jobs: Arc<Mutex<VecDeque<(DispatchOptions, Job)>>>,
}

impl std::fmt::Debug for ManualExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualExecutor")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Options of every queued job, oldest first.
    #[must_use]
    pub fn pending_options(&self) -> Vec<DispatchOptions> {
        self.jobs.lock().iter().map(|(options, _)| *options).collect()
    }

    /// Run queued jobs, including any they enqueue, until none remain.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.jobs.lock().pop_front();
            let Some((_, job)) = next else {
                return ran;
            };
            job();
            ran += 1;
        }
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, job: Job, options: DispatchOptions) {
        self.jobs.lock().push_back((options, job));
    }
}

impl<S, P: Send + 'static> Channel<S, P> {
    /// Deliver each pulse by submitting a job to `executor`.
    pub fn dispatch(self, executor: impl Executor) -> Self {
        self.dispatch_with(executor, DispatchOptions::default())
    }

    /// [`dispatch`](Self::dispatch) with explicit scheduling hints.
    ///
    /// Jobs still waiting on the executor when the receipt is cancelled run
    /// as no-ops.
    pub fn dispatch_with(self, executor: impl Executor, options: DispatchOptions) -> Self {
        let executor = Arc::new(executor);
        let upstream = self.reception;
        Channel::new(self.source, move |downstream: Receiver<P>| {
            let live = Arc::new(AtomicBool::new(true));
            let executor = Arc::clone(&executor);
            let gate = Arc::clone(&live);
            let registration = upstream(Arc::new(move |pulse: P| {
                let downstream = Arc::clone(&downstream);
                let gate = Arc::clone(&gate);
                let job = move || {
                    if gate.load(Ordering::Acquire) {
                        downstream(pulse);
                    }
                };
                executor.execute(Box::new(job), options);
            }));
            Receipt::all([
                registration,
                Receipt::new(move || live.store(false, Ordering::Release)),
            ])
        })
    }
}
