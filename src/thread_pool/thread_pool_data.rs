//! Job System Data - Pure DOP
//!
//! NO METHODS. Just data.
//! Scheduling, dependency chaining and completion live in
//! thread_pool_operations.rs

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

/// Work-stealing pool plus bookkeeping shared by every scheduled job
#[derive(Clone)]
pub struct JobSystemData {
    /// Worker pool; kernels inside a job fork onto the same pool
    pub pool: Arc<rayon::ThreadPool>,

    /// Number of worker threads
    pub worker_threads: usize,

    /// Minimum elements per parallel chunk
    pub batch_size: usize,

    /// Jobs spawned and not yet finished
    pub in_flight: Arc<AtomicUsize>,
}

/// Work queued to run once an upstream job has produced its output
pub(crate) type Continuation<T> = Box<dyn FnOnce(std::thread::Result<T>) + Send>;

/// Lifecycle of one job's output
pub(crate) enum SlotState<T> {
    /// Not finished. A dependent job may be waiting on the output.
    Pending {
        continuation: Option<Continuation<T>>,
    },
    /// Finished, output not yet claimed (Err if the job panicked)
    Finished(std::thread::Result<T>),
    /// Output handed to `complete` or to a dependent job
    Taken,
}

/// Shared completion slot between a job and its handle
pub(crate) struct JobSlot<T> {
    pub state: Mutex<SlotState<T>>,
    pub finished: Condvar,
    pub label: &'static str,
}

/// Explicit handle to a scheduled job
///
/// Owning the handle is owning the job's output: it can be claimed once,
/// either by waiting (`complete`) or by chaining a dependent job
/// (`schedule_after`). Not `Clone`.
pub struct JobHandle<T> {
    pub(crate) slot: Arc<JobSlot<T>>,
}

impl<T> std::fmt::Debug for JobHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("label", &self.slot.label)
            .finish()
    }
}

impl std::fmt::Debug for JobSystemData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSystemData")
            .field("worker_threads", &self.worker_threads)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
