//! Job System Operations
//!
//! Jobs run on a rayon work-stealing pool. A dependent job is not queued
//! until its upstream job has finished, so no worker ever blocks waiting on
//! another job. Blocking happens only in `complete`, on the caller's thread.

use super::thread_pool_data::{JobHandle, JobSlot, JobSystemData, SlotState};
use crate::constants::scheduling::WORKER_THREAD_PREFIX;
use crate::error::{OceanError, OceanResult};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// CREATION
// ============================================================================

/// Build the worker pool
pub fn create_job_system(worker_threads: usize, batch_size: usize) -> OceanResult<JobSystemData> {
    let worker_threads = worker_threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads)
        .thread_name(|idx| format!("{}-{}", WORKER_THREAD_PREFIX, idx))
        .build()?;

    log::info!(
        "[create_job_system] Started {} workers (batch size {})",
        worker_threads,
        batch_size
    );

    Ok(JobSystemData {
        pool: Arc::new(pool),
        worker_threads,
        batch_size: batch_size.max(1),
        in_flight: Arc::new(AtomicUsize::new(0)),
    })
}

fn new_slot<T>(label: &'static str) -> Arc<JobSlot<T>> {
    Arc::new(JobSlot {
        state: Mutex::new(SlotState::Pending { continuation: None }),
        finished: Condvar::new(),
        label,
    })
}

// ============================================================================
// SCHEDULING
// ============================================================================

/// Publish a job's result: hand it to a waiting dependent or park it for
/// `complete`
fn finish<T>(slot: &JobSlot<T>, result: std::thread::Result<T>) {
    let mut state = slot.state.lock();
    match std::mem::replace(&mut *state, SlotState::Taken) {
        SlotState::Pending {
            continuation: Some(next),
        } => {
            drop(state);
            next(result);
        }
        SlotState::Pending { continuation: None } => {
            *state = SlotState::Finished(result);
            slot.finished.notify_all();
        }
        other => {
            log::warn!("[finish] Job '{}' finished twice", slot.label);
            *state = other;
        }
    }
}

fn spawn_into<T, F>(
    pool: &Arc<rayon::ThreadPool>,
    in_flight: &Arc<AtomicUsize>,
    slot: Arc<JobSlot<T>>,
    f: F,
) where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    in_flight.fetch_add(1, Ordering::SeqCst);
    let in_flight = Arc::clone(in_flight);

    pool.spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(f));
        if result.is_err() {
            log::error!("[spawn_into] Job '{}' panicked", slot.label);
        }
        in_flight.fetch_sub(1, Ordering::SeqCst);
        finish(&slot, result);
    });
}

/// Queue `f` on the pool
pub fn schedule<T, F>(system: &JobSystemData, label: &'static str, f: F) -> JobHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let slot = new_slot(label);
    log::trace!("[schedule] Queued '{}'", label);
    spawn_into(&system.pool, &system.in_flight, Arc::clone(&slot), f);
    JobHandle { slot }
}

/// Queue `f` to run after `dependency`, consuming its output
///
/// If the dependency panicked, `f` never runs and completing the returned
/// handle reports the failure.
pub fn schedule_after<T, U, F>(
    system: &JobSystemData,
    dependency: JobHandle<T>,
    label: &'static str,
    f: F,
) -> JobHandle<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> U + Send + 'static,
{
    let slot = new_slot(label);
    let pool = Arc::clone(&system.pool);
    let in_flight = Arc::clone(&system.in_flight);
    let downstream = Arc::clone(&slot);

    let run_next = move |upstream: std::thread::Result<T>| match upstream {
        Ok(value) => spawn_into(&pool, &in_flight, downstream, move || f(value)),
        Err(payload) => finish(&downstream, Err(payload)),
    };

    log::trace!(
        "[schedule_after] Queued '{}' after '{}'",
        label,
        dependency.slot.label
    );

    let ready = {
        let mut state = dependency.slot.state.lock();
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Finished(result) => Some(result),
            SlotState::Pending { .. } => {
                *state = SlotState::Pending {
                    continuation: Some(Box::new(run_next)),
                };
                return JobHandle { slot };
            }
            SlotState::Taken => Some(Err(Box::new("dependency output already claimed")
                as Box<dyn std::any::Any + Send>)),
        }
    };

    if let Some(result) = ready {
        run_next(result);
    }

    JobHandle { slot }
}

/// Run `f` on the calling thread and return an already completed handle
pub fn run_immediate<T, F>(label: &'static str, f: F) -> JobHandle<T>
where
    F: FnOnce() -> T,
{
    let slot = new_slot(label);
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    *slot.state.lock() = SlotState::Finished(result);
    JobHandle { slot }
}

// ============================================================================
// COMPLETION
// ============================================================================

/// True once the job has finished (successfully or not)
pub fn is_completed<T>(handle: &JobHandle<T>) -> bool {
    matches!(*handle.slot.state.lock(), SlotState::Finished(_))
}

/// Block until the job finishes and take its output
pub fn complete<T>(handle: JobHandle<T>) -> OceanResult<T> {
    let slot = handle.slot;
    let mut state = slot.state.lock();
    loop {
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Finished(result) => {
                return result.map_err(|_| OceanError::TaskJoinError {
                    task: slot.label.to_string(),
                });
            }
            pending @ SlotState::Pending { .. } => {
                *state = pending;
                slot.finished.wait(&mut state);
            }
            SlotState::Taken => {
                return Err(OceanError::TaskJoinError {
                    task: format!("{} (output already claimed)", slot.label),
                });
            }
        }
    }
}

/// Jobs spawned on the pool that have not finished yet
pub fn in_flight(system: &JobSystemData) -> usize {
    system.in_flight.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    fn system() -> JobSystemData {
        create_job_system(2, 8).expect("pool")
    }

    #[test]
    fn test_schedule_and_complete() {
        let system = system();
        let handle = schedule(&system, "sum", || (1..=100u64).sum::<u64>());
        assert_eq!(complete(handle).expect("sum"), 5050);
    }

    #[test]
    fn test_dependent_job_sees_upstream_output() {
        let system = system();
        let upstream = schedule(&system, "produce", || {
            std::thread::sleep(Duration::from_millis(20));
            vec![1.0f32; 64]
        });
        let downstream = schedule_after(&system, upstream, "consume", |values: Vec<f32>| {
            values.iter().sum::<f32>()
        });
        assert_eq!(complete(downstream).expect("chain"), 64.0);
    }

    #[test]
    fn test_dependent_does_not_start_early() {
        let system = system();
        let upstream_done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&upstream_done);

        let upstream = schedule(&system, "slow", move || {
            std::thread::sleep(Duration::from_millis(30));
            flag.store(true, Ordering::SeqCst);
        });
        let observed = Arc::clone(&upstream_done);
        let downstream = schedule_after(&system, upstream, "check", move |_| {
            observed.load(Ordering::SeqCst)
        });

        assert!(complete(downstream).expect("chain"));
    }

    #[test]
    fn test_chain_on_already_finished_dependency() {
        let system = system();
        let upstream = run_immediate("ready", || 21u32);
        assert!(is_completed(&upstream));
        let downstream = schedule_after(&system, upstream, "double", |v| v * 2);
        assert_eq!(complete(downstream).expect("chain"), 42);
    }

    #[test]
    fn test_panic_is_reported_and_propagates() {
        let system = system();
        let upstream: JobHandle<u32> = schedule(&system, "explodes", || panic!("kernel failure"));
        let downstream = schedule_after(&system, upstream, "never_runs", |v| v + 1);

        match complete(downstream) {
            Err(OceanError::TaskJoinError { task }) => assert_eq!(task, "never_runs"),
            other => panic!("expected join error, got {:?}", other),
        }
    }

    #[test]
    fn test_in_flight_returns_to_zero() {
        let system = system();
        let handles: Vec<_> = (0..8)
            .map(|i| schedule(&system, "count", move || i * 2))
            .collect();
        let total: i32 = handles
            .into_iter()
            .map(|h| complete(h).expect("job"))
            .sum();
        assert_eq!(total, 56);
        assert_eq!(in_flight(&system), 0);
    }
}
