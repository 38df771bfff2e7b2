//! The async worker pool and its executor seam.
//!
//! Stores never spawn threads themselves; they hold an `Arc<dyn Executor>`
//! supplied at construction. [`WorkerPool`] is the production executor, a
//! small bounded pool meant to be shared by every pack in the process.
//! [`InlineExecutor`] runs jobs on the submitting thread and is the
//! deterministic stand-in for tests.
//!
//! Work submitted from inside a pool job that then blocks on another job of
//! the same pool can exhaust the pool and deadlock. Callers own that
//! constraint; the pool does not detect it.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{BoxError, TaskError};
use crate::future::{self, PackFuture};

/// A unit of work handed to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs, now or later, on some thread.
pub trait Executor: Send + Sync {
    /// Accept a job. Jobs beyond the executor's capacity queue.
    fn execute(&self, job: Job);
}

/// Wrap `task` into a [`Job`] without submitting it.
///
/// The returned future resolves when the job runs. Errors and panics from
/// `task` are captured as [`TaskError`]s.
pub fn prepare<T, F>(task: F) -> (Job, PackFuture<T>)
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, BoxError> + Send + 'static,
{
    let (promise, future) = future::pair();
    let job: Job = Box::new(move || {
        if !promise.start() {
            trace!("skipping cancelled task");
            return;
        }
        let result = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TaskError::Failed(e.to_string())),
            Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
        };
        promise.complete(result);
    });
    (job, future)
}

/// Submit `task` to `executor` and return its future.
pub fn submit<T, F>(executor: &dyn Executor, task: F) -> PackFuture<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, BoxError> + Send + 'static,
{
    let (job, future) = prepare(task);
    executor.execute(job);
    future
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Configuration for a [`WorkerPool`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Maximum number of jobs running at once.
    pub threads: usize,
    /// Name given to pool threads.
    pub thread_name: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self {
            threads: (cpus / 2).max(1),
            thread_name: "rrp-worker".to_string(),
        }
    }
}

/// Bounded, shared worker pool backed by a tokio runtime's blocking pool.
///
/// Dropping the pool shuts the runtime down without waiting: running jobs
/// finish on their detached threads, queued jobs are discarded and their
/// futures resolve as [`TaskError::Abandoned`].
pub struct WorkerPool {
    runtime: Option<tokio::runtime::Runtime>,
    config: WorkerPoolConfig,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> io::Result<Self> {
        let threads = config.threads.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(threads)
            .thread_name(config.thread_name.clone())
            .build()?;
        debug!(threads, name = %config.thread_name, "worker pool started");
        Ok(Self {
            runtime: Some(runtime),
            config: WorkerPoolConfig { threads, ..config },
        })
    }

    pub fn with_defaults() -> io::Result<Self> {
        Self::new(WorkerPoolConfig::default())
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) {
        if let Some(runtime) = &self.runtime {
            trace!(pool = %self.config.thread_name, "job submitted");
            // Detached; completion is observed through the job's future.
            drop(runtime.spawn_blocking(job));
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            debug!(name = %self.config.thread_name, "worker pool shut down");
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.config.threads)
            .field("thread_name", &self.config.thread_name)
            .finish()
    }
}

/// Runs every job immediately on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::time::{Duration, Instant};

    fn small_pool(threads: usize) -> WorkerPool {
        WorkerPool::new(WorkerPoolConfig {
            threads,
            thread_name: "rrp-test".into(),
        })
        .unwrap()
    }

    #[test]
    fn inline_runs_before_returning() {
        let future = submit(&InlineExecutor, || Ok::<_, BoxError>(5));
        assert_eq!(future.try_get(), Some(Ok(5)));
    }

    #[test]
    fn errors_are_captured() {
        let future = submit(&InlineExecutor, || Err::<u8, BoxError>("boom".into()));
        assert_eq!(future.get(), Err(TaskError::Failed("boom".into())));
    }

    #[test]
    fn panics_are_captured() {
        let future = submit(&InlineExecutor, || -> Result<u8, BoxError> { panic!("kaput") });
        assert_eq!(future.get(), Err(TaskError::Panicked("kaput".into())));
    }

    #[test]
    fn cancelled_before_run_is_skipped() {
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        let (job, future) = prepare(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(())
        });
        assert!(future.cancel());
        InlineExecutor.execute(job);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(future.get(), Err(TaskError::Cancelled));
    }

    #[test]
    fn pool_runs_jobs_off_thread() {
        let pool = small_pool(2);
        let caller = std::thread::current().id();
        let future = submit(&pool, move || Ok::<_, BoxError>(std::thread::current().id() != caller));
        assert_eq!(future.get(), Ok(true));
    }

    #[test]
    fn pool_is_bounded() {
        let pool = small_pool(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let futures: Vec<_> = (0..6)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                submit(&pool, move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                })
            })
            .collect();
        for f in futures {
            f.get().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn pool_runs_jobs_concurrently() {
        let pool = small_pool(2);
        let barrier = Arc::new(Barrier::new(2));
        let start = Instant::now();
        let futures: Vec<_> = (0..2)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                submit(&pool, move || {
                    barrier.wait();
                    Ok::<_, BoxError>(())
                })
            })
            .collect();
        for f in futures {
            f.get().unwrap();
        }
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn default_config_has_at_least_one_thread() {
        let config = WorkerPoolConfig::default();
        assert!(config.threads >= 1);
        assert_eq!(config.thread_name, "rrp-worker");
    }
}
