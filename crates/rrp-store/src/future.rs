//! Shareable completion handles for work submitted to an [`Executor`](crate::Executor).
//!
//! A job is split into a [`Promise`] (held by the job) and any number of
//! [`PackFuture`] clones (held by the store and by callers). Readers block in
//! [`PackFuture::get`] until the promise is completed. A promise dropped
//! without completing resolves as [`TaskError::Abandoned`] so readers never
//! hang on a job the executor discarded.
//!
//! A tokio `oneshot` hands its value to a single receiver and a `watch`
//! receiver is awaited inside a runtime. Here every clone must observe the
//! same result, and readers are plain threads with no runtime, so the slot
//! is a `Mutex` guarded state with a `Condvar` to wake waiters.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex};

use crate::error::TaskError;

enum State<T> {
    Pending,
    Running,
    Done(Result<T, TaskError>),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn finish(&self, result: Result<T, TaskError>) -> bool {
        let mut state = self.state.lock().expect("future lock poisoned");
        if matches!(*state, State::Done(_)) {
            return false;
        }
        *state = State::Done(result);
        self.ready.notify_all();
        true
    }
}

/// Create a connected promise/future pair.
pub fn pair<T>() -> (Promise<T>, PackFuture<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State::Pending),
        ready: Condvar::new(),
    });
    (
        Promise {
            shared: Arc::clone(&shared),
            completed: false,
        },
        PackFuture { shared },
    )
}

/// The producing side of a [`PackFuture`].
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
    completed: bool,
}

impl<T> Promise<T> {
    /// Transition to running. Returns `false` if the future was cancelled,
    /// in which case the job must not run.
    pub fn start(&self) -> bool {
        let mut state = self.shared.state.lock().expect("future lock poisoned");
        match *state {
            State::Pending => {
                *state = State::Running;
                true
            }
            State::Running => true,
            State::Done(_) => false,
        }
    }

    /// Publish the result and wake every waiting reader.
    pub fn complete(mut self, result: Result<T, TaskError>) {
        self.completed = true;
        self.shared.finish(result);
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if !self.completed {
            self.shared.finish(Err(TaskError::Abandoned));
        }
    }
}

/// A cloneable handle to the eventual result of a submitted job.
pub struct PackFuture<T> {
    shared: Arc<Shared<T>>,
}

impl<T> PackFuture<T> {
    /// A future that is already resolved to `value`.
    pub fn ready(value: T) -> Self {
        let (promise, future) = pair();
        promise.complete(Ok(value));
        future
    }

    /// Returns `true` once a result (value or error) is available.
    pub fn is_done(&self) -> bool {
        matches!(
            *self.shared.state.lock().expect("future lock poisoned"),
            State::Done(_)
        )
    }

    /// Best-effort cancellation.
    ///
    /// Succeeds only while the job is still queued; a job that already
    /// started runs to completion and this returns `false`.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.state.lock().expect("future lock poisoned");
        if matches!(*state, State::Pending) {
            *state = State::Done(Err(TaskError::Cancelled));
            self.shared.ready.notify_all();
            true
        } else {
            false
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            *self.shared.state.lock().expect("future lock poisoned"),
            State::Done(Err(TaskError::Cancelled))
        )
    }
}

impl<T: Clone> PackFuture<T> {
    /// Block until the job finishes and return its result.
    ///
    /// Once resolved, every call returns immediately.
    pub fn get(&self) -> Result<T, TaskError> {
        let mut state = self.shared.state.lock().expect("future lock poisoned");
        loop {
            if let State::Done(result) = &*state {
                return result.clone();
            }
            state = self.shared.ready.wait(state).expect("future lock poisoned");
        }
    }

    /// The result if available, without blocking.
    pub fn try_get(&self) -> Option<Result<T, TaskError>> {
        match &*self.shared.state.lock().expect("future lock poisoned") {
            State::Done(result) => Some(result.clone()),
            _ => None,
        }
    }
}

impl<T> Clone for PackFuture<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for PackFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.shared.state.lock().expect("future lock poisoned") {
            State::Pending => "pending",
            State::Running => "running",
            State::Done(Ok(_)) => "done",
            State::Done(Err(_)) => "failed",
        };
        f.debug_struct("PackFuture").field("state", &state).finish()
    }
}
