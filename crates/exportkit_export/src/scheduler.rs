//! Bounded background worker pool with rejection policies.
//!
//! Tasks wait in an explicit FIFO queue; every admitted task schedules one
//! drainer on a rayon thread pool that pops and runs the oldest queued task.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use log::{error, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::spec::{EnumRejectionPolicy, SchedulerError, SpecWorkerPoolOptions};
use crate::util::calculate_worker_limit;

////////////////////////////////////////////////////////////////////////////////
// #region Contracts

/// Unit of background work.
///
/// A scheduler either runs a task or discards it, exactly once.
pub trait ScheduledTask: Send {
    /// Short name used in logs and errors.
    fn label(&self) -> String;
    fn run(self: Box<Self>);
    /// Called instead of `run` when the scheduler drops the task.
    fn discard(self: Box<Self>, err: SchedulerError);
}

/// Background task executor.
pub trait TaskScheduler: Send + Sync {
    /// Hand `task` over for execution.
    ///
    /// On `Err` the task has already been discarded.
    fn submit(&self, task: Box<dyn ScheduledTask>) -> Result<(), SchedulerError>;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkerPool

struct SpecPoolState {
    l_tasks: VecDeque<Box<dyn ScheduledTask>>,
    n_running: usize,
    if_closed: bool,
}

struct SpecPoolShared {
    state: Mutex<SpecPoolState>,
    cond_idle: Condvar,
}

impl SpecPoolShared {
    fn lock(&self) -> MutexGuard<'_, SpecPoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decrements the running count when a task ends, panics included.
struct SpecRunningGuard {
    shared: Arc<SpecPoolShared>,
}

impl Drop for SpecRunningGuard {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.n_running = state.n_running.saturating_sub(1);
        drop(state);
        self.shared.cond_idle.notify_all();
    }
}

fn derive_panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(c_msg) = payload.downcast_ref::<&str>() {
        return (*c_msg).to_string();
    }
    if let Some(c_msg) = payload.downcast_ref::<String>() {
        return c_msg.clone();
    }
    "non-string panic payload".to_string()
}

fn run_task_logged(task: Box<dyn ScheduledTask>) {
    let c_label = task.label();
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || task.run())) {
        error!(
            "task {c_label:?} panicked: {}",
            derive_panic_message(payload.as_ref())
        );
    }
}

fn drain_one(shared: &Arc<SpecPoolShared>) {
    let task = {
        let mut state = shared.lock();
        let Some(task) = state.l_tasks.pop_front() else {
            return;
        };
        state.n_running += 1;
        task
    };
    let _guard = SpecRunningGuard {
        shared: Arc::clone(shared),
    };
    run_task_logged(task);
}

/// Bounded worker pool.
///
/// At most `n_workers + queue_capacity` tasks are outstanding; past that the
/// configured [`EnumRejectionPolicy`] decides.
pub struct WorkerPool {
    thread_pool: ThreadPool,
    shared: Arc<SpecPoolShared>,
    n_workers: usize,
    options: SpecWorkerPoolOptions,
}

impl WorkerPool {
    pub fn new(options: SpecWorkerPoolOptions) -> Result<Self, SchedulerError> {
        if options.queue_capacity == 0 {
            return Err(SchedulerError::Init(
                "queue_capacity must be >= 1.".to_string(),
            ));
        }

        let n_workers = calculate_worker_limit(options.num_workers_max);
        let c_prefix = options.thread_name_prefix.clone();
        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .thread_name(move |n_idx| format!("{c_prefix}-{n_idx}"))
            .panic_handler(|payload| {
                error!(
                    "worker thread panicked: {}",
                    derive_panic_message(payload.as_ref())
                );
            })
            .build()
            .map_err(|err| SchedulerError::Init(err.to_string()))?;

        info!(
            "worker pool started: workers={n_workers} queue_capacity={} policy={:?}",
            options.queue_capacity, options.rule_rejection
        );
        Ok(Self {
            thread_pool,
            shared: Arc::new(SpecPoolShared {
                state: Mutex::new(SpecPoolState {
                    l_tasks: VecDeque::new(),
                    n_running: 0,
                    if_closed: false,
                }),
                cond_idle: Condvar::new(),
            }),
            n_workers,
            options,
        })
    }

    pub fn n_workers(&self) -> usize {
        self.n_workers
    }

    /// Tasks waiting for a worker.
    pub fn n_queued(&self) -> usize {
        self.shared.lock().l_tasks.len()
    }

    /// Tasks currently running on workers.
    pub fn n_running(&self) -> usize {
        self.shared.lock().n_running
    }

    fn spawn_drainer(&self) {
        let shared = Arc::clone(&self.shared);
        self.thread_pool.spawn(move || drain_one(&shared));
    }

    /// Stop admitting tasks and wait for the pool to drain.
    ///
    /// Unless `if_wait_for_tasks_on_shutdown` is set, queued tasks are
    /// discarded first. Returns `true` when no task is queued or running
    /// before `dur_await_termination` elapses.
    pub fn shutdown(&self) -> bool {
        let mut state = self.shared.lock();
        state.if_closed = true;

        if !self.options.if_wait_for_tasks_on_shutdown {
            let l_dropped: Vec<Box<dyn ScheduledTask>> = state.l_tasks.drain(..).collect();
            drop(state);
            for task in l_dropped {
                let c_label = task.label();
                warn!("task {c_label:?} discarded on shutdown");
                task.discard(SchedulerError::ShutDown(c_label));
            }
            state = self.shared.lock();
        }

        let t_deadline = Instant::now() + self.options.dur_await_termination;
        while !(state.l_tasks.is_empty() && state.n_running == 0) {
            let t_now = Instant::now();
            if t_now >= t_deadline {
                warn!(
                    "worker pool shutdown timed out with {} queued and {} running tasks",
                    state.l_tasks.len(),
                    state.n_running
                );
                return false;
            }
            let (guard, _) = self
                .shared
                .cond_idle
                .wait_timeout(state, t_deadline - t_now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        info!("worker pool drained");
        true
    }
}

impl TaskScheduler for WorkerPool {
    fn submit(&self, task: Box<dyn ScheduledTask>) -> Result<(), SchedulerError> {
        let mut state = self.shared.lock();
        if state.if_closed {
            drop(state);
            let err = SchedulerError::ShutDown(task.label());
            task.discard(err.clone());
            return Err(err);
        }

        if state.l_tasks.len() + state.n_running < self.n_workers + self.options.queue_capacity {
            state.l_tasks.push_back(task);
            drop(state);
            self.spawn_drainer();
            return Ok(());
        }

        match self.options.rule_rejection {
            EnumRejectionPolicy::Abort => {
                drop(state);
                let err = SchedulerError::Rejected(task.label());
                warn!("{err}");
                task.discard(err.clone());
                Err(err)
            }
            EnumRejectionPolicy::CallerRuns => {
                drop(state);
                warn!(
                    "worker queue full, running task {:?} on the caller thread",
                    task.label()
                );
                run_task_logged(task);
                Ok(())
            }
            EnumRejectionPolicy::Discard => {
                drop(state);
                let err = SchedulerError::Discarded(task.label());
                warn!("{err}");
                task.discard(err);
                Ok(())
            }
            EnumRejectionPolicy::DiscardOldest => {
                // A full pool always has at least one queued task.
                let task_oldest = state.l_tasks.pop_front();
                state.l_tasks.push_back(task);
                drop(state);
                if let Some(task_oldest) = task_oldest {
                    let err = SchedulerError::Discarded(task_oldest.label());
                    warn!("{err}");
                    task_oldest.discard(err);
                }
                Ok(())
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.shared.lock().if_closed {
            self.shutdown();
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
