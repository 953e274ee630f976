//! Named, fire-and-forget task pools.
//!
//! A [`WorkerPool`] spawns tasks onto a tokio runtime and never hands their
//! results back to the submitter. A task that returns an error or panics is
//! reported to the pool's [`FailureHandler`] instead.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, warn};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::AbortHandle;

use crate::server::error::Error;
use crate::server::metrics::ServerMetrics;

/// Receives failures that escaped a pool task.
pub trait FailureHandler: Send + Sync {
    fn uncaught(&self, pool: &str, error: &Error);
}

/// Logs every escaped failure and keeps the process running.
pub struct LoggingFailureHandler {
    metrics: Arc<ServerMetrics>,
}

impl LoggingFailureHandler {
    pub fn new(metrics: Arc<ServerMetrics>) -> Self {
        Self { metrics }
    }
}

impl FailureHandler for LoggingFailureHandler {
    fn uncaught(&self, pool: &str, error: &Error) {
        self.metrics.uncaught_failure();
        error!("Task in {pool} encountered uncaught error: {error}");
    }
}

/// A named task pool over a tokio runtime handle.
///
/// Cloning is cheap; clones share the same task set and shutdown state.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    name: String,
    handle: Handle,
    failure_handler: Arc<dyn FailureHandler>,
    shutdown: AtomicBool,
    next_task: AtomicU64,
    tasks: Mutex<HashMap<u64, AbortHandle>>,
    idle: Notify,
}

impl PoolInner {
    fn tasks(&self) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, id: u64) {
        let mut tasks = self.tasks();
        tasks.remove(&id);
        if tasks.is_empty() {
            self.idle.notify_waiters();
        }
    }
}

/// Removes a task from its pool however the task ends, reporting panics.
struct TaskGuard {
    pool: Arc<PoolInner>,
    id: u64,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let error = Error::TaskPanicked(self.pool.name.clone());
            self.pool.failure_handler.uncaught(&self.pool.name, &error);
        }
        self.pool.release(self.id);
    }
}

impl WorkerPool {
    /// Create a pool that spawns onto `handle` and reports to `failure_handler`.
    pub fn new(name: impl Into<String>, handle: Handle, failure_handler: Arc<dyn FailureHandler>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                name: name.into(),
                handle,
                failure_handler,
                shutdown: AtomicBool::new(false),
                next_task: AtomicU64::new(0),
                tasks: Mutex::new(HashMap::new()),
                idle: Notify::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Queue `task` for execution.
    ///
    /// Returns `false` when the pool is shut down; the task is then dropped
    /// unpolled, which closes any connection it owns.
    pub fn submit<F>(&self, task: F) -> bool
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        if self.is_shutdown() {
            warn!("Pool {name} is shut down, dropping submitted task", name = self.inner.name);
            return false;
        }

        let pool = Arc::clone(&self.inner);
        let id = self.inner.next_task.fetch_add(1, Ordering::Relaxed);

        // Held across spawn so a fast task cannot release before it is recorded
        let mut tasks = self.inner.tasks();
        let join = self.inner.handle.spawn(async move {
            let _guard = TaskGuard { pool: Arc::clone(&pool), id };
            if let Err(e) = task.await {
                pool.failure_handler.uncaught(&pool.name, &e);
            }
        });
        tasks.insert(id, join.abort_handle());
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::SeqCst)
    }

    /// Number of submitted tasks that have not finished yet.
    pub fn active_tasks(&self) -> usize {
        self.inner.tasks().len()
    }

    /// Stop accepting tasks, wait up to `grace` for running ones, then abort
    /// the rest. Returns how many tasks were aborted.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.inner.shutdown.store(true, Ordering::SeqCst);

        if tokio::time::timeout(grace, self.wait_idle()).await.is_ok() {
            debug!("Pool {name} drained", name = self.inner.name);
            return 0;
        }

        let remaining: Vec<AbortHandle> = self.inner.tasks().drain().map(|(_, handle)| handle).collect();
        for handle in &remaining {
            handle.abort();
        }
        warn!(
            "Pool {name} did not drain within {grace:?}, aborted {count} tasks",
            name = self.inner.name,
            count = remaining.len()
        );
        remaining.len()
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.inner.tasks().is_empty() {
                return;
            }
            notified.await;
        }
    }
}
