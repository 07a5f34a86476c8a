//! Bounded worker pool shared by games.
//!
//! A `WorkerPool` owns a multi-thread tokio runtime. Game loops run as
//! async tasks on it and each player turn runs on its blocking pool, which
//! is capped at `max_workers` threads across every game using the pool.

use crate::error::GameError;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

/// Default cap on concurrently running player turns
pub const DEFAULT_MAX_WORKERS: usize = 50;

/// Owned runtime for game loops and player turns
pub struct WorkerPool {
    runtime: Option<Runtime>,
    max_workers: usize,
}

impl WorkerPool {
    /// Build a pool that runs at most `max_workers` player turns at once
    pub fn new(max_workers: usize) -> Result<Self, GameError> {
        let max_workers = max_workers.max(1);
        let runtime = Builder::new_multi_thread()
            .thread_name("catan-worker")
            .max_blocking_threads(max_workers)
            .enable_all()
            .build()?;
        info!("Worker pool started with {} workers", max_workers);
        Ok(Self {
            runtime: Some(runtime),
            max_workers,
        })
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Handle for spawning onto the pool
    pub fn handle(&self) -> Result<Handle, GameError> {
        self.runtime
            .as_ref()
            .map(|rt| rt.handle().clone())
            .ok_or_else(|| GameError::Corrupted("worker pool already shut down".into()))
    }

    /// Stop the pool, waiting up to `timeout` for running work
    pub fn shutdown(mut self, timeout: Duration) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(timeout);
            info!("Worker pool shut down");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Timed-out turns may still be blocked in player code
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_runs_blocking_work() {
        let pool = WorkerPool::new(2).unwrap();
        let handle = pool.handle().unwrap();
        let value = handle
            .block_on(async { tokio::task::spawn_blocking(|| 21 * 2).await })
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.max_workers(), 2);
        pool.shutdown(Duration::from_millis(100));
    }
}
