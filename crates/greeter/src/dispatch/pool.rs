//! Spawned worker tasks for the concurrent dispatch variant.
//!
//! Unlike a long-lived pool, a [`WorkerPool`] lives for exactly one batch: the
//! workers share a single job queue, compete for its items, and exit once the
//! queue is closed and drained.

use crate::{
    channel::{Receiver, Sender},
    worker::worker_loop,
};
use core::{num::NonZeroUsize, time::Duration};
use tokio::task::JoinHandle;

/// Handles to the worker tasks of a single concurrent dispatch.
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `num_workers` Tokio tasks running [`worker_loop`], labelled
    /// `0..num_workers`.
    ///
    /// Every worker gets its own clone of `jobs` and `results`; the caller
    /// keeps ownership of closing both.
    pub fn spawn(
        num_workers: NonZeroUsize,
        jobs: &Receiver<String>,
        results: &Sender<String>,
        work_delay: Duration,
    ) -> Self {
        let workers = (0..num_workers.get())
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    jobs.clone(),
                    results.clone(),
                    work_delay,
                ))
            })
            .collect();

        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Waits for every worker to exit.
    ///
    /// Only returns once the job queue has been closed and drained. A worker
    /// panic is re-raised on the caller.
    pub async fn join(self) {
        let outcomes = futures::future::join_all(self.workers).await;

        for (_worker_id, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(()) => {}
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker {_worker_id} was cancelled: {_err}");
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!("Worker pool joined");
    }
}
