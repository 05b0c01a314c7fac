use crate::channel::{Receiver, Sender};
use core::time::Duration;

/// Formats the result message for `item` processed by `worker_id`.
pub fn greeting(item: &str, worker_id: usize) -> String {
    format!("Hello {item} from worker number {worker_id}")
}

/// Worker task that turns queued names into greetings.
///
/// The worker pulls one item at a time from `jobs`, spends `work_delay` on it,
/// then pushes exactly one greeting into `results`. It runs until `jobs` is
/// closed and drained; that is the only way the loop ends.
///
/// A worker never closes either channel. Closing belongs to whoever created
/// them.
///
/// # Arguments
///
/// - `worker_id`: Numeric label embedded in every greeting this worker emits.
/// - `jobs`: Shared job queue. Other workers may hold clones of it.
/// - `results`: Shared result collector.
/// - `work_delay`: Fixed latency of the simulated unit of work.
///
/// # Panics
///
/// Panics if `results` was closed while this worker still had a greeting to
/// deliver.
pub async fn worker_loop(
    worker_id: usize,
    jobs: Receiver<String>,
    results: Sender<String>,
    work_delay: Duration,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    while let Some(item) = jobs.recv().await {
        tokio::time::sleep(work_delay).await;

        #[cfg(feature = "tracing")]
        tracing::trace!("Worker {worker_id} finished {item}");

        results.send(greeting(&item, worker_id)).await;
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}
