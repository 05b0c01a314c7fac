//! Fan-out / fan-in dispatch of a batch of names across workers.
//!
//! Both variants share the same protocol:
//!
//! 1. Size the job queue and result collector to the batch length so no send
//!    ever waits.
//! 2. Enqueue every item, then close the job queue.
//! 3. Run the worker(s) until the queue is drained.
//! 4. Drain exactly one result per item, then close the result collector.
//!
//! Draining a known count rather than waiting for end-of-stream means the
//! dispatcher never blocks on a result that will not arrive, and the result
//! collector is only closed once every worker send has completed.

mod pool;

pub use pool::WorkerPool;

use crate::{
    channel::{Receiver, Sender, channel},
    envelope::Envelope,
    worker::worker_loop,
};
use core::{num::NonZeroUsize, time::Duration};
use tokio::time::Instant;

/// Number of workers spawned by [`Dispatcher::concurrent`] in the service.
pub const NUM_WORKERS: NonZeroUsize = NonZeroUsize::new(5).unwrap();

/// Fixed latency of one simulated unit of work.
pub const WORK_DELAY: Duration = Duration::from_secs(1);

/// Worker label used by the sequential variant.
pub const SEQUENTIAL_WORKER_ID: usize = 1;

/// Runs a batch of names through the job queue and collects the greetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatcher {
    work_delay: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(WORK_DELAY)
    }
}

impl Dispatcher {
    pub const fn new(work_delay: Duration) -> Self {
        Self { work_delay }
    }

    pub const fn work_delay(&self) -> Duration {
        self.work_delay
    }

    /// Processes `items` with a single worker running on the calling task.
    ///
    /// Total latency is roughly `items.len() * work_delay`. Greetings come back
    /// in submission order, all labelled with [`SEQUENTIAL_WORKER_ID`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(items = items.len())))]
    pub async fn sequential<S: AsRef<str>>(&self, items: &[S]) -> Envelope {
        let start = Instant::now();
        let (job_tx, job_rx) = channel(items.len());
        let (result_tx, result_rx) = channel(items.len());

        enqueue(&job_tx, items).await;
        job_tx.close();

        worker_loop(SEQUENTIAL_WORKER_ID, job_rx, result_tx.clone(), self.work_delay).await;

        collect(&result_tx, &result_rx, items.len(), start).await
    }

    /// Processes `items` across `num_workers` concurrently running workers.
    ///
    /// Workers are spawned before anything is enqueued; they simply wait on the
    /// empty, open queue. Total latency is roughly
    /// `ceil(items.len() / num_workers) * work_delay`.
    ///
    /// Greetings are returned in completion order. Which worker handles which
    /// item is not deterministic. Workers beyond `items.len()` exit without
    /// producing anything.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip_all, fields(items = items.len(), workers = num_workers.get()))
    )]
    pub async fn concurrent<S: AsRef<str>>(
        &self,
        items: &[S],
        num_workers: NonZeroUsize,
    ) -> Envelope {
        let start = Instant::now();
        let (job_tx, job_rx) = channel(items.len());
        let (result_tx, result_rx) = channel(items.len());

        let pool = WorkerPool::spawn(num_workers, &job_rx, &result_tx, self.work_delay);

        enqueue(&job_tx, items).await;
        job_tx.close();

        let envelope = collect(&result_tx, &result_rx, items.len(), start).await;
        pool.join().await;
        envelope
    }
}

async fn enqueue<S: AsRef<str>>(jobs: &Sender<String>, items: &[S]) {
    for item in items {
        jobs.send(item.as_ref().to_owned()).await;
    }
}

/// Drains exactly `expected` greetings, closes `results`, and stamps the
/// elapsed time since `start`.
async fn collect(
    results: &Sender<String>,
    rx: &Receiver<String>,
    expected: usize,
    start: Instant,
) -> Envelope {
    let mut envelope = Envelope::with_capacity(expected);

    for _ in 0..expected {
        // `results` stays open until this loop finishes, so `recv` only
        // returns once a worker has delivered.
        let Some(greeting) = rx.recv().await else {
            break;
        };
        envelope.greetings.push(greeting);
    }

    results.close();
    envelope.elapsed_seconds = start.elapsed().as_secs_f64();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "Collected {} greetings in {:.3}s",
        envelope.greetings.len(),
        envelope.elapsed_seconds
    );

    envelope
}
