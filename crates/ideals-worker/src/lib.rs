//! Background worker for blocking work driven from async callers.
//!
//! Tasks travel over a bounded channel to a dispatcher task, which runs each
//! one on tokio's blocking pool so archive I/O and decoding never stall the
//! caller's scheduler. Tasks run independently; no ordering is kept between
//! them.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::warn;
use tracing::Instrument;

/// Channel capacity used by [`Worker::new`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// A unit of blocking work. Failures belong in `Output`.
pub trait Task: Send + 'static {
    type Output: Send + 'static;
    fn run(self) -> Self::Output;
}

type Job = Box<dyn FnOnce() + Send>;

struct WorkerInner {
    sender: mpsc::Sender<Job>,
    shutdown_sender: Option<oneshot::Sender<()>>,
}

#[derive(Clone)]
pub struct Worker {
    inner: Arc<WorkerInner>,
}

impl Worker {
    /// Start a worker on the current tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Start a worker whose queue holds at most `capacity` pending tasks.
    #[instrument]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, mut receiver) = mpsc::channel::<Job>(capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        debug!(capacity, "Creating new worker");

        tokio::spawn(
            async move {
                info!("Worker task started");
                loop {
                    tokio::select! {
                        Some(job) = receiver.recv() => {
                            tokio::task::spawn_blocking(job);
                        }
                        _ = &mut shutdown_rx => {
                            info!("Worker received shutdown signal");
                            break;
                        }
                        else => break,
                    }
                }
                info!("Worker task stopped");
            }
            .in_current_span(),
        );

        Self {
            inner: Arc::new(WorkerInner {
                sender,
                shutdown_sender: Some(shutdown_tx),
            }),
        }
    }

    /// Run `task` on the blocking pool and wait for its output.
    ///
    /// Dropping the returned future abandons the result: the task still runs
    /// to completion and its output is discarded.
    #[instrument(skip(self, task))]
    pub async fn wait_for<T: Task>(&self, task: T) -> Result<T::Output> {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            if tx.send(task.run()).is_err() {
                debug!("Discarding task result - caller went away");
            }
        });

        self.inner.sender.send(job).await.map_err(|e| {
            error!(?e, "Failed to send task");
            anyhow::anyhow!("Failed to send task: {}", e)
        })?;

        rx.await.map_err(|e| {
            error!(?e, "Failed to receive task result");
            anyhow::anyhow!("Failed to receive result: {}", e)
        })
    }
}

impl Drop for WorkerInner {
    fn drop(&mut self) {
        debug!("WorkerInner being dropped");
        if let Some(sender) = self.shutdown_sender.take() {
            if sender.send(()).is_err() {
                warn!("Failed to send shutdown signal - receiver already dropped");
            }
        }
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("capacity", &self.inner.sender.max_capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use tokio::time::sleep;
    use tokio::time::timeout;

    use super::*;

    struct Double(i32);

    impl Task for Double {
        type Output = i32;

        fn run(self) -> i32 {
            self.0 * 2
        }
    }

    struct Slow(Duration, Arc<AtomicUsize>);

    impl Task for Slow {
        type Output = ();

        fn run(self) {
            std::thread::sleep(self.0);
            self.1.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fails;

    impl Task for Fails {
        type Output = Result<(), String>;

        fn run(self) -> Self::Output {
            Err("no such entry".to_string())
        }
    }

    struct Panics;

    impl Task for Panics {
        type Output = ();

        fn run(self) {
            panic!("task panicked");
        }
    }

    #[tokio::test]
    async fn test_wait_for() {
        let worker = Worker::new();
        assert_eq!(worker.wait_for(Double(21)).await.unwrap(), 42);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_wait_for_waits_for_queue_room() {
        let worker = Worker::with_capacity(1);
        let mut handles = Vec::new();

        for i in 0..4 {
            let worker = worker.clone();
            handles.push(tokio::spawn(async move { worker.wait_for(Double(i)).await }));
        }

        for (i, handle) in (0..4).zip(handles) {
            assert_eq!(handle.await.unwrap().unwrap(), i * 2);
        }
    }

    #[tokio::test]
    async fn test_output_carries_task_errors() {
        let worker = Worker::new();
        let result = worker.wait_for(Fails).await.unwrap();
        assert_eq!(result, Err("no such entry".to_string()));

        assert_eq!(worker.wait_for(Double(1)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_panicking_task_is_an_error() {
        let worker = Worker::new();
        assert!(worker.wait_for(Panics).await.is_err());
        assert_eq!(worker.wait_for(Double(5)).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_abandoned_task_still_completes() {
        let worker = Worker::new();
        let count = Arc::new(AtomicUsize::new(0));

        let abandoned = timeout(
            Duration::from_millis(10),
            worker.wait_for(Slow(Duration::from_millis(100), count.clone())),
        )
        .await;
        assert!(abandoned.is_err());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_tasks() {
        let worker = Worker::new();
        let mut handles = Vec::new();

        for i in 0..10 {
            let worker = worker.clone();
            handles.push(tokio::spawn(async move {
                assert_eq!(worker.wait_for(Double(i)).await.unwrap(), i * 2);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_shutdown() {
        {
            let worker = Worker::new();
            worker.wait_for(Double(2)).await.unwrap();
        }
        sleep(Duration::from_millis(50)).await;
    }
}
