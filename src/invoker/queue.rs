//! Per-function serialized dispatch.
//!
//! Each key owns one worker task fed by an unbounded channel. The worker runs
//! jobs one after another, so a key never has two jobs in flight and jobs run
//! in the order they were submitted. Different keys have different workers
//! and run concurrently.
//!
//! Submission happens when [`InvocationQueue::enqueue`] is called, not when
//! the returned future is first polled.

use dashmap::DashMap;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::observability::metrics;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The task panicked, or its worker is gone.
    #[error("queued task for {key} did not complete")]
    Aborted { key: String },
}

struct Lane {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
}

/// Lazily created FIFO lanes, one per key, kept for the process lifetime.
#[derive(Clone, Default)]
pub struct InvocationQueue {
    lanes: Arc<DashMap<String, Lane>>,
}

impl InvocationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` behind every task already submitted for `key`.
    ///
    /// Dropping the returned future does not cancel the task; it still runs
    /// in its turn.
    pub fn enqueue<F, T>(&self, key: &str, task: F) -> impl Future<Output = Result<T, QueueError>> + Send + 'static
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = result_tx.send(task.await);
        });
        self.submit(key, job);

        let key = key.to_string();
        async move { result_rx.await.map_err(|_| QueueError::Aborted { key }) }
    }

    /// Tasks queued or running for `key`.
    pub fn depth(&self, key: &str) -> usize {
        self.lanes
            .get(key)
            .map(|lane| lane.depth.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Number of keys that have been used so far.
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    fn submit(&self, key: &str, job: Job) {
        let lane = self
            .lanes
            .entry(key.to_string())
            .or_insert_with(|| spawn_lane(key.to_string()));

        let depth = lane.depth.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_queue_depth(key, depth);

        if lane.tx.send(job).is_err() {
            lane.depth.fetch_sub(1, Ordering::SeqCst);
            tracing::error!(function = %key, "Invocation worker is gone, task dropped");
        }
    }
}

fn spawn_lane(key: String) -> Lane {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
    let depth = Arc::new(AtomicUsize::new(0));
    let worker_depth = depth.clone();

    tracing::debug!(function = %key, "Creating invocation lane");

    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                tracing::error!(function = %key, "Queued invocation panicked");
            }
            let depth = worker_depth.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::record_queue_depth(&key, depth);
        }
    });

    Lane { tx, depth }
}
