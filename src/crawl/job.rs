// src/crawl/job.rs
// =============================================================================
// The per-job context handed to the pipeline.
//
// A job carries three things explicitly:
// - the id of the worker running it (for logs)
// - its own deadline, derived from the fixed per-domain crawl timeout
// - the session's cancellation token
//
// Every suspension point in the pipeline goes through guard(), which races
// the operation against the deadline and the cancellation token.
// =============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("crawl deadline exceeded")]
    DeadlineExceeded,
    #[error("crawl session cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct JobContext {
    worker_id: usize,
    deadline: Instant,
    cancel: CancellationToken,
}

impl JobContext {
    pub fn new(worker_id: usize, timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            worker_id,
            deadline: Instant::now() + timeout,
            cancel,
        }
    }

    /// A context for a one-off crawl outside of any session.
    pub fn standalone(timeout: Duration) -> Self {
        Self::new(0, timeout, CancellationToken::new())
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn deadline_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `operation` unless the deadline passes or the session is
    /// cancelled first.
    pub async fn guard<F>(&self, operation: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = tokio::time::sleep_until(self.deadline) => Err(Interrupted::DeadlineExceeded),
            output = operation => Ok(output),
        }
    }
}
