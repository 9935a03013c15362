// src/orchestrator/workers.rs
// =============================================================================
// The worker pool: a fixed set of long-lived crawl tasks.
//
// Each worker loops:
// 1. wait for a domain from the frontier (or cancellation)
// 2. build a job context with the fixed crawl timeout and its own id
// 3. run the crawl pipeline, which always returns an outcome
// 4. push the outcome onto the bounded outcome queue
//
// A worker only stops when the session is cancelled, and then it drops
// whatever it was working on instead of pushing a partial result.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::crawl::{CrawlOutcome, DomainCrawler, JobContext};

use super::frontier::Frontier;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        size: usize,
        frontier: Frontier,
        crawler: Arc<dyn DomainCrawler>,
        outcomes: mpsc::Sender<CrawlOutcome>,
        crawl_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let handles = (0..size)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    frontier.clone(),
                    crawler.clone(),
                    outcomes.clone(),
                    crawl_timeout,
                    cancel.clone(),
                ))
            })
            .collect();

        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to exit. Workers exit once the session is cancelled.
    pub async fn join(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!(error = %e, "crawl worker panicked");
            }
        }
    }
}

async fn run_worker(
    worker_id: usize,
    frontier: Frontier,
    crawler: Arc<dyn DomainCrawler>,
    outcomes: mpsc::Sender<CrawlOutcome>,
    crawl_timeout: Duration,
    cancel: CancellationToken,
) {
    debug!(worker_id, "worker started");

    loop {
        let domain = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            domain = frontier.dequeue() => match domain {
                Some(domain) => domain,
                None => break,
            },
        };

        let ctx = JobContext::new(worker_id, crawl_timeout, cancel.clone());

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = crawler.crawl_domain(&ctx, &domain) => outcome,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = outcomes.send(outcome) => {
                if sent.is_err() {
                    // nobody consumes outcomes anymore
                    break;
                }
            }
        }
    }

    debug!(worker_id, "worker stopped");
}
