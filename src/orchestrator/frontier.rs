// src/orchestrator/frontier.rs
// =============================================================================
// The frontier: a bounded FIFO of domains waiting for a crawl attempt.
//
// - enqueue waits for free space, the session being cancelled, or an
//   optional timeout, whichever comes first
// - dequeue waits for a domain; workers race it against cancellation
//
// The frontier does not deduplicate. The orchestrator decides what goes in.
// Its capacity, plus the outcome queue's, bounds the in-flight domains.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("session cancelled before the frontier had room")]
    Cancelled,
    #[error("frontier stayed full for {0:?}")]
    TimedOut(Duration),
    #[error("frontier closed")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct Frontier {
    tx: mpsc::Sender<String>,
    // workers share the single receiving end
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Adds a domain, waiting while the frontier is full.
    pub async fn enqueue(
        &self,
        domain: String,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<(), EnqueueError> {
        let wait_for_room = async {
            let reserved = match timeout {
                Some(limit) => tokio::time::timeout(limit, self.tx.reserve())
                    .await
                    .map_err(|_| EnqueueError::TimedOut(limit))?,
                None => self.tx.reserve().await,
            };
            reserved.map_err(|_| EnqueueError::Closed)
        };

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EnqueueError::Cancelled),
            permit = wait_for_room => permit?,
        };

        permit.send(domain);
        Ok(())
    }

    /// Takes the next domain. Only returns None if the frontier is closed,
    /// which cannot happen while a Frontier handle is alive.
    pub async fn dequeue(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }

    /// Domains currently waiting.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
