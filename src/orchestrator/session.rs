// src/orchestrator/session.rs
// =============================================================================
// The coordination loop of a crawl session.
//
// How it works:
// 1. Spawn the worker pool on a bounded frontier and outcome queue
// 2. Queue the seeds (one background task, so a long seed list never
//    stalls the loop)
// 3. For every outcome: hand the record to the sink, then queue each peer
//    we have not seen yet and that is not blocked
// 4. On cancellation or an exhausted budget: cancel everything, wait for
//    pending peer tasks and workers, return
//
// The visited set lives on this loop's stack and nothing else touches it.
// Peers are checked and marked here before a task is spawned to enqueue
// them, which is what keeps a domain from being queued twice.
// =============================================================================

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, CrawlConfig};
use crate::crawl::{CrawlRecord, Crawler, DomainCrawler};
use crate::net::FetchError;

use super::frontier::{EnqueueError, Frontier};
use super::sink::Sink;
use super::workers::WorkerPool;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid crawl configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] FetchError),
    #[error("sink rejected the record for {domain}")]
    Sink {
        domain: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub struct Orchestrator {
    config: CrawlConfig,
    crawler: Arc<dyn DomainCrawler>,
}

impl Orchestrator {
    pub fn new(config: CrawlConfig, crawler: Arc<dyn DomainCrawler>) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self { config, crawler })
    }

    /// Runs one session until `cancel` fires, the session budget runs out,
    /// or the sink fails. Only the last one is an error.
    pub async fn run(&self, sink: &dyn Sink, cancel: CancellationToken) -> Result<(), SessionError> {
        let config = &self.config;
        let session = cancel.child_token();

        // The budget cancels the same token as an external stop, so workers,
        // a slow sink and pending peer dispatches all see it at once
        let budget_timer = config.session_budget.map(|budget| {
            let session = session.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = session.cancelled() => {}
                    _ = tokio::time::sleep(budget) => {
                        info!(budget_secs = budget.as_secs_f64(), "session budget exhausted");
                        session.cancel();
                    }
                }
            })
        });

        let frontier = Frontier::new(config.frontier_capacity);
        let (outcome_tx, mut outcomes) = mpsc::channel(config.outcome_capacity);
        let pool = WorkerPool::spawn(
            config.workers,
            frontier.clone(),
            self.crawler.clone(),
            outcome_tx,
            config.crawl_timeout,
            session.clone(),
        );

        info!(
            workers = pool.size(),
            seeds = config.seeds.len(),
            budget_secs = config.session_budget.map(|b| b.as_secs()),
            "crawl session started"
        );

        let mut visited: HashSet<String> = HashSet::new();
        let mut dispatches = JoinSet::new();
        let mut forwarded: usize = 0;

        let seeds: Vec<String> = config
            .seeds
            .iter()
            .filter(|seed| admit(&mut visited, config, seed))
            .cloned()
            .collect();
        {
            let frontier = frontier.clone();
            let session = session.clone();
            dispatches.spawn(async move {
                for seed in seeds {
                    if let Err(e) = frontier.enqueue(seed.clone(), &session, None).await {
                        debug!(domain = %seed, error = %e, "seed not queued");
                        break;
                    }
                }
            });
        }

        let result = loop {
            // Reap finished peer tasks so the JoinSet does not grow forever
            while let Some(joined) = dispatches.try_join_next() {
                if let Err(e) = joined {
                    warn!(error = %e, "peer dispatch task failed");
                }
            }

            let outcome = tokio::select! {
                biased;
                _ = session.cancelled() => break Ok(()),
                outcome = outcomes.recv() => match outcome {
                    Some(outcome) => outcome,
                    None => break Ok(()),
                },
            };

            let domain = outcome.domain.clone();
            let peers = outcome.peers.clone();
            visited.insert(domain.clone());

            // The sink may take its time (backpressure), but it must not
            // outlive the session
            let submitted = tokio::select! {
                biased;
                _ = session.cancelled() => break Ok(()),
                submitted = sink.submit(CrawlRecord::from(outcome)) => submitted,
            };
            if let Err(e) = submitted {
                error!(domain = %domain, error = %e, "sink failed, stopping session");
                break Err(SessionError::Sink {
                    domain,
                    source: e.into(),
                });
            }
            forwarded += 1;

            // Check and mark peers here, on the only task that owns `visited`;
            // the spawned task only waits for frontier space
            for peer in peers {
                if !admit(&mut visited, config, &peer) {
                    continue;
                }
                dispatches.spawn(dispatch_peer(
                    frontier.clone(),
                    peer,
                    session.clone(),
                    config.peer_enqueue_timeout,
                ));
            }
        };

        // Whatever ended the loop, everything else stops now too
        session.cancel();
        if let Some(timer) = budget_timer {
            let _ = timer.await;
        }
        while let Some(joined) = dispatches.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "peer dispatch task failed");
            }
        }
        pool.join().await;

        info!(forwarded, visited = visited.len(), "crawl session finished");
        result
    }
}

// Marks a domain as visited if it may be crawled. False for blocked and
// already visited domains.
fn admit(visited: &mut HashSet<String>, config: &CrawlConfig, domain: &str) -> bool {
    if visited.contains(domain) {
        return false;
    }
    if config.blocklist.is_blocked(domain) {
        debug!(domain, "skipping blocked domain");
        return false;
    }
    visited.insert(domain.to_string());
    true
}

async fn dispatch_peer(
    frontier: Frontier,
    domain: String,
    cancel: CancellationToken,
    timeout: Option<Duration>,
) {
    match frontier.enqueue(domain.clone(), &cancel, timeout).await {
        Ok(()) => debug!(domain = %domain, "peer queued"),
        Err(EnqueueError::Cancelled) => {}
        Err(e) => warn!(domain = %domain, error = %e, "dropping peer"),
    }
}

/// Runs a session with the real crawler built from `config`.
pub async fn run_crawl(
    config: CrawlConfig,
    sink: &dyn Sink,
    cancel: CancellationToken,
) -> Result<(), SessionError> {
    config.validate()?;
    let crawler = Crawler::new(&config.user_agent, config.crawl_timeout, config.retry)?;
    Orchestrator::new(config, Arc::new(crawler))?
        .run(sink, cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::Blocklist;
    use crate::crawl::{CrawlOutcome, JobContext};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct NoPeers;

    #[async_trait]
    impl DomainCrawler for NoPeers {
        async fn crawl_domain(&self, _ctx: &JobContext, domain: &str) -> CrawlOutcome {
            let mut outcome = CrawlOutcome::begin(domain);
            outcome.finish(Ok(()));
            outcome
        }
    }

    #[derive(Default)]
    struct Collect {
        domains: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Sink for Collect {
        async fn submit(&self, record: CrawlRecord) -> anyhow::Result<()> {
            self.domains.lock().unwrap().push(record.domain);
            Ok(())
        }
    }

    #[test]
    fn test_admit_checks_visited_then_blocklist() {
        let config = CrawlConfig {
            blocklist: Blocklist::new(["ngrok.io"]),
            ..Default::default()
        };
        let mut visited = HashSet::new();

        assert!(admit(&mut visited, &config, "a.example"));
        assert!(!admit(&mut visited, &config, "a.example"));
        assert!(!admit(&mut visited, &config, "x.ngrok.io"));
        // no normalization: a different spelling is a different domain
        assert!(admit(&mut visited, &config, "A.example"));
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CrawlConfig {
            workers: 0,
            ..Default::default()
        };
        let result = Orchestrator::new(config, Arc::new(NoPeers));
        assert!(matches!(
            result,
            Err(SessionError::Config(ConfigError::NoWorkers))
        ));
    }

    #[tokio::test]
    async fn test_external_cancel_ends_session_cleanly() {
        let config = CrawlConfig {
            seeds: vec!["a.example".to_string(), "a.example".to_string()],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(config, Arc::new(NoPeers)).unwrap();
        let sink = Collect::default();
        let cancel = CancellationToken::new();

        let stopper = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                cancel.cancel();
            })
        };

        assert!(orchestrator.run(&sink, cancel).await.is_ok());
        stopper.await.unwrap();
        assert_eq!(*sink.domains.lock().unwrap(), vec!["a.example".to_string()]);
    }
}
