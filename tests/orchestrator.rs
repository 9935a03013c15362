// tests/orchestrator.rs
// =============================================================================
// End-to-end tests of a crawl session over a synthetic peer graph.
//
// The crawler here never touches the network: it looks up each domain's
// peers in a fixed graph and counts how often each domain was crawled.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use fedicrawl::{
    Blocklist, CrawlConfig, CrawlOutcome, CrawlRecord, CrawlStatus, DomainCrawler, JobContext,
    Orchestrator, SessionError, Sink,
};

struct GraphCrawler {
    graph: HashMap<String, Vec<String>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl GraphCrawler {
    fn new(edges: &[(&str, &[&str])]) -> Self {
        let graph = edges
            .iter()
            .map(|(domain, peers)| {
                (
                    domain.to_string(),
                    peers.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();
        Self {
            graph,
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn calls(&self) -> HashMap<String, usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DomainCrawler for GraphCrawler {
    async fn crawl_domain(&self, _ctx: &JobContext, domain: &str) -> CrawlOutcome {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_insert(0) += 1;

        // a little latency so crawls and peer dispatch interleave
        tokio::time::sleep(Duration::from_millis(5)).await;

        let mut outcome = CrawlOutcome::begin(domain);
        outcome.peers = self.graph.get(domain).cloned().unwrap_or_default();
        outcome.finish(Ok(()));
        outcome
    }
}

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<CrawlRecord>>,
}

impl RecordingSink {
    fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.domain.clone())
            .collect();
        domains.sort();
        domains
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn submit(&self, record: CrawlRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

// Applies so much backpressure that only cancellation can end a submit
struct StalledSink;

#[async_trait]
impl Sink for StalledSink {
    async fn submit(&self, _record: CrawlRecord) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl Sink for FailingSink {
    async fn submit(&self, record: CrawlRecord) -> anyhow::Result<()> {
        bail!("storage is down, cannot save {}", record.domain)
    }
}

fn seeds(domains: &[&str]) -> Vec<String> {
    domains.iter().map(|d| d.to_string()).collect()
}

#[tokio::test]
async fn test_each_seed_forwarded_once_with_small_frontier() {
    let crawler = Arc::new(GraphCrawler::new(&[]));
    let config = CrawlConfig {
        workers: 1,
        frontier_capacity: 2,
        seeds: seeds(&["a.example", "b.example", "c.example"]),
        session_budget: Some(Duration::from_secs(2)),
        ..Default::default()
    };
    let sink = RecordingSink::default();

    let orchestrator = Orchestrator::new(config, crawler.clone()).unwrap();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.run(&sink, CancellationToken::new()),
    )
    .await
    .expect("session should end soon after its budget");

    assert!(result.is_ok());
    assert_eq!(sink.domains(), vec!["a.example", "b.example", "c.example"]);
    assert!(crawler.calls().values().all(|&n| n == 1));
}

#[tokio::test]
async fn test_cyclic_graph_crawls_each_domain_at_most_once() {
    let crawler = Arc::new(GraphCrawler::new(&[
        ("a.example", &["b.example", "c.example", "a.example"]),
        ("b.example", &["a.example", "c.example", "d.example"]),
        ("c.example", &["a.example", "b.example", "tunnel.ngrok.io"]),
        ("d.example", &["a.example", "b.example", "c.example", "localhost"]),
    ]));
    let config = CrawlConfig {
        workers: 3,
        frontier_capacity: 2,
        outcome_capacity: 2,
        seeds: seeds(&["a.example", "b.example"]),
        blocklist: Blocklist::new(["ngrok.io", "localhost"]),
        session_budget: Some(Duration::from_secs(1)),
        ..Default::default()
    };
    let sink = RecordingSink::default();

    let orchestrator = Orchestrator::new(config, crawler.clone()).unwrap();
    orchestrator
        .run(&sink, CancellationToken::new())
        .await
        .unwrap();

    let calls = crawler.calls();
    assert!(calls.values().all(|&n| n == 1), "duplicate crawls: {:?}", calls);
    assert!(!calls.contains_key("tunnel.ngrok.io"));
    assert!(!calls.contains_key("localhost"));

    assert_eq!(
        sink.domains(),
        vec!["a.example", "b.example", "c.example", "d.example"]
    );
    let records = sink.records.lock().unwrap();
    assert!(records.iter().all(|r| r.status == CrawlStatus::Completed));
}

#[tokio::test]
async fn test_blocked_seeds_are_never_crawled() {
    let crawler = Arc::new(GraphCrawler::new(&[]));
    let config = CrawlConfig {
        seeds: seeds(&["a.example", "hidden.onion"]),
        blocklist: Blocklist::new(["onion"]),
        session_budget: Some(Duration::from_millis(500)),
        ..Default::default()
    };
    let sink = RecordingSink::default();

    Orchestrator::new(config, crawler.clone())
        .unwrap()
        .run(&sink, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink.domains(), vec!["a.example"]);
    assert!(!crawler.calls().contains_key("hidden.onion"));
}

#[tokio::test]
async fn test_sink_failure_ends_session_with_error() {
    let crawler = Arc::new(GraphCrawler::new(&[("a.example", &["b.example"])]));
    let config = CrawlConfig {
        seeds: seeds(&["a.example"]),
        session_budget: Some(Duration::from_secs(60)),
        ..Default::default()
    };

    let orchestrator = Orchestrator::new(config, crawler.clone()).unwrap();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.run(&FailingSink, CancellationToken::new()),
    )
    .await
    .expect("a sink failure should stop the session right away");

    match result {
        Err(SessionError::Sink { domain, source }) => {
            assert_eq!(domain, "a.example");
            assert!(source.to_string().contains("storage is down"));
        }
        other => panic!("expected a sink error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_budget_interrupts_a_stalled_sink() {
    let crawler = Arc::new(GraphCrawler::new(&[("a.example", &["b.example"])]));
    let config = CrawlConfig {
        seeds: seeds(&["a.example"]),
        session_budget: Some(Duration::from_millis(300)),
        ..Default::default()
    };

    let orchestrator = Orchestrator::new(config, crawler.clone()).unwrap();
    let started = std::time::Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.run(&StalledSink, CancellationToken::new()),
    )
    .await
    .expect("the budget should end the session even while the sink blocks");

    assert!(result.is_ok());
    assert!(started.elapsed() < Duration::from_secs(2));
    // the stalled record never let the peer through
    assert!(!crawler.calls().contains_key("b.example"));
}
