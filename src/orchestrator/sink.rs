// src/orchestrator/sink.rs
// =============================================================================
// Where finished crawl records go.
//
// The orchestrator awaits every submit before handling the next outcome, so
// a slow sink slows the whole crawl down. Returning an error ends the
// session.
// =============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::crawl::CrawlRecord;

#[async_trait]
pub trait Sink: Send + Sync {
    async fn submit(&self, record: CrawlRecord) -> Result<()>;
}

/// Forwards records into a bounded channel for a consumer running
/// alongside the crawl, e.g. a database writer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<CrawlRecord>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CrawlRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Sink for ChannelSink {
    async fn submit(&self, record: CrawlRecord) -> Result<()> {
        let domain = record.domain.clone();
        self.tx
            .send(record)
            .await
            .map_err(|_| anyhow!("record consumer for {} has gone away", domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::CrawlOutcome;

    fn record(domain: &str) -> CrawlRecord {
        let mut outcome = CrawlOutcome::begin(domain);
        outcome.finish(Ok(()));
        CrawlRecord::from(outcome)
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_records() {
        let (sink, mut rx) = ChannelSink::new(4);
        sink.submit(record("a.example")).await.unwrap();
        sink.submit(record("b.example")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().domain, "a.example");
        assert_eq!(rx.recv().await.unwrap().domain, "b.example");
    }

    #[tokio::test]
    async fn test_closed_consumer_is_an_error() {
        let (sink, rx) = ChannelSink::new(1);
        drop(rx);

        let err = sink.submit(record("a.example")).await.unwrap_err();
        assert!(err.to_string().contains("a.example"));
    }
}
