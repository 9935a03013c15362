// src/lib.rs
// =============================================================================
// fedicrawl: a crawler that maps fediverse servers by following the peer
// lists they publish.
//
// Modules, leaf-first:
// - blocklist: which domains we never crawl
// - nodeinfo: discovery documents, schema version negotiation, decoding
// - net: DNS and HTTP seams plus retries
// - crawl: the per-domain pipeline
// - orchestrator: frontier, workers and the session loop
// - seeds: the list a session starts from
// - config: session settings
// =============================================================================

pub mod blocklist;
pub mod config;
pub mod crawl;
pub mod net;
pub mod nodeinfo;
pub mod orchestrator;
pub mod seeds;

pub use blocklist::Blocklist;
pub use config::{ConfigError, CrawlConfig};
pub use crawl::{CrawlOutcome, CrawlRecord, CrawlStatus, Crawler, DomainCrawler, JobContext};
pub use orchestrator::{run_crawl, ChannelSink, Orchestrator, SessionError, Sink};
