// src/crawl/mod.rs
// =============================================================================
// This module crawls a single domain.
//
// Submodules:
// - job: the per-job context (worker id, deadline, cancellation)
// - pipeline: the step-by-step crawl of one domain
// - robots: robots.txt compliance
// - peers: software-specific peer listing
// - outcome: what a crawl produces and the record handed to sinks
//
// The orchestrator only depends on the DomainCrawler trait, so tests can
// swap in a crawler that never touches the network.
// =============================================================================

mod job;
mod outcome;
mod peers;
mod pipeline;
mod robots;

pub use job::{Interrupted, JobContext};
pub use outcome::{CrawlErrorCode, CrawlFailure, CrawlOutcome, CrawlRecord, CrawlStatus};
pub use peers::{required_paths, PeerAdapter};
pub use pipeline::{Crawler, DomainCrawler};
pub use robots::{check_robots, evaluate as evaluate_robots, RobotsVerdict};
