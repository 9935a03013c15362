// src/orchestrator/mod.rs
// =============================================================================
// This module runs a whole crawl session.
//
// Submodules:
// - frontier: bounded queue of domains waiting to be crawled
// - workers: the fixed pool of crawl workers
// - sink: where finished records are sent
// - session: the coordination loop tying them together
// =============================================================================

mod frontier;
mod session;
mod sink;
mod workers;

pub use frontier::{EnqueueError, Frontier};
pub use session::{run_crawl, Orchestrator, SessionError};
pub use sink::{ChannelSink, Sink};
pub use workers::WorkerPool;
