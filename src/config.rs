// src/config.rs
// =============================================================================
// Configuration of a crawl session.
//
// CrawlConfig is plain data: the binary fills it from the command line and
// environment, tests build it directly. validate() catches settings that
// would make a session hang or do nothing.
// =============================================================================

use std::time::Duration;

use crate::blocklist::Blocklist;
use crate::net::RetryPolicy;

/// Default user agent: crate name and version.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Number of concurrent crawl workers
    pub workers: usize,
    /// Domains the session starts from, in order
    pub seeds: Vec<String>,
    pub blocklist: Blocklist,
    /// Budget for crawling a single domain
    pub crawl_timeout: Duration,
    /// Wall-clock budget for the whole session; None runs until cancelled
    pub session_budget: Option<Duration>,
    pub user_agent: String,
    pub frontier_capacity: usize,
    pub outcome_capacity: usize,
    /// How long a discovered peer may wait for frontier space; None waits
    /// until the session ends
    pub peer_enqueue_timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            seeds: Vec::new(),
            blocklist: Blocklist::default(),
            crawl_timeout: Duration::from_secs(10),
            session_budget: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            frontier_capacity: 100,
            outcome_capacity: 100,
            peer_enqueue_timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one worker is required")]
    NoWorkers,
    #[error("{0} capacity must be at least 1")]
    ZeroCapacity(&'static str),
    #[error("crawl timeout must be greater than zero")]
    ZeroCrawlTimeout,
    #[error("user agent must not be empty")]
    EmptyUserAgent,
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.frontier_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("frontier"));
        }
        if self.outcome_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("outcome queue"));
        }
        if self.crawl_timeout.is_zero() {
            return Err(ConfigError::ZeroCrawlTimeout);
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyUserAgent);
        }
        Ok(())
    }
}
