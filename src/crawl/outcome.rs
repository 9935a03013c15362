// src/crawl/outcome.rs
// =============================================================================
// What a crawl attempt produces.
//
// - CrawlErrorCode: why a domain failed, with a stable wire name
// - CrawlStatus: the coarse result (completed, failed, blocked, ...)
// - CrawlOutcome: the pipeline's output, one per crawled domain
// - CrawlRecord: the flattened shape handed to the sink
//
// The status is always derived from the error code, so the two can never
// disagree.
// =============================================================================

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nodeinfo::MetadataView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlErrorCode {
    /// No error
    Unknown,
    InternalError,
    Timeout,
    DomainNotFound,
    Unreachable,
    BlockedByRobotsTxt,
    #[serde(rename = "invalid_json")]
    InvalidJson,
    InvalidNodeinfo,
    #[serde(rename = "nodeinfo_version_not_supported_by_crawler")]
    NodeinfoVersionUnsupported,
    #[serde(rename = "software_not_supported_by_crawler")]
    SoftwareUnsupportedByCrawler,
}

impl CrawlErrorCode {
    pub const ALL: [CrawlErrorCode; 10] = [
        CrawlErrorCode::Unknown,
        CrawlErrorCode::InternalError,
        CrawlErrorCode::Timeout,
        CrawlErrorCode::DomainNotFound,
        CrawlErrorCode::Unreachable,
        CrawlErrorCode::BlockedByRobotsTxt,
        CrawlErrorCode::InvalidJson,
        CrawlErrorCode::InvalidNodeinfo,
        CrawlErrorCode::NodeinfoVersionUnsupported,
        CrawlErrorCode::SoftwareUnsupportedByCrawler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlErrorCode::Unknown => "unknown",
            CrawlErrorCode::InternalError => "internal_error",
            CrawlErrorCode::Timeout => "timeout",
            CrawlErrorCode::DomainNotFound => "domain_not_found",
            CrawlErrorCode::Unreachable => "unreachable",
            CrawlErrorCode::BlockedByRobotsTxt => "blocked_by_robots_txt",
            CrawlErrorCode::InvalidJson => "invalid_json",
            CrawlErrorCode::InvalidNodeinfo => "invalid_nodeinfo",
            CrawlErrorCode::NodeinfoVersionUnsupported => "nodeinfo_version_not_supported_by_crawler",
            CrawlErrorCode::SoftwareUnsupportedByCrawler => "software_not_supported_by_crawler",
        }
    }

    /// Human readable explanation, shown next to failed crawls.
    pub fn description(&self) -> &'static str {
        match self {
            CrawlErrorCode::Unknown => "No error.",
            CrawlErrorCode::InternalError => "The crawler hit an internal error.",
            CrawlErrorCode::Timeout => "The server took too long to answer.",
            CrawlErrorCode::DomainNotFound => "The domain could not be resolved.",
            CrawlErrorCode::Unreachable => "The server could not be reached or answered with an error.",
            CrawlErrorCode::BlockedByRobotsTxt => "The server's robots.txt does not allow crawling.",
            CrawlErrorCode::InvalidJson => "The server answered with malformed JSON.",
            CrawlErrorCode::InvalidNodeinfo => "The server's nodeinfo document is invalid.",
            CrawlErrorCode::NodeinfoVersionUnsupported => {
                "The server does not offer a nodeinfo version the crawler understands."
            }
            CrawlErrorCode::SoftwareUnsupportedByCrawler => {
                "The crawler does not know how to list peers for this software."
            }
        }
    }

    pub fn status(&self) -> CrawlStatus {
        match self {
            CrawlErrorCode::Unknown => CrawlStatus::Completed,
            CrawlErrorCode::BlockedByRobotsTxt => CrawlStatus::Blocked,
            CrawlErrorCode::Timeout => CrawlStatus::Timeout,
            CrawlErrorCode::InternalError => CrawlStatus::InternalError,
            _ => CrawlStatus::Failed,
        }
    }
}

impl fmt::Display for CrawlErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Completed,
    Failed,
    Blocked,
    Timeout,
    InternalError,
}

impl CrawlStatus {
    pub const ALL: [CrawlStatus; 5] = [
        CrawlStatus::Completed,
        CrawlStatus::Failed,
        CrawlStatus::Blocked,
        CrawlStatus::Timeout,
        CrawlStatus::InternalError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlStatus::Completed => "completed",
            CrawlStatus::Failed => "failed",
            CrawlStatus::Blocked => "blocked",
            CrawlStatus::Timeout => "timeout",
            CrawlStatus::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured per-domain failure: code plus message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlFailure {
    pub code: CrawlErrorCode,
    pub message: String,
}

impl CrawlFailure {
    pub fn new(code: CrawlErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Keeps the message but reports the failure as a timeout.
    pub fn into_timeout(self) -> Self {
        Self {
            code: CrawlErrorCode::Timeout,
            message: self.message,
        }
    }
}

impl fmt::Display for CrawlFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// The result of crawling one domain. Produced exactly once per crawl job.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub domain: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub addresses: Vec<IpAddr>,
    /// The versioned nodeinfo document as served, if it was fetched
    pub raw_nodeinfo: Option<Vec<u8>>,
    pub metadata: Option<MetadataView>,
    pub peers: Vec<String>,
    pub status: CrawlStatus,
    pub error: Option<CrawlFailure>,
}

impl CrawlOutcome {
    /// A fresh outcome with the start time set. finish() must be called once
    /// the pipeline is done.
    pub fn begin(domain: &str) -> Self {
        let now = Utc::now();
        Self {
            domain: domain.to_string(),
            started_at: now,
            finished_at: now,
            addresses: Vec::new(),
            raw_nodeinfo: None,
            metadata: None,
            peers: Vec::new(),
            status: CrawlStatus::Completed,
            error: None,
        }
    }

    /// Stamps the end time and settles status and error.
    pub fn finish(&mut self, result: Result<(), CrawlFailure>) {
        self.finished_at = Utc::now();
        match result {
            Ok(()) => {
                self.status = CrawlStatus::Completed;
                self.error = None;
            }
            Err(failure) => {
                self.status = failure.code.status();
                // peers are only meaningful for a completed crawl
                self.peers.clear();
                self.error = Some(failure);
            }
        }
    }

    pub fn error_code(&self) -> CrawlErrorCode {
        self.error
            .as_ref()
            .map(|e| e.code)
            .unwrap_or(CrawlErrorCode::Unknown)
    }

    pub fn is_completed(&self) -> bool {
        self.status == CrawlStatus::Completed
    }
}

/// The record shape consumed by sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub domain: String,
    pub addresses: Vec<IpAddr>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: CrawlStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CrawlFailure>,
    pub peers: Vec<String>,
    pub number_of_peers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_nodeinfo: Option<serde_json::Value>,
    pub software_name: Option<String>,
    pub software_version: Option<String>,
    pub open_registrations: Option<bool>,
    pub total_users: Option<i64>,
    pub active_halfyear: Option<i64>,
    pub active_month: Option<i64>,
    pub local_posts: Option<i64>,
    pub local_comments: Option<i64>,
}

impl From<CrawlOutcome> for CrawlRecord {
    fn from(outcome: CrawlOutcome) -> Self {
        let number_of_peers = outcome.is_completed().then(|| outcome.peers.len());

        // non-JSON bodies are dropped here, the error already says why
        let raw_nodeinfo = outcome
            .raw_nodeinfo
            .as_deref()
            .and_then(|raw| serde_json::from_slice(raw).ok());

        let metadata = outcome.metadata;

        CrawlRecord {
            domain: outcome.domain,
            addresses: outcome.addresses,
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            status: outcome.status,
            error: outcome.error,
            peers: outcome.peers,
            number_of_peers,
            raw_nodeinfo,
            software_name: metadata.as_ref().map(|m| m.software_name.clone()),
            software_version: metadata.as_ref().and_then(|m| m.software_version.clone()),
            open_registrations: metadata.as_ref().map(|m| m.open_registrations),
            total_users: metadata.as_ref().and_then(|m| m.total_users),
            active_halfyear: metadata.as_ref().and_then(|m| m.active_halfyear),
            active_month: metadata.as_ref().and_then(|m| m.active_month),
            local_posts: metadata.as_ref().and_then(|m| m.local_posts),
            local_comments: metadata.as_ref().and_then(|m| m.local_comments),
        }
    }
}
