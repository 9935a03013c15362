// src/crawl/peers.rs
// =============================================================================
// Software-specific peer enumeration.
//
// Each server software exposes its peers differently, so peer listing is
// dispatched on the software name from nodeinfo. Only Mastodon is known
// today:
//
//   GET /api/v1/instance/peers  ->  ["a.example", "b.example", ...]
//
// An unknown software name is not a crawler failure, just a domain whose
// peers we cannot list.
// =============================================================================

use crate::net::{get_with_retry, HttpClient, HttpRequest, RetryPolicy};

use super::outcome::{CrawlErrorCode, CrawlFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerAdapter {
    Mastodon,
}

impl PeerAdapter {
    pub const ALL: [PeerAdapter; 1] = [PeerAdapter::Mastodon];

    /// Picks the adapter for a nodeinfo software name.
    pub fn for_software(software: &str) -> Option<Self> {
        match software {
            "mastodon" => Some(PeerAdapter::Mastodon),
            _ => None,
        }
    }

    pub fn peers_path(&self) -> &'static str {
        match self {
            PeerAdapter::Mastodon => "/api/v1/instance/peers",
        }
    }

    pub async fn fetch_peers(
        &self,
        client: &dyn HttpClient,
        base_url: &str,
        retry: RetryPolicy,
    ) -> Result<Vec<String>, CrawlFailure> {
        let url = format!("{}{}", base_url, self.peers_path());
        let response = get_with_retry(client, &HttpRequest::get_json(&url), retry)
            .await
            .map_err(|e| CrawlFailure::new(CrawlErrorCode::Unreachable, e.to_string()))?;

        if !response.is_success() {
            return Err(CrawlFailure::new(
                CrawlErrorCode::Unreachable,
                format!("unexpected status code {} from {}", response.status, url),
            ));
        }

        match self {
            PeerAdapter::Mastodon => serde_json::from_slice::<Vec<String>>(&response.body)
                .map_err(|e| CrawlFailure::new(CrawlErrorCode::InvalidJson, e.to_string())),
        }
    }
}

/// Every path we need robots.txt to allow, across all adapters.
pub fn required_paths() -> Vec<&'static str> {
    let mut paths = vec!["/.well-known/nodeinfo"];
    paths.extend(PeerAdapter::ALL.iter().map(PeerAdapter::peers_path));
    paths
}
