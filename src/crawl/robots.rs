// src/crawl/robots.rs
// =============================================================================
// robots.txt compliance.
//
// Before touching a server we read its robots.txt and check the two paths
// we need: the nodeinfo discovery path and the peer-listing path.
//
// Policy:
// - a single attempt, never retried
// - a missing, non-2xx or unreadable robots.txt means "allowed"
// - only an explicit rule for our user agent (or "*") blocks us
// - transport errors are returned so the caller can decide (https -> http
//   fallback on certificate errors, fail-open otherwise)
// =============================================================================

use robotstxt::DefaultMatcher;
use tracing::debug;

use crate::net::{FetchError, HttpClient, HttpRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotsVerdict {
    Allowed,
    Disallowed,
}

/// Fetches `<base>/robots.txt` once and evaluates it for `paths`.
pub async fn check_robots(
    client: &dyn HttpClient,
    base_url: &str,
    user_agent: &str,
    paths: &[&str],
) -> Result<RobotsVerdict, FetchError> {
    let url = format!("{}/robots.txt", base_url);
    let response = client.get(&HttpRequest::get(&url)).await?;

    if !response.is_success() {
        debug!(url = %url, status = response.status, "no usable robots.txt, assuming allowed");
        return Ok(RobotsVerdict::Allowed);
    }

    let body = String::from_utf8_lossy(&response.body);
    Ok(evaluate(&body, user_agent, base_url, paths))
}

/// Evaluates a robots.txt body for every path; one disallowed path blocks all.
pub fn evaluate(body: &str, user_agent: &str, base_url: &str, paths: &[&str]) -> RobotsVerdict {
    let agent = product_token(user_agent);
    // some servers save robots.txt with a BOM, which would hide the first group
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);

    let allowed = paths.iter().all(|path| {
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(body, agent, &format!("{}{}", base_url, path))
    });

    if allowed {
        RobotsVerdict::Allowed
    } else {
        RobotsVerdict::Disallowed
    }
}

// robots.txt groups name the product ("fedicrawl"), not the full
// "fedicrawl/0.1.0 (+https://...)" header
fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .filter(|token| !token.is_empty())
        .unwrap_or(user_agent)
}
