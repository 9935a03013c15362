// src/crawl/pipeline.rs
// =============================================================================
// The per-domain crawl pipeline.
//
// Steps, strictly in order, each failure ending the crawl:
// 1. DNS resolution                      -> domain_not_found
// 2. robots.txt over https (http on a    -> blocked_by_robots_txt
//    certificate error), fail-open on any other error
// 3. /.well-known/nodeinfo               -> unreachable / invalid_json / invalid_nodeinfo
// 4. schema version negotiation          -> nodeinfo_version_not_supported_by_crawler
// 5. versioned nodeinfo fetch + decode   -> unreachable / invalid_json / invalid_nodeinfo
// 6. peer listing for the software       -> software_not_supported_by_crawler / ...
//
// Whatever happens, the pipeline returns a finished CrawlOutcome. If the
// job deadline has passed when a step fails, the failure is reported as a
// timeout no matter what the step said.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::net::{
    get_with_retry, FetchError, HttpClient, HttpRequest, ReqwestClient, Resolver, RetryPolicy,
    SystemResolver,
};
use crate::nodeinfo::{negotiate, Nodeinfo, WellKnown};

use super::job::{Interrupted, JobContext};
use super::outcome::{CrawlErrorCode, CrawlFailure, CrawlOutcome};
use super::peers::{required_paths, PeerAdapter};
use super::robots::{check_robots, RobotsVerdict};

/// Anything that can crawl a single domain. The orchestrator only needs this.
#[async_trait]
pub trait DomainCrawler: Send + Sync {
    /// Crawls one domain. Never fails: every problem ends up on the outcome.
    async fn crawl_domain(&self, ctx: &JobContext, domain: &str) -> CrawlOutcome;
}

/// The real crawler, speaking DNS, robots.txt and nodeinfo.
#[derive(Clone)]
pub struct Crawler {
    resolver: Arc<dyn Resolver>,
    http: Arc<dyn HttpClient>,
    user_agent: String,
    retry: RetryPolicy,
}

impl Crawler {
    /// A crawler using the system resolver and a reqwest client.
    pub fn new(
        user_agent: &str,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, FetchError> {
        let http = ReqwestClient::new(user_agent, request_timeout)?;
        Ok(Self::with_transport(
            Arc::new(SystemResolver),
            Arc::new(http),
            user_agent,
            retry,
        ))
    }

    pub fn with_transport(
        resolver: Arc<dyn Resolver>,
        http: Arc<dyn HttpClient>,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            resolver,
            http,
            user_agent: user_agent.to_string(),
            retry,
        }
    }

    async fn run(&self, ctx: &JobContext, outcome: &mut CrawlOutcome) -> Result<(), CrawlFailure> {
        let domain = outcome.domain.clone();

        // Step 1: DNS. A domain that does not resolve costs no HTTP request
        outcome.addresses = ctx
            .guard(self.resolver.resolve(&domain))
            .await
            .map_err(interrupted)?
            .map_err(|e| CrawlFailure::new(CrawlErrorCode::DomainNotFound, e.to_string()))?;

        // Step 2: robots.txt decides both the scheme and whether we may go on
        let base_url = self.negotiate_scheme(ctx, &domain).await?;

        // Step 3: discovery, version negotiation and the document itself
        let nodeinfo = self.fetch_nodeinfo(ctx, &base_url, outcome).await?;
        let view = nodeinfo.view();
        let software = view.software_name.clone();
        outcome.metadata = Some(view);

        // Step 4: only software we have an adapter for can list its peers.
        // The metadata above is kept either way, so the record is still useful
        let adapter = PeerAdapter::for_software(&software).ok_or_else(|| {
            CrawlFailure::new(
                CrawlErrorCode::SoftwareUnsupportedByCrawler,
                format!("software not supported by crawler: {}", software),
            )
        })?;

        outcome.peers = ctx
            .guard(adapter.fetch_peers(self.http.as_ref(), &base_url, self.retry))
            .await
            .map_err(interrupted)??;

        Ok(())
    }

    // Picks the scheme by probing robots.txt. The probe is a single attempt:
    // a closed port should not cost us retries.
    async fn negotiate_scheme(&self, ctx: &JobContext, domain: &str) -> Result<String, CrawlFailure> {
        let https = format!("https://{}", domain);
        // A domain that cannot even form a URL is our bug, not the server's
        Url::parse(&https).map_err(|e| {
            CrawlFailure::new(
                CrawlErrorCode::InternalError,
                format!("cannot build url for {}: {}", domain, e),
            )
        })?;

        match self.robots(ctx, &https).await? {
            Ok(verdict) => return robots_verdict(verdict, https),
            Err(e) if e.is_certificate() => {
                debug!(domain, error = %e, "certificate rejected, falling back to http");
            }
            Err(e) => {
                warn!(domain, error = %e, "failed to acknowledge robots.txt, proceeding");
                return Ok(https);
            }
        }

        let http = format!("http://{}", domain);
        match self.robots(ctx, &http).await? {
            Ok(verdict) => robots_verdict(verdict, http),
            Err(e) => {
                warn!(domain, error = %e, "failed to acknowledge robots.txt, proceeding");
                Ok(http)
            }
        }
    }

    async fn robots(
        &self,
        ctx: &JobContext,
        base_url: &str,
    ) -> Result<Result<RobotsVerdict, FetchError>, CrawlFailure> {
        let paths = required_paths();
        ctx.guard(check_robots(self.http.as_ref(), base_url, &self.user_agent, &paths))
            .await
            .map_err(interrupted)
    }

    async fn fetch_nodeinfo(
        &self,
        ctx: &JobContext,
        base_url: &str,
        outcome: &mut CrawlOutcome,
    ) -> Result<Nodeinfo, CrawlFailure> {
        let well_known_url = format!("{}/.well-known/nodeinfo", base_url);
        let body = self.get_json(ctx, &well_known_url).await?;

        let well_known: WellKnown = serde_json::from_slice(&body)
            .map_err(|e| CrawlFailure::new(CrawlErrorCode::InvalidJson, e.to_string()))?;

        if well_known.links.is_empty() {
            return Err(CrawlFailure::new(
                CrawlErrorCode::InvalidNodeinfo,
                "no nodeinfo links found",
            ));
        }

        let negotiated = negotiate(&well_known).map_err(|e| {
            CrawlFailure::new(CrawlErrorCode::NodeinfoVersionUnsupported, e.to_string())
        })?;

        // hrefs are usually absolute, but resolve relative ones against the base
        let href = Url::parse(base_url)
            .and_then(|base| base.join(&negotiated.href))
            .map_err(|e| {
                CrawlFailure::new(
                    CrawlErrorCode::InvalidNodeinfo,
                    format!("invalid nodeinfo href {:?}: {}", negotiated.href, e),
                )
            })?;

        // Keep the raw bytes before decoding so a bad document can be inspected
        let body = self.get_json(ctx, href.as_str()).await?;
        outcome.raw_nodeinfo = Some(body.clone());

        negotiated.decoder.decode(&body).map_err(|e| {
            // Valid JSON in the wrong shape is a nodeinfo problem; anything
            // else means the body was not JSON at all
            let code = if e.source.is_data() {
                CrawlErrorCode::InvalidNodeinfo
            } else {
                CrawlErrorCode::InvalidJson
            };
            CrawlFailure::new(code, e.to_string())
        })
    }

    // Retried GET that only accepts a 2xx answer
    async fn get_json(&self, ctx: &JobContext, url: &str) -> Result<Vec<u8>, CrawlFailure> {
        let response = ctx
            .guard(get_with_retry(self.http.as_ref(), &HttpRequest::get_json(url), self.retry))
            .await
            .map_err(interrupted)?
            .map_err(|e| CrawlFailure::new(CrawlErrorCode::Unreachable, e.to_string()))?;

        if !response.is_success() {
            return Err(CrawlFailure::new(
                CrawlErrorCode::Unreachable,
                format!("unexpected status code {} from {}", response.status, url),
            ));
        }

        Ok(response.body)
    }
}

#[async_trait]
impl DomainCrawler for Crawler {
    async fn crawl_domain(&self, ctx: &JobContext, domain: &str) -> CrawlOutcome {
        info!(domain, worker_id = ctx.worker_id(), "crawling");

        let mut outcome = CrawlOutcome::begin(domain);
        // Past the deadline, whatever failed is reported as a timeout
        let result = self.run(ctx, &mut outcome).await.map_err(|failure| {
            if ctx.deadline_exceeded() {
                failure.into_timeout()
            } else {
                failure
            }
        });
        outcome.finish(result);

        let elapsed_ms = (outcome.finished_at - outcome.started_at).num_milliseconds();
        match &outcome.error {
            None => info!(
                domain,
                worker_id = ctx.worker_id(),
                elapsed_ms,
                peers = outcome.peers.len(),
                "crawled"
            ),
            Some(failure) => info!(
                domain,
                worker_id = ctx.worker_id(),
                elapsed_ms,
                status = %outcome.status,
                code = %failure.code,
                error = %failure.message,
                "crawled"
            ),
        }

        outcome
    }
}

fn interrupted(reason: Interrupted) -> CrawlFailure {
    CrawlFailure::new(CrawlErrorCode::Timeout, reason.to_string())
}

fn robots_verdict(verdict: RobotsVerdict, base_url: String) -> Result<String, CrawlFailure> {
    match verdict {
        RobotsVerdict::Allowed => Ok(base_url),
        RobotsVerdict::Disallowed => Err(CrawlFailure::new(
            CrawlErrorCode::BlockedByRobotsTxt,
            "robots.txt does not allow crawling",
        )),
    }
}
