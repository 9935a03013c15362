// src/net/dns.rs
// =============================================================================
// Domain name resolution.
//
// The crawler resolves every domain before any HTTP request. A domain that
// does not resolve is reported as not found and costs us no connection
// attempts (and no retries).
// =============================================================================

use std::io;
use std::net::IpAddr;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("domain lookup failed for {domain}: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: io::Error,
    },
    #[error("domain {domain} resolved to no addresses")]
    NoAddresses { domain: String },
}

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Resolver backed by the operating system (getaddrinfo via tokio).
#[derive(Debug, Clone, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError> {
        // The port is irrelevant, lookup_host just wants a socket address
        let resolved = tokio::net::lookup_host((domain, 443))
            .await
            .map_err(|source| ResolveError::Lookup {
                domain: domain.to_string(),
                source,
            })?;

        let mut addresses: Vec<IpAddr> = Vec::new();
        for socket in resolved {
            if !addresses.contains(&socket.ip()) {
                addresses.push(socket.ip());
            }
        }

        if addresses.is_empty() {
            return Err(ResolveError::NoAddresses {
                domain: domain.to_string(),
            });
        }

        Ok(addresses)
    }
}
