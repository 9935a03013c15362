// src/net/mod.rs
// =============================================================================
// This module holds everything that talks to the network.
//
// Submodules:
// - dns: resolving a domain to addresses
// - http: a small GET-only client trait and its reqwest implementation
// - retry: the bounded retry policy with exponential backoff
//
// DNS and HTTP sit behind traits so the crawl pipeline can be driven by
// in-memory fakes in tests.
// =============================================================================

mod dns;
mod http;
mod retry;

pub use dns::{ResolveError, Resolver, SystemResolver};
pub use http::{FetchError, HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use retry::{get_with_retry, RetryPolicy};
