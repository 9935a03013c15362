// src/net/http.rs
// =============================================================================
// A minimal HTTP client seam for the crawler.
//
// The crawler only ever issues GET requests and reads small bodies
// (robots.txt, nodeinfo documents, peer lists), so the trait is tiny.
//
// Errors are classified the way we need them downstream:
// - Certificate: lets the robots probe fall back from https to http
// - Timeout / Connect: transient, worth a retry
// - everything else: reported as-is
// =============================================================================

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub accept_json: bool,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accept_json: false,
        }
    }

    pub fn get_json(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accept_json: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server-side failures that a later attempt may not hit (5xx, 429).
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || (500..600).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("certificate verification failed: {0}")]
    Certificate(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("failed to read body: {0}")]
    Body(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to build http client: {0}")]
    Build(String),
}

impl FetchError {
    pub fn is_certificate(&self) -> bool {
        matches!(self, FetchError::Certificate(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::Connect(_))
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// HttpClient backed by reqwest, sending the crawler's user agent on every request.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(user_agent: &str, request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .connect_timeout(request_timeout.min(Duration::from_secs(5)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Build(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = self.client.get(&request.url);
        if request.accept_json {
            builder = builder.header(ACCEPT, "application/json");
        }

        let response = builder.send().await.map_err(categorize_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

// reqwest does not expose certificate failures directly, so we look for
// them anywhere in the error's source chain
fn categorize_error(error: reqwest::Error) -> FetchError {
    let chain = error_chain(&error);

    if chain.to_lowercase().contains("certificate") {
        FetchError::Certificate(chain)
    } else if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Connect(chain)
    } else {
        FetchError::Request(chain)
    }
}

fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
