// src/net/retry.rs
// =============================================================================
// Bounded retries with exponential backoff.
//
// Every crawler request except the very first robots.txt probe goes
// through get_with_retry. A request is retried when:
// - the transport failed transiently (timeout, connection error)
// - the server answered 5xx or 429
//
// The last response is returned as-is once attempts run out, so callers
// still see the real status code.
// =============================================================================

use std::time::Duration;

use tracing::debug;

use super::http::{FetchError, HttpClient, HttpRequest, HttpResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before the retry following `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

pub async fn get_with_retry(
    client: &dyn HttpClient,
    request: &HttpRequest,
    policy: RetryPolicy,
) -> Result<HttpResponse, FetchError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let result = client.get(request).await;
        attempt += 1;

        let retry = match &result {
            Ok(response) => response.is_retryable(),
            Err(e) => e.is_retryable(),
        };

        if !retry || attempt >= attempts {
            return result;
        }

        let delay = policy.delay(attempt - 1);
        debug!(url = %request.url, attempt, ?delay, "retrying request");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Replays a fixed sequence of results, one per call
    struct Scripted {
        results: Mutex<Vec<Result<HttpResponse, FetchError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<HttpResponse, FetchError>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl HttpClient for Scripted {
        async fn get(&self, _request: &HttpRequest) -> Result<HttpResponse, FetchError> {
            *self.calls.lock().unwrap() += 1;
            self.results.lock().unwrap().pop().unwrap_or(Err(FetchError::Timeout))
        }
    }

    fn status(status: u16) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse { status, body: Vec::new() })
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_exponential_growth_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(10), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let client = Scripted::new(vec![Err(FetchError::Timeout), status(503), status(200)]);
        let response = get_with_retry(&client, &HttpRequest::get("https://a"), fast())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let client = Scripted::new(vec![status(502), status(502), status(502), status(200)]);
        let response = get_with_retry(&client, &HttpRequest::get("https://a"), fast())
            .await
            .unwrap();
        assert_eq!(response.status, 502);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_failures() {
        let client = Scripted::new(vec![status(404)]);
        let response = get_with_retry(&client, &HttpRequest::get("https://a"), fast())
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(client.calls(), 1);

        let client = Scripted::new(vec![Err(FetchError::Certificate("bad".to_string()))]);
        let result = get_with_retry(&client, &HttpRequest::get("https://a"), fast()).await;
        assert!(result.unwrap_err().is_certificate());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let client = Scripted::new(vec![Err(FetchError::Timeout), status(200)]);
        let result = get_with_retry(&client, &HttpRequest::get("https://a"), RetryPolicy::once()).await;
        assert_eq!(result.unwrap_err(), FetchError::Timeout);
        assert_eq!(client.calls(), 1);
    }
}
