// http.rs — HTTP layer: status mapping, retry, backoff.
//
// This is the ONLY place status codes are interpreted. client.rs never
// looks at a status code; it sees a decoded JSON value or a VerifyError.
//
// Transient failures (timeout, connect, 5xx, 429) retry with jittered
// exponential backoff up to the configured cap. Each attempt gets its own
// timeout budget from the reqwest client.

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::VerifyConfig;
use crate::error::{VerifyError, VerifyResult};

const BACKOFF_BASE: Duration = Duration::from_millis(100);
const BACKOFF_CAP: Duration = Duration::from_secs(2);
const RETRY_AFTER_CAP: Duration = Duration::from_secs(5);

/// HTTP backend holding the reqwest client and authority config.
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    client: reqwest::Client,
    config: VerifyConfig,
}

impl HttpBackend {
    pub(crate) fn new(config: VerifyConfig) -> VerifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VerifyError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> VerifyResult<serde_json::Value> {
        let body = serde_json::to_value(body).map_err(|e| VerifyError::Config {
            message: format!("unserializable request body: {e}"),
        })?;
        self.request(Method::POST, path, Some(&body)).await
    }

    pub(crate) async fn get_json(&self, path: &str) -> VerifyResult<serde_json::Value> {
        self.request(Method::GET, path, None).await
    }

    /// Issue a request with the retry policy applied.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> VerifyResult<serde_json::Value> {
        let mut retries = 0;
        loop {
            match self.request_once(method.clone(), path, body).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < self.config.max_retries => {
                    retries += 1;
                    let backoff = backoff_for(&e, retries);
                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.config.max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying verification request"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single attempt: build, send, map status.
    async fn request_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> VerifyResult<serde_json::Value> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self.client.request(method, &url);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => {
                debug!(%url, status = status.as_u16(), "authority responded");
                Ok(response.json().await?)
            }

            401 | 403 => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(VerifyError::Unauthorized { message })
            }

            404 => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(VerifyError::NotFound { message })
            }

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(VerifyError::RateLimited { retry_after })
            }

            500..=599 => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(VerifyError::Unavailable {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                })
            }

            // Any other definitive status is a contract violation.
            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(VerifyError::InvalidResponse {
                    message: format!("unexpected HTTP {}: {}", status.as_u16(), message),
                })
            }
        }
    }
}

/// Backoff for the nth retry: the server's Retry-After when rate limited
/// (capped), otherwise jittered exponential from a 100ms base.
fn backoff_for(error: &VerifyError, retries: u32) -> Duration {
    use rand::Rng;

    if let VerifyError::RateLimited {
        retry_after: Some(retry_after),
    } = error
    {
        return (*retry_after).min(RETRY_AFTER_CAP);
    }

    let base = BACKOFF_BASE
        .saturating_mul(1 << retries.min(4))
        .min(BACKOFF_CAP);
    let jittered_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64);
    Duration::from_millis(jittered_ms.max(10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_but_stays_capped() {
        let err = VerifyError::Unavailable {
            message: "HTTP 503".into(),
        };
        for retries in 1..8 {
            let backoff = backoff_for(&err, retries);
            assert!(backoff >= Duration::from_millis(10));
            assert!(backoff <= BACKOFF_CAP);
        }
    }

    #[test]
    fn rate_limit_backoff_honors_retry_after() {
        let err = VerifyError::RateLimited {
            retry_after: Some(Duration::from_secs(1)),
        };
        assert_eq!(backoff_for(&err, 1), Duration::from_secs(1));

        let excessive = VerifyError::RateLimited {
            retry_after: Some(Duration::from_secs(3600)),
        };
        assert_eq!(backoff_for(&excessive, 1), RETRY_AFTER_CAP);
    }
}
