use crate::app::ports::{HttpClientPort, HttpGetResult, HttpRequest};
use crate::config::RetryConfig;
use crate::error::{HarvestError, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::RETRY_AFTER;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Statuses that are retried regardless of body
const RETRYABLE_STATUSES: &[u16] = &[429, 502, 503, 504];

/// Body fragments GitHub uses when a 403 is really a rate limit
const ABUSE_SIGNATURES: &[&str] = &["abuse detection", "secondary rate limit"];

pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, request: &HttpRequest) -> Result<HttpGetResult> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.text().await?;
        Ok(HttpGetResult {
            status,
            body,
            retry_after,
        })
    }
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.base_ms),
            cap: Duration::from_millis(config.cap_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait before the next attempt, excluding jitter. `attempt` counts from 1.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(wait) = retry_after {
            return wait;
        }
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}

pub fn is_retryable(status: u16, body: &str) -> bool {
    if RETRYABLE_STATUSES.contains(&status) {
        return true;
    }
    if status == 403 {
        let body = body.to_lowercase();
        return ABUSE_SIGNATURES.iter().any(|sig| body.contains(sig));
    }
    false
}

/// Positive integer seconds only; HTTP dates and garbage count as absent.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// GET with exponential backoff on transient failures.
pub struct RetryingHttp {
    inner: Arc<dyn HttpClientPort>,
    policy: RetryPolicy,
}

impl RetryingHttp {
    pub fn new(inner: Arc<dyn HttpClientPort>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub async fn get(&self, request: &HttpRequest) -> Result<HttpGetResult> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_status = 0;

        for attempt in 1..=max_attempts {
            let response = self.inner.get(request).await?;
            if response.is_success() {
                debug!(url = %request.url, attempt, "request succeeded");
                return Ok(response);
            }

            if !is_retryable(response.status, &response.body) {
                return Err(HarvestError::Fetch {
                    status: response.status,
                    body: response.body,
                });
            }

            last_status = response.status;
            if attempt == max_attempts {
                break;
            }

            let retry_after = parse_retry_after(response.retry_after.as_deref());
            let delay = self.policy.delay_for(attempt, retry_after) + self.policy.jitter();
            warn!(
                url = %request.url,
                status = response.status,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "transient failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }

        Err(HarvestError::FetchExhausted {
            attempts: max_attempts,
            last_status,
        })
    }
}
