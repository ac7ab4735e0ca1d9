//! Rate limiting, retry policy and status classification shared by every
//! remote client.

use std::sync::Arc;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};

use crate::error::{EtlError, EtlResult};

/// Maximum number of retries after the first attempt.
pub const MAX_RETRIES: usize = 3;

/// Per-source rate limiter.
///
/// A single-permit [`Semaphore`] serializes callers and each holder sleeps
/// the configured interval before releasing it, so consecutive requests are
/// at least one interval apart.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    interval: Duration,
}

impl RateLimiter {
    /// At most `requests_per_second` requests per second (minimum 1).
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::with_interval(Duration::from_millis(
            1000 / u64::from(requests_per_second.max(1)),
        ))
    }

    /// A fixed delay between consecutive requests.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a request slot is available, then holds the slot for
    /// the configured interval.
    pub async fn acquire(&self) {
        // The semaphore is never closed.
        let _permit = self.semaphore.acquire().await.ok();
        if !self.interval.is_zero() {
            sleep(self.interval).await;
        }
    }
}

/// Exponential backoff starting at one second, [`MAX_RETRIES`] retries.
pub fn retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_times(MAX_RETRIES)
}

/// Turn a non-success response into an error: 429 becomes
/// [`EtlError::RateLimited`], anything else [`EtlError::Http`].
pub fn check_status(source_name: &str, response: Response) -> EtlResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(EtlError::RateLimited {
            source_name: source_name.to_string(),
        });
    }
    Err(EtlError::Http {
        source_name: source_name.to_string(),
        status: status.as_u16(),
        message: format!("{} returned {}", response.url(), status),
    })
}

/// Rate-limited, retried GET of a JSON document.
///
/// A 404 yields `None`. Transient failures are retried per
/// [`retry_policy`]; a body that does not deserialize into `T` is a
/// [`EtlError::Parse`].
pub async fn get_json<T: DeserializeOwned>(
    http: &Client,
    limiter: &RateLimiter,
    source_name: &str,
    url: &str,
    query: &[(&str, &str)],
    authorization: Option<&str>,
) -> EtlResult<Option<T>> {
    let attempt = || async move {
        limiter.acquire().await;

        let mut request = http.get(url).query(query);
        if let Some(auth) = authorization {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok::<_, EtlError>(None);
        }
        let response = check_status(source_name, response)?;
        let body = response.json::<T>().await.map_err(|e| EtlError::Parse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(body))
    };

    attempt
        .retry(retry_policy())
        .when(EtlError::is_transient)
        .notify(|err, delay| {
            log::warn!("{} request to {} failed ({}), retrying in {:?}", source_name, url, err, delay);
        })
        .await
}
