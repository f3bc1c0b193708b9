//! Retry with exponential back-off for `YouTube` Data API calls.
//!
//! [`retry_api_call`] wraps any fallible async operation and retries on
//! transient errors (rate limiting, 5xx, network failures). Non-transient
//! errors — quota exhaustion, application-level rejections, malformed
//! responses — are returned immediately without any retry. All wrapped
//! operations are read-only GETs, so retrying is always safe.

use std::future::Future;
use std::time::Duration;

use crate::error::YouTubeError;

/// Back-off parameters applied uniformly to every outbound API call.
///
/// The schedule is deterministic (no jitter): the wait before the retry that
/// follows failed attempt `n` (0-based) is `min(max_delay, base * 2^n)`.
/// With the defaults that is 2 s, then 4 s, capped at 10 s.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first. The first attempt is unwaited.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2_000,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Delay in milliseconds before the retry that follows failed attempt
    /// `attempt` (0-based).
    #[must_use]
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let computed = self.base_delay_ms.saturating_mul(1u64 << attempt.min(62));
        computed.min(self.max_delay_ms)
    }
}

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`YouTubeError::RateLimited`] — the API asked us to back off.
/// - [`YouTubeError::ServerError`] — transient provider-side failure.
/// - Network-level failures: timeout, connection reset.
///
/// **Not retriable (hard stop):**
/// - [`YouTubeError::QuotaExceeded`] — the quota window has to reset first.
/// - [`YouTubeError::ApiError`] — application-level rejection.
/// - [`YouTubeError::Deserialize`] — malformed response.
/// - [`YouTubeError::InvalidBaseUrl`] — local configuration problem.
pub(crate) fn is_retriable(err: &YouTubeError) -> bool {
    match err {
        YouTubeError::Http(e) => e.is_timeout() || e.is_connect(),
        YouTubeError::RateLimited { .. } | YouTubeError::ServerError { .. } => true,
        YouTubeError::QuotaExceeded { .. }
        | YouTubeError::ApiError { .. }
        | YouTubeError::Deserialize { .. }
        | YouTubeError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `policy.max_attempts` total attempts on
/// transient errors. Non-retriable errors and the final transient error are
/// returned to the caller unchanged.
pub(crate) async fn retry_api_call<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, YouTubeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, YouTubeError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt + 1 >= max_attempts {
                    return Err(err);
                }
                let delay_ms = policy.backoff_delay_ms(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "transient YouTube API error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn zero_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    fn deserialize_err() -> YouTubeError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        YouTubeError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn default_backoff_schedule_doubles_until_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay_ms(0), 2_000);
        assert_eq!(policy.backoff_delay_ms(1), 4_000);
        assert_eq!(policy.backoff_delay_ms(2), 8_000);
        // 2000 * 2^3 = 16000, capped at 10 s
        assert_eq!(policy.backoff_delay_ms(3), 10_000);
        assert_eq!(policy.backoff_delay_ms(10), 10_000);
    }

    #[test]
    fn observed_waits_are_increasing_and_bounded() {
        // The waits a call failing on attempts 1 and 2 would observe.
        let policy = RetryPolicy::default();
        let waits = [policy.backoff_delay_ms(0), policy.backoff_delay_ms(1)];
        assert!(waits[0] < waits[1]);
        assert!(waits.iter().all(|w| *w <= 10_000));
    }

    #[test]
    fn rate_limited_is_retriable() {
        assert!(is_retriable(&YouTubeError::RateLimited {
            url: "http://test/search".to_owned()
        }));
    }

    #[test]
    fn server_error_is_retriable() {
        assert!(is_retriable(&YouTubeError::ServerError {
            status: 503,
            url: "http://test/videos".to_owned()
        }));
    }

    #[test]
    fn quota_exceeded_is_not_retriable() {
        assert!(!is_retriable(&YouTubeError::QuotaExceeded {
            message: "daily limit".to_owned()
        }));
    }

    #[test]
    fn api_error_is_not_retriable() {
        assert!(!is_retriable(&YouTubeError::ApiError {
            status: 400,
            message: "bad request".to_owned()
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_api_call(zero_delay(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, YouTubeError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failures_then_success_on_third_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_api_call(zero_delay(3), || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(YouTubeError::RateLimited {
                        url: "http://test/search".to_owned(),
                    })
                } else {
                    Ok::<u32, YouTubeError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99, "should succeed after retries");
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "should have been called 3 times (2 failures + 1 success)"
        );
    }

    #[tokio::test]
    async fn exhausts_attempts_and_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_api_call(zero_delay(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(YouTubeError::ServerError {
                    status: 500,
                    url: "http://test/channels".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "max_attempts=3 means exactly 3 calls"
        );
        assert!(matches!(result, Err(YouTubeError::ServerError { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_quota_exceeded() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_api_call(zero_delay(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(YouTubeError::QuotaExceeded {
                    message: "Daily Limit Exceeded".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "QuotaExceeded must not be retried"
        );
        assert!(matches!(result, Err(YouTubeError::QuotaExceeded { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_api_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_api_call(zero_delay(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(YouTubeError::ApiError {
                    status: 400,
                    message: "keyInvalid".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(YouTubeError::ApiError { .. })));
    }
}
