//! Retry with exponential back-off and jitter for the Steam client.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 5xx, 429). Terminal errors — not
//! found, private profile, malformed responses — are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::SteamError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** network timeouts and connection failures, HTTP 5xx, and
/// HTTP 429.
///
/// **Not retriable:** not-found, private profile, unexpected statuses, and
/// deserialization failures — retrying cannot change the outcome.
pub(crate) fn is_retriable(err: &SteamError) -> bool {
    match err {
        SteamError::Http(e) => e.is_timeout() || e.is_connect(),
        SteamError::RateLimited | SteamError::Unavailable { .. } => true,
        SteamError::Deserialize { .. }
        | SteamError::NotFound(_)
        | SteamError::ProfilePrivate
        | SteamError::UnexpectedStatus { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors.
///
/// The delay before the n-th retry is `backoff_base_ms * 2^(n-1)` with ±25 %
/// jitter, capped at 60 s. Set `max_retries` to `0` to disable retries.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SteamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SteamError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "Steam transient error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deserialize_err() -> SteamError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        SteamError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn private_profile_is_not_retriable() {
        assert!(!is_retriable(&SteamError::ProfilePrivate));
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&SteamError::NotFound("nope".to_owned())));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn rate_limited_and_unavailable_are_retriable() {
        assert!(is_retriable(&SteamError::RateLimited));
        assert!(is_retriable(&SteamError::Unavailable { status: 503 }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, SteamError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_private_profile() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(SteamError::ProfilePrivate)
            }
        })
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "ProfilePrivate must not be retried"
        );
        assert!(matches!(result, Err(SteamError::ProfilePrivate)));
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err::<u32, _>(SteamError::Unavailable { status: 503 })
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(SteamError::RateLimited)
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "1 attempt + 2 retries");
        assert!(matches!(result, Err(SteamError::RateLimited)));
    }
}
