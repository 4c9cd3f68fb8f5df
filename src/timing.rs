use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time;

/// Returned when the bound fires before the raced operation settles.
#[derive(Error, Debug)]
#[error("operation timed out after {0:?}")]
pub struct Elapsed(pub Duration);

/// Race a future against a timer; first to settle wins.
///
/// The losing future is dropped, which cancels any in-flight request at the
/// source rather than leaving it running in the background.
pub async fn with_timeout<F>(future: F, bound: Duration) -> std::result::Result<F::Output, Elapsed>
where
    F: Future,
{
    time::timeout(bound, future)
        .await
        .map_err(|_| Elapsed(bound))
}

/// Same race, with a hook that runs exactly once on the timeout path, before
/// the failure is returned. Used for logging and cleanup at call sites.
pub async fn with_timeout_or<F, H>(
    future: F,
    bound: Duration,
    on_timeout: H,
) -> std::result::Result<F::Output, Elapsed>
where
    F: Future,
    H: FnOnce(),
{
    match time::timeout(bound, future).await {
        Ok(output) => Ok(output),
        Err(_) => {
            on_timeout();
            Err(Elapsed(bound))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn settle_after(ms: u64) -> u32 {
        time::sleep(Duration::from_millis(ms)).await;
        42
    }

    #[tokio::test(start_paused = true)]
    async fn operation_inside_bound_wins() {
        let result = with_timeout(settle_after(50), Duration::from_millis(200)).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn bound_fires_before_slow_operation() {
        let started = time::Instant::now();
        let result = with_timeout(settle_after(5_000), Duration::from_millis(100)).await;
        assert!(result.is_err());
        // The failure lands at the bound, not at the operation's settle time.
        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn hook_runs_once_and_only_on_timeout() {
        let fired = AtomicUsize::new(0);
        let result = with_timeout_or(settle_after(5_000), Duration::from_millis(100), || {
            fired.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert!(result.is_err());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let fired = AtomicUsize::new(0);
        let result = with_timeout_or(settle_after(10), Duration::from_millis(100), || {
            fired.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
