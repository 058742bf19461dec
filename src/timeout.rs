//! Per-call timeouts. The bridge never spawns; a configured limit races the
//! wallet call against an injected `Timer`.

use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use futures::future::{select, Either};
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

#[async_trait(?Send)]
pub trait Timer {
    async fn sleep(&self, duration: Duration);
}

/// Tokio-backed timer for native hosts
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[cfg(feature = "native")]
#[async_trait(?Send)]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Await `fut`, bounded by `limit` when both a timer and a limit are present.
pub async fn with_timeout<T, F>(
    timer: Option<&dyn Timer>,
    limit: Option<Duration>,
    operation: &'static str,
    fut: F,
) -> BridgeResult<T>
where
    F: Future<Output = BridgeResult<T>>,
{
    let (timer, limit) = match (timer, limit) {
        (Some(timer), Some(limit)) => (timer, limit),
        _ => return fut.await,
    };

    let fut = pin!(fut);
    let sleep = pin!(timer.sleep(limit));
    match select(fut, sleep).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(((), _)) => Err(BridgeError::Timeout {
            operation,
            millis: limit.as_millis() as u64,
        }),
    }
}

#[cfg(all(test, feature = "native"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_without_limit() {
        let outcome = with_timeout(None, Some(Duration::from_millis(1)), "request", async { Ok(7) }).await;
        assert_eq!(outcome, Ok(7));
        let outcome = with_timeout(Some(&TokioTimer), None, "request", async { Ok(8) }).await;
        assert_eq!(outcome, Ok(8));
    }

    #[tokio::test]
    async fn fast_call_beats_timer() {
        let outcome =
            with_timeout(Some(&TokioTimer), Some(Duration::from_secs(5)), "request", async { Ok("done") }).await;
        assert_eq!(outcome, Ok("done"));
    }

    #[tokio::test]
    async fn stalled_call_times_out() {
        let outcome: BridgeResult<()> = with_timeout(
            Some(&TokioTimer),
            Some(Duration::from_millis(10)),
            "connect",
            futures::future::pending(),
        )
        .await;
        assert_eq!(outcome, Err(BridgeError::Timeout { operation: "connect", millis: 10 }));
    }
}
