//! Time-boxing and bounded retry for external calls.

use std::time::Duration;

use futures::future::BoxFuture;
use tracing::warn;

use crate::error::{RagError, Result};

/// Run an external call with a per-attempt timeout and up to `attempts`
/// extra tries. A timeout is converted into the caller-supplied error so it
/// surfaces under the same taxonomy as the operation itself.
pub(crate) async fn call_bounded<'a, T>(
    attempts: u32,
    timeout: Duration,
    mut op: impl FnMut() -> BoxFuture<'a, Result<T>>,
    on_timeout: impl Fn() -> RagError,
) -> Result<T> {
    let mut last_err = None;
    for attempt in 0..=attempts {
        match tokio::time::timeout(timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                if attempt < attempts {
                    warn!(attempt, error = %e, "external call failed, retrying");
                }
                last_err = Some(e);
            }
            Err(_) => {
                if attempt < attempts {
                    warn!(attempt, ?timeout, "external call timed out, retrying");
                }
                last_err = Some(on_timeout());
            }
        }
    }
    Err(last_err.unwrap_or_else(on_timeout))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::FutureExt;

    use super::*;

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = call_bounded(
            2,
            Duration::from_secs(1),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(RagError::Embedding("transient".to_string()))
                    } else {
                        Ok(42)
                    }
                }
                .boxed()
            },
            || RagError::Embedding("timed out".to_string()),
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_error() {
        let result: Result<()> = call_bounded(
            1,
            Duration::from_secs(1),
            || async { Err(RagError::Search("down".to_string())) }.boxed(),
            || RagError::Search("timed out".to_string()),
        )
        .await;
        assert!(matches!(result.unwrap_err(), RagError::Search(m) if m == "down"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_maps_to_operation_error() {
        let result: Result<()> = call_bounded(
            0,
            Duration::from_millis(10),
            || futures::future::pending().boxed(),
            || RagError::Store("upsert timed out".to_string()),
        )
        .await;
        assert!(matches!(result.unwrap_err(), RagError::Store(_)));
    }
}
