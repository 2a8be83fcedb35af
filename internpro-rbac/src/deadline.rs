//! Optional deadline for engine operations

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{RbacError, RbacResult};

/// Run `future` to completion, failing with [`RbacError::Timeout`] if a
/// limit is configured and exceeded. The future is dropped on timeout.
pub(crate) async fn bounded<T, F>(
    limit: Option<Duration>,
    operation: &'static str,
    future: F,
) -> RbacResult<T>
where
    F: Future<Output = RbacResult<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, future).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = limit.as_millis() as u64, "RBAC operation timed out");
                Err(RbacError::Timeout { operation })
            }
        },
        None => future.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_without_limit_runs_to_completion() {
        let result = bounded(None, "check", async { Ok::<_, RbacError>(7) }).await;
        assert_eq!(tokio_test::assert_ok!(result), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_operation_times_out() {
        let result: RbacResult<()> = bounded(Some(Duration::from_millis(10)), "check", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, RbacError::Timeout { operation: "check" }));
    }
}
