//! Ordered-strategy execution for capability-backed stages.
//!
//! Instead of nesting try/catch around every external call, each stage runs
//! through [`with_local_fallback`]: the external strategy (when wired) is
//! attempted exactly once, and the deterministic local strategy closes the
//! gap. The returned tier makes the chosen strategy observable.

use std::future::Future;

use tracing::debug;

use crate::audit::FallbackTier;
use crate::errors::CapabilityError;

pub struct StrategyOutcome<T> {
    pub value: T,
    pub tier: FallbackTier,
}

/// Run the external strategy once, falling back to the local one on any
/// failure. `label` names the stage in logs.
pub async fn with_local_fallback<T, Fut, Local>(
    label: &str,
    external: Option<Fut>,
    local: Local,
) -> StrategyOutcome<T>
where
    Fut: Future<Output = Result<T, CapabilityError>>,
    Local: FnOnce() -> T,
{
    if let Some(attempt) = external {
        match attempt.await {
            Ok(value) => {
                return StrategyOutcome { value, tier: FallbackTier::External };
            }
            Err(error) => {
                debug!(stage = label, %error, "external strategy failed; using local tier");
            }
        }
    }
    StrategyOutcome { value: local(), tier: FallbackTier::Local }
}

#[cfg(test)]
mod tests {
    use crate::audit::FallbackTier;
    use crate::errors::CapabilityError;

    use super::with_local_fallback;

    #[tokio::test]
    async fn external_success_wins() {
        let outcome = with_local_fallback(
            "test",
            Some(async { Ok::<_, CapabilityError>(10) }),
            || 99,
        )
        .await;
        assert_eq!(outcome.value, 10);
        assert_eq!(outcome.tier, FallbackTier::External);
    }

    #[tokio::test]
    async fn external_failure_uses_local() {
        let outcome = with_local_fallback(
            "test",
            Some(async { Err::<i32, _>(CapabilityError::Unavailable("down".to_owned())) }),
            || 99,
        )
        .await;
        assert_eq!(outcome.value, 99);
        assert_eq!(outcome.tier, FallbackTier::Local);
    }

    #[tokio::test]
    async fn missing_external_goes_straight_to_local() {
        let outcome = with_local_fallback(
            "test",
            None::<std::future::Ready<Result<i32, CapabilityError>>>,
            || 7,
        )
        .await;
        assert_eq!(outcome.value, 7);
        assert_eq!(outcome.tier, FallbackTier::Local);
    }
}
