use std::future::Future;
use std::ops::ControlFlow;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

use super::CancelScope;
use crate::core::format_asset_errors;
use crate::data::{AssetDeliveryState, DeliveryState, PollOutcome};
use crate::error::{Interrupt, TransferError};

/// Delay between delivery state checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum PollError<E> {
    #[error("polling stopped: {0}")]
    Interrupted(Interrupt),

    #[error(transparent)]
    Check(E),
}

/// Call `check` until it breaks, fails, or the scope ends.
///
/// The first call happens immediately and later calls are `interval` apart.
/// A scope that has already ended means `check` is never called.
pub async fn poll_until<T, E, F, Fut>(scope: &CancelScope, interval: Duration, mut check: F) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ControlFlow<T>, E>>,
{
    let mut round = 0u32;
    loop {
        scope.check().map_err(PollError::Interrupted)?;
        round += 1;
        match scope.run(check()).await.map_err(PollError::Interrupted)? {
            Ok(ControlFlow::Break(value)) => return Ok(value),
            Ok(ControlFlow::Continue(())) => trace!(round, ?interval, "not done yet"),
            Err(err) => return Err(PollError::Check(err)),
        }
        scope.sleep(interval).await.map_err(PollError::Interrupted)?;
    }
}

/// Wait until the remote reports `asset_id` as `COMPLETE`.
///
/// `FAILED` ends the wait with [`TransferError::DeliveryFailed`]; running out
/// of time or being cancelled gives [`TransferError::DeliveryTimedOut`]. The
/// outcome always records the last state seen, even on failure.
pub async fn wait_for_delivery<F, Fut>(
    scope: &CancelScope,
    interval: Duration,
    asset_id: &str,
    mut fetch: F,
) -> PollOutcome<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<AssetDeliveryState, TransferError>>,
{
    let last_state = Mutex::new(None::<DeliveryState>);

    let result = poll_until(scope, interval, || {
        let fetched = fetch();
        let last_state = &last_state;
        async move {
            let current = fetched.await?;
            debug!(asset_id, state = %current.state, "delivery state");
            *last_state.lock().unwrap_or_else(PoisonError::into_inner) = Some(current.state.clone());

            match current.state {
                DeliveryState::Complete => Ok(ControlFlow::Break(())),
                DeliveryState::Failed => Err(TransferError::DeliveryFailed {
                    asset_id: asset_id.to_owned(),
                    detail:   format_asset_errors(&current.errors),
                }),
                _ => Ok(ControlFlow::Continue(())),
            }
        }
    })
    .await;

    let last_state = last_state.into_inner().unwrap_or_else(PoisonError::into_inner);
    let result = result.map_err(|err| match err {
        PollError::Check(err) => err,
        PollError::Interrupted(reason) => TransferError::DeliveryTimedOut {
            asset_id: asset_id.to_owned(),
            last_state: last_state.clone(),
            reason,
        },
    });

    PollOutcome { last_state, result }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn scripted(states: &[&str]) -> Mutex<VecDeque<AssetDeliveryState>> {
        Mutex::new(
            states
                .iter()
                .map(|state| AssetDeliveryState::new(DeliveryState::parse(state)))
                .collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_counts_calls() {
        let calls = AtomicUsize::new(0);
        let value = poll_until(&CancelScope::new(), Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                Ok::<_, TransferError>(if n == 3 {
                    ControlFlow::Break(n)
                } else {
                    ControlFlow::Continue(())
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_scope_checks_nothing() {
        let scope = CancelScope::new();
        scope.cancel();
        let calls = AtomicUsize::new(0);

        let err = poll_until(&scope, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<ControlFlow<()>, TransferError>(ControlFlow::Continue(())) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, PollError::Interrupted(Interrupt::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_ends_polling() {
        let calls = AtomicUsize::new(0);
        let err = poll_until(&CancelScope::new(), Duration::from_millis(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<ControlFlow<()>, _>("remote unavailable") }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, PollError::Check("remote unavailable")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_completes() {
        let states = scripted(&["PROCESSING", "PROCESSING", "COMPLETE"]);
        let fetches = AtomicUsize::new(0);

        let outcome = wait_for_delivery(&CancelScope::new(), Duration::from_secs(2), "asset-1", || {
            fetches.fetch_add(1, Ordering::SeqCst);
            let next = states.lock().unwrap().pop_front();
            async move { Ok(next.unwrap()) }
        })
        .await;

        assert!(outcome.is_ok());
        assert_eq!(outcome.last_state, Some(DeliveryState::Complete));
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_failure_reports_errors() {
        let outcome = wait_for_delivery(&CancelScope::new(), Duration::from_secs(2), "asset-1", || async {
            Ok(AssetDeliveryState::new(DeliveryState::Failed).with_error("400", "bad"))
        })
        .await;

        assert_eq!(outcome.last_state, Some(DeliveryState::Failed));
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.to_string(), "asset asset-1 delivery failed: 400: bad");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_timeout_keeps_last_state() {
        let scope = CancelScope::new().with_timeout(Duration::from_secs(5));
        let outcome = wait_for_delivery(&scope, Duration::from_secs(2), "asset-9", || async {
            Ok(AssetDeliveryState::new(DeliveryState::parse("processing")))
        })
        .await;

        assert_eq!(outcome.last_state, Some(DeliveryState::Processing));
        match outcome.into_result() {
            Err(TransferError::DeliveryTimedOut {
                asset_id,
                last_state,
                reason,
            }) => {
                assert_eq!(asset_id, "asset-9");
                assert_eq!(last_state, Some(DeliveryState::Processing));
                assert_eq!(reason, Interrupt::DeadlineExceeded);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_fetch_keeps_last_state() {
        let scope = CancelScope::new();
        tokio::spawn({
            let scope = scope.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                scope.cancel();
            }
        });

        let calls = AtomicUsize::new(0);
        let outcome = wait_for_delivery(&scope, Duration::from_secs(2), "asset-4", || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Ok(AssetDeliveryState::new(DeliveryState::Processing))
                } else {
                    std::future::pending().await
                }
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match outcome.into_result() {
            Err(TransferError::DeliveryTimedOut { last_state, reason, .. }) => {
                assert_eq!(last_state, Some(DeliveryState::Processing));
                assert_eq!(reason, Interrupt::Cancelled);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_propagates() {
        let outcome = wait_for_delivery(&CancelScope::new(), Duration::from_secs(2), "asset-1", || async {
            Err(TransferError::remote("state endpoint returned garbage"))
        })
        .await;

        assert_eq!(outcome.last_state, None);
        assert!(matches!(outcome.into_result(), Err(TransferError::Remote(_))));
    }
}
