//! Fallback orchestrator
//!
//! Generic primary/fallback strategy selection for the collection
//! phases. The original environment offers two retrieval paths for
//! most object kinds (a bulk view and a slower per-folder traversal);
//! the orchestrator runs the bulk path first and switches to the
//! traversal when the bulk path fails recoverably or returns an
//! implausibly empty result. The fallback runs at most once and its
//! outcome, empty or not, is final.

use std::future::Future;

use tracing::debug;
use vsaudit_errors::{AuditError, AuditPhase, Error};
use vsaudit_events::{AppEvent, EventEmitter, EventSender, FallbackEvent};
use vsaudit_types::CollectionStrategy;

/// Result of one orchestrated collection phase
#[derive(Debug, Clone)]
pub struct CollectionOutcome<T> {
    pub items: Vec<T>,
    /// Which strategy supplied the data
    pub strategy: CollectionStrategy,
    /// `true` when the primary strategy did not supply the data
    pub degraded: bool,
}

/// Run a collection phase with primary/fallback strategy selection.
///
/// `expect_nonempty` is the caller's plausibility hint: when set, an
/// empty primary result on a non-empty inventory engages the fallback.
///
/// # Errors
///
/// A fatal primary error propagates immediately, skipping the
/// fallback. When both strategies fail recoverably the phase reports
/// [`AuditError::StrategiesExhausted`].
pub async fn collect_with_fallback<T, E, Fp, Ff>(
    phase: AuditPhase,
    expect_nonempty: bool,
    primary: Fp,
    fallback: Ff,
    tx: &EventSender,
) -> Result<CollectionOutcome<T>, Error>
where
    E: Into<Error>,
    Fp: Future<Output = Result<Vec<T>, E>>,
    Ff: Future<Output = Result<Vec<T>, E>>,
{
    let reason = match primary.await {
        Ok(items) if items.is_empty() && expect_nonempty => {
            "primary returned no results on a non-empty inventory".to_string()
        }
        Ok(items) => {
            return Ok(CollectionOutcome {
                items,
                strategy: CollectionStrategy::Primary,
                degraded: false,
            });
        }
        Err(e) => {
            let err: Error = e.into();
            if err.is_fatal() {
                // A dead session cannot be traversed either
                return Err(err);
            }
            err.to_string()
        }
    };

    debug!(phase = %phase, %reason, "engaging fallback strategy");
    tx.emit(AppEvent::Fallback(FallbackEvent::Engaged {
        phase: phase.to_string(),
        reason,
    }));

    match fallback.await {
        Ok(items) => {
            // Even an empty fallback result is final
            tx.emit(AppEvent::Fallback(FallbackEvent::Completed {
                phase: phase.to_string(),
                items: items.len(),
            }));
            Ok(CollectionOutcome {
                items,
                strategy: CollectionStrategy::Fallback,
                degraded: true,
            })
        }
        Err(e) => {
            let err: Error = e.into();
            if err.is_fatal() {
                return Err(err);
            }
            Err(AuditError::StrategiesExhausted {
                phase,
                message: err.to_string(),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vsaudit_errors::{BrowseError, InventoryError};

    fn listing_failed() -> InventoryError {
        InventoryError::ListingFailed {
            message: "view manager unavailable".into(),
        }
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let (tx, _rx) = vsaudit_events::channel();
        let fallback_runs = AtomicUsize::new(0);
        let outcome = collect_with_fallback(
            AuditPhase::VmListing,
            true,
            async { Ok::<_, InventoryError>(vec![1, 2, 3]) },
            async {
                fallback_runs.fetch_add(1, Ordering::SeqCst);
                Ok(vec![9])
            },
            &tx,
        )
        .await
        .expect("primary");
        assert_eq!(outcome.items, vec![1, 2, 3]);
        assert_eq!(outcome.strategy, CollectionStrategy::Primary);
        assert!(!outcome.degraded);
        assert_eq!(fallback_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_primary_engages_fallback_exactly_once() {
        let (tx, mut rx) = vsaudit_events::channel();
        let fallback_runs = AtomicUsize::new(0);
        let outcome = collect_with_fallback(
            AuditPhase::VmListing,
            true,
            async { Ok::<_, InventoryError>(Vec::<u32>::new()) },
            async {
                fallback_runs.fetch_add(1, Ordering::SeqCst);
                Ok(vec![7])
            },
            &tx,
        )
        .await
        .expect("fallback");
        assert_eq!(outcome.items, vec![7]);
        assert_eq!(outcome.strategy, CollectionStrategy::Fallback);
        assert!(outcome.degraded);
        assert_eq!(fallback_runs.load(Ordering::SeqCst), 1);

        let event = rx.try_recv().expect("engaged event");
        assert!(matches!(
            event,
            AppEvent::Fallback(FallbackEvent::Engaged { .. })
        ));
    }

    #[tokio::test]
    async fn empty_primary_accepted_without_plausibility_hint() {
        let (tx, _rx) = vsaudit_events::channel();
        let outcome = collect_with_fallback(
            AuditPhase::DatastoreListing,
            false,
            async { Ok::<_, BrowseError>(Vec::<u32>::new()) },
            async { Ok(vec![1]) },
            &tx,
        )
        .await
        .expect("primary");
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.strategy, CollectionStrategy::Primary);
    }

    #[tokio::test]
    async fn empty_fallback_result_is_final() {
        let (tx, _rx) = vsaudit_events::channel();
        let outcome = collect_with_fallback(
            AuditPhase::VmListing,
            true,
            async { Err::<Vec<u32>, _>(listing_failed()) },
            async { Ok(Vec::new()) },
            &tx,
        )
        .await
        .expect("fallback");
        assert!(outcome.items.is_empty());
        assert!(outcome.degraded);
    }

    #[tokio::test]
    async fn fatal_primary_error_skips_fallback() {
        let (tx, _rx) = vsaudit_events::channel();
        let fallback_runs = AtomicUsize::new(0);
        let err = collect_with_fallback(
            AuditPhase::VmListing,
            true,
            async {
                Err::<Vec<u32>, _>(InventoryError::ConnectionLost {
                    message: "session expired".into(),
                })
            },
            async {
                fallback_runs.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1])
            },
            &tx,
        )
        .await
        .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(fallback_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn both_strategies_failing_reports_exhaustion() {
        let (tx, _rx) = vsaudit_events::channel();
        let err = collect_with_fallback(
            AuditPhase::DatastoreListing,
            true,
            async { Err::<Vec<u32>, _>(listing_failed()) },
            async { Err(listing_failed()) },
            &tx,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Audit(AuditError::StrategiesExhausted { .. })
        ));
    }
}
