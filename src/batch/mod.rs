//! Bounded-concurrency batch driver for admin bulk operations.
//!
//! At most `width` workers run at once; one item's failure never aborts the
//! rest, and the report always satisfies `succeeded + failed == total`.
//! There is no cancellation: callers that stop consuming simply issue no
//! further work, but in-flight requests run to completion.

use futures_util::stream::{self, StreamExt};
use serde::Serialize;

/// Concurrent width for bulk re-analysis (each item costs two LLM calls).
pub const REANALYZE_BATCH_WIDTH: usize = 5;

/// Concurrent width for bulk deletion.
pub const DELETE_BATCH_WIDTH: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct BatchItemError {
    pub id: String,
    pub error: String,
}

/// Outcome tally for one batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<BatchItemError>,
}

/// Run `worker` over `items` with at most `width` in flight.
///
/// Workers return `Ok(())` or a [`BatchItemError`] naming the failed item.
pub async fn run_bounded<T, F, Fut>(items: Vec<T>, width: usize, worker: F) -> BatchReport
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = Result<(), BatchItemError>>,
{
    let total = items.len();
    let results: Vec<Result<(), BatchItemError>> = stream::iter(items.into_iter().map(worker))
        .buffer_unordered(width.max(1))
        .collect()
        .await;

    let mut report = BatchReport {
        total,
        ..Default::default()
    };
    for result in results {
        match result {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                report.failed += 1;
                report.errors.push(e);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn counts_always_sum_to_total() {
        let items: Vec<u32> = (0..23).collect();
        let report = run_bounded(items, 5, |i| async move {
            if i % 3 == 0 {
                Err(BatchItemError {
                    id: i.to_string(),
                    error: "simulated failure".to_string(),
                })
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(report.total, 23);
        assert_eq!(report.succeeded + report.failed, report.total);
        assert_eq!(report.failed, 8); // 0,3,6,9,12,15,18,21
        assert_eq!(report.errors.len(), report.failed);
    }

    #[tokio::test]
    async fn completes_when_every_item_fails() {
        let report = run_bounded(vec!["a", "b", "c"], 2, |id| async move {
            Err(BatchItemError {
                id: id.to_string(),
                error: "down".to_string(),
            })
        })
        .await;

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 3);
    }

    #[tokio::test]
    async fn empty_batch_reports_zero() {
        let report = run_bounded(Vec::<u32>::new(), 5, |_| async { Ok(()) }).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_width() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<u32> = (0..40).collect();
        let report = run_bounded(items, 4, |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(report.succeeded, 40);
        assert!(peak.load(Ordering::SeqCst) <= 4, "width exceeded");
    }

    #[tokio::test]
    async fn zero_width_is_clamped_to_one() {
        let report = run_bounded(vec![1, 2], 0, |_| async { Ok(()) }).await;
        assert_eq!(report.succeeded, 2);
    }
}
