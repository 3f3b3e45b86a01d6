use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use faultline_core::{extract, fingerprint, Failure, InvocationContext, Occurrence};
use faultline_webhook::{DeliveryClient, DeliveryError};
use parking_lot::Mutex;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

/// Per-signature view of the aggregation map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureSummary {
    pub signature: String,
    pub fingerprint: String,
    pub count: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Groups failures by signature and releases a report for each one.
///
/// Every call to [`add_error`](Self::add_error) records a new occurrence and
/// delivers it. Grouping is bookkeeping only; repeats are never suppressed.
pub struct ErrorAggregator {
    errors: Mutex<HashMap<String, Vec<Arc<Occurrence>>>>,
    delivery: DeliveryClient,
    history_limit: Option<usize>,
}

impl ErrorAggregator {
    pub fn new(delivery: DeliveryClient) -> Self {
        Self {
            errors: Mutex::new(HashMap::new()),
            delivery,
            history_limit: None,
        }
    }

    /// Keep at most `limit` occurrences per signature, dropping the oldest.
    /// `None` keeps every occurrence.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit.map(|n| n.max(1));
        self
    }

    pub fn delivery(&self) -> &DeliveryClient {
        &self.delivery
    }

    /// Record a failure and deliver its report.
    ///
    /// The failure is logged locally before delivery is attempted, so a
    /// delivery error still leaves a trace.
    pub async fn add_error(
        &self,
        failure: Failure,
        context: Option<&InvocationContext>,
        event_name: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let signature = failure.render();
        let occurrence = Arc::new(Occurrence::new(failure, extract(context, event_name)));

        let seen = self.record(&signature, Arc::clone(&occurrence));

        error!(
            fingerprint = %fingerprint(&signature),
            occurrence = %occurrence.id,
            command = occurrence.command(),
            event_name = occurrence.metadata.event_name.as_deref(),
            seen,
            signature = %signature,
            "{}",
            occurrence.failure.summary()
        );

        self.delivery.release(&signature, &occurrence).await
    }

    /// [`add_error`](Self::add_error) for supervisors: a delivery failure is
    /// logged and swallowed.
    pub async fn report(
        &self,
        failure: Failure,
        context: Option<&InvocationContext>,
        event_name: Option<&str>,
    ) {
        if let Err(e) = self.add_error(failure, context, event_name).await {
            warn!(
                error = %e,
                error_kind = e.error_kind(),
                "failed to deliver error report"
            );
        }
    }

    /// Report a task that panicked or was cancelled.
    pub async fn report_join_error(
        &self,
        err: JoinError,
        context: Option<&InvocationContext>,
        event_name: Option<&str>,
    ) {
        let failure = match err.try_into_panic() {
            Ok(payload) => Failure::from_panic(&*payload),
            Err(err) => {
                debug!(
                    task_id = %err.id(),
                    event_name = event_name.unwrap_or("-"),
                    "task cancelled"
                );
                Failure::new("cancelled", "task was cancelled")
            }
        };
        self.report(failure, context, event_name).await;
    }

    /// Append under the map lock; returns how many occurrences the signature
    /// now holds.
    fn record(&self, signature: &str, occurrence: Arc<Occurrence>) -> usize {
        let mut errors = self.errors.lock();
        let entry = errors.entry(signature.to_string()).or_default();
        entry.push(occurrence);
        if let Some(limit) = self.history_limit {
            if entry.len() > limit {
                let excess = entry.len() - limit;
                entry.drain(..excess);
            }
        }
        entry.len()
    }

    /// Occurrences recorded for `signature`, oldest first.
    pub fn occurrences(&self, signature: &str) -> Vec<Arc<Occurrence>> {
        self.errors
            .lock()
            .get(signature)
            .cloned()
            .unwrap_or_default()
    }

    pub fn signature_count(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn total_occurrences(&self) -> usize {
        self.errors.lock().values().map(Vec::len).sum()
    }

    /// One summary per signature, most recently seen first.
    pub fn summaries(&self) -> Vec<SignatureSummary> {
        let errors = self.errors.lock();
        let mut summaries: Vec<SignatureSummary> = errors
            .iter()
            .filter_map(|(signature, occurrences)| {
                let first = occurrences.first()?;
                let last = occurrences.last()?;
                Some(SignatureSummary {
                    signature: signature.clone(),
                    fingerprint: fingerprint(signature),
                    count: occurrences.len(),
                    first_seen: first.time(),
                    last_seen: last.time(),
                })
            })
            .collect();
        drop(errors);

        summaries.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use faultline_core::{ChunkEncoder, Interaction, Marker, UserRef};
    use faultline_webhook::{MockResponse, MockTransport};

    fn aggregator(mock: &Arc<MockTransport>) -> ErrorAggregator {
        let encoder = ChunkEncoder::new(2000, Marker::code_fence("rust")).unwrap();
        ErrorAggregator::new(DeliveryClient::new(mock.clone(), encoder, 10).unwrap())
    }

    fn at(hour: u32) -> InvocationContext {
        InvocationContext::Interaction(Interaction {
            id: u64::from(hour),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap(),
            user: UserRef {
                id: 7,
                name: "ferris".into(),
            },
            command: None,
            guild: None,
            channel: None,
        })
    }

    #[tokio::test]
    async fn repeats_group_under_one_signature() {
        let mock = Arc::new(MockTransport::new());
        let agg = aggregator(&mock);
        let failure = Failure::new("ValueError", "bad input");
        let sig = failure.render();

        agg.add_error(failure.clone(), None, None).await.unwrap();
        agg.add_error(failure, None, None).await.unwrap();

        let occurrences = agg.occurrences(&sig);
        assert_eq!(occurrences.len(), 2);
        assert_ne!(occurrences[0].id, occurrences[1].id);
        assert_eq!(agg.signature_count(), 1);
        assert_eq!(mock.sent().len(), 2);
    }

    #[tokio::test]
    async fn distinct_signatures_kept_apart() {
        let mock = Arc::new(MockTransport::new());
        let agg = aggregator(&mock);

        agg.add_error(Failure::new("A", "x"), None, None).await.unwrap();
        agg.add_error(Failure::new("B", "x"), None, None).await.unwrap();
        agg.add_error(Failure::new("A", "x"), None, None).await.unwrap();

        assert_eq!(agg.signature_count(), 2);
        assert_eq!(agg.total_occurrences(), 3);
        assert!(agg.occurrences("nothing").is_empty());
    }

    #[tokio::test]
    async fn occurrence_recorded_even_when_delivery_fails() {
        let mock = Arc::new(MockTransport::new());
        mock.push_execute(MockResponse::Error(DeliveryError::Network("down".into())));
        let agg = aggregator(&mock);
        let failure = Failure::new("IoError", "disk full");
        let sig = failure.render();

        let err = agg.add_error(failure, None, None).await.unwrap_err();
        assert_eq!(err.error_kind(), "network");
        assert_eq!(agg.occurrences(&sig).len(), 1);
    }

    #[tokio::test]
    async fn report_swallows_delivery_errors() {
        let mock = Arc::new(MockTransport::new());
        mock.push_fetch(MockResponse::Error(DeliveryError::from_status(
            401,
            "invalid token".into(),
        )));
        let agg = aggregator(&mock);

        agg.report(Failure::new("E", "m"), None, None).await;

        assert_eq!(agg.total_occurrences(), 1);
        assert!(mock.sent().is_empty());
    }

    #[tokio::test]
    async fn history_limit_evicts_oldest() {
        let mock = Arc::new(MockTransport::new());
        let agg = aggregator(&mock).with_history_limit(Some(2));
        let failure = Failure::new("E", "m");
        let sig = failure.render();

        for hour in 1..=4 {
            agg.add_error(failure.clone(), Some(&at(hour)), None)
                .await
                .unwrap();
        }

        let kept: Vec<u32> = agg
            .occurrences(&sig)
            .iter()
            .map(|o| chrono::Timelike::hour(&o.time()))
            .collect();
        assert_eq!(kept, vec![3, 4]);
        // Every occurrence is still delivered.
        assert_eq!(mock.sent().len(), 4);
    }

    #[tokio::test]
    async fn summaries_sorted_most_recent_first() {
        let mock = Arc::new(MockTransport::new());
        let agg = aggregator(&mock);
        let old = Failure::new("Old", "m");
        let new = Failure::new("New", "m");

        agg.add_error(old.clone(), Some(&at(1)), None).await.unwrap();
        agg.add_error(new.clone(), Some(&at(5)), None).await.unwrap();
        agg.add_error(old.clone(), Some(&at(3)), None).await.unwrap();

        let summaries = agg.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].signature, new.render());
        assert_eq!(summaries[1].signature, old.render());
        assert_eq!(summaries[1].count, 2);
        assert_eq!(summaries[1].first_seen, Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap());
        assert_eq!(summaries[1].last_seen, Utc.with_ymd_and_hms(2026, 1, 1, 3, 0, 0).unwrap());
        assert_eq!(summaries[1].fingerprint, fingerprint(&old.render()));
    }

    #[tokio::test]
    async fn panicked_task_is_reported() {
        let mock = Arc::new(MockTransport::new());
        let agg = aggregator(&mock);

        let err = tokio::spawn(async { panic!("worker exploded") })
            .await
            .unwrap_err();
        agg.report_join_error(err, None, Some("worker")).await;

        let sig = Failure::new("panic", "worker exploded").render();
        let occurrences = agg.occurrences(&sig);
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].metadata.event_name.as_deref(), Some("worker"));
        assert_eq!(mock.sent().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_task_is_reported() {
        let mock = Arc::new(MockTransport::new());
        let agg = aggregator(&mock);

        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let err = handle.await.unwrap_err();
        assert!(err.is_cancelled());
        agg.report_join_error(err, None, None).await;

        let summaries = agg.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].signature, "cancelled: task was cancelled\n");
    }

    #[tokio::test]
    async fn cancelled_tasks_share_one_signature() {
        let mock = Arc::new(MockTransport::new());
        let agg = aggregator(&mock);

        for _ in 0..3 {
            let handle = tokio::spawn(std::future::pending::<()>());
            handle.abort();
            let err = handle.await.unwrap_err();
            agg.report_join_error(err, None, Some("background_sync")).await;
        }

        let sig = Failure::new("cancelled", "task was cancelled").render();
        assert_eq!(agg.signature_count(), 1);
        assert_eq!(agg.occurrences(&sig).len(), 3);
    }
}
