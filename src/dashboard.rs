use chrono::{Duration, Utc};
use tracing::{error, info};

use crate::error::RunError;
use crate::request::Measurer;
use crate::store::ResultStore;
use crate::types::{pair_key, MeasurementResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub id: String,
    pub key: String,
    pub elapsed: Duration,
}

/// Measures both URLs concurrently, then stores the pair. Nothing is stored unless both
/// measurements succeed.
pub async fn run_test<M: Measurer>(
    measurer: &M,
    store: &ResultStore,
    url1: &str,
    url2: &str,
) -> Result<RunOutcome, RunError> {
    let started_at = Utc::now();
    info!(url1, url2, "run started");

    let (first, second) = measure_pair(measurer, url1, url2).await?;

    let key = pair_key(&first, &second);
    let id = store.insert(&first, &second).inspect_err(|err| {
        error!(key, "run measured but not stored: {err}");
    })?;

    let elapsed = Utc::now() - started_at;
    info!(%id, key, elapsed_ms = elapsed.num_milliseconds(), "run finished");

    Ok(RunOutcome { id, key, elapsed })
}

/// Both measurements are in flight at the same time, so a run lasts about as long as the
/// slowest page.
pub async fn measure_pair<M: Measurer>(
    measurer: &M,
    url1: &str,
    url2: &str,
) -> Result<(MeasurementResult, MeasurementResult), RunError> {
    let (first, second) = futures::join!(measurer.measure(url1), measurer.measure(url2));

    match (first, second) {
        (Ok(first), Ok(second)) => Ok((first, second)),
        (Err(source), Ok(_)) | (Ok(_), Err(source)) => Err(RunError::Partial {
            url: source.url().to_string(),
            source,
        }),
        (Err(first), Err(second)) => Err(RunError::Total { first, second }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::rc::Rc;

    use tokio::time::{sleep, Duration as StdDuration, Instant};

    use anyhow::{bail, Result as AnyResult};
    use serde_json::Value;

    use crate::error::{MeasureError, StoreError};
    use crate::store::{DocumentStore, MemoryStore};
    use crate::types::fixtures::measurement;

    use super::*;

    enum Answer {
        Interactive(f64),
        Unreachable,
        Malformed,
    }

    /// Answers after a fixed delay per URL.
    struct FakeMeasurer {
        answers: HashMap<&'static str, (u64, Answer)>,
    }

    impl FakeMeasurer {
        fn new(answers: impl IntoIterator<Item = (&'static str, u64, Answer)>) -> Self {
            Self {
                answers: answers
                    .into_iter()
                    .map(|(url, delay_ms, answer)| (url, (delay_ms, answer)))
                    .collect(),
            }
        }
    }

    impl Measurer for FakeMeasurer {
        async fn measure(&self, url: &str) -> Result<MeasurementResult, MeasureError> {
            let (delay_ms, answer) = &self.answers[url];
            sleep(StdDuration::from_millis(*delay_ms)).await;

            match answer {
                Answer::Interactive(ms) => Ok(measurement(url, *ms)),
                Answer::Unreachable => Err(MeasureError::Network {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                }),
                Answer::Malformed => Err(MeasureError::MalformedResponse {
                    url: url.to_string(),
                    reason: "missing field `numericValue`".to_string(),
                }),
            }
        }
    }

    /// Rejects inserts once `capacity` documents are stored, like a full `localStorage`.
    struct BoundedStore {
        documents: MemoryStore,
        capacity: usize,
    }

    impl DocumentStore for BoundedStore {
        fn insert_one(&self, document: Value) -> AnyResult<String> {
            if self.documents.distinct("_id")?.len() >= self.capacity {
                bail!("localStorage write error: QuotaExceededError");
            }
            self.documents.insert_one(document)
        }

        fn find(&self, field: &str, value: &Value) -> AnyResult<Vec<Value>> {
            self.documents.find(field, value)
        }

        fn distinct(&self, field: &str) -> AnyResult<Vec<Value>> {
            self.documents.distinct(field)
        }
    }

    fn result_store() -> (Rc<MemoryStore>, ResultStore) {
        let documents = Rc::new(MemoryStore::new());
        let store = ResultStore::new(documents.clone());
        (documents, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_measurements_run_concurrently() {
        let measurer = FakeMeasurer::new([
            ("http://a/", 2_000, Answer::Interactive(1234.0)),
            ("http://b/", 3_000, Answer::Interactive(5678.0)),
        ]);

        let started_at = Instant::now();
        let (first, second) = measure_pair(&measurer, "http://a/", "http://b/")
            .await
            .unwrap();
        let elapsed = started_at.elapsed();

        assert!(elapsed >= StdDuration::from_millis(3_000));
        assert!(elapsed < StdDuration::from_millis(3_100));
        assert_eq!(first.requested_url, "http://a/");
        assert_eq!(second.requested_url, "http://b/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stores_the_pair_in_order() {
        let measurer = FakeMeasurer::new([
            ("http://a/", 50, Answer::Interactive(1234.0)),
            ("http://b/", 10, Answer::Interactive(5678.0)),
        ]);
        let (_, store) = result_store();

        let outcome = run_test(&measurer, &store, "http://a/", "http://b/")
            .await
            .unwrap();

        assert_eq!(outcome.key, "http://a/ | http://b/");

        let pairs = store.fetch_by_key(&outcome.key).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].id, outcome.id);
        assert_eq!(pairs[0].data[0].time_to_interactive_ms(), 1234.0);
        assert_eq!(pairs[0].data[1].time_to_interactive_ms(), 5678.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_aborts_without_writing() {
        let measurer = FakeMeasurer::new([
            ("http://a/", 10, Answer::Interactive(1234.0)),
            ("http://b/", 10, Answer::Malformed),
        ]);
        let (documents, store) = result_store();

        let err = run_test(&measurer, &store, "http://a/", "http://b/")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::Partial {
                ref url,
                source: MeasureError::MalformedResponse { .. },
            } if url == "http://b/"
        ));
        assert!(store.list_keys().unwrap().is_empty());
        assert!(documents.distinct("_id").unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_failures_are_reported_together() {
        let measurer = FakeMeasurer::new([
            ("http://a/", 10, Answer::Unreachable),
            ("http://b/", 20, Answer::Malformed),
        ]);
        let (_, store) = result_store();

        let err = run_test(&measurer, &store, "http://a/", "http://b/")
            .await
            .unwrap_err();

        match err {
            RunError::Total { first, second } => {
                assert!(matches!(first, MeasureError::Network { .. }));
                assert!(matches!(second, MeasureError::MalformedResponse { .. }));
            }
            other => panic!("expected a total failure, got {other:?}"),
        }
        assert!(store.list_keys().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_url_failure_is_partial() {
        let measurer = FakeMeasurer::new([
            ("http://a/", 10, Answer::Unreachable),
            ("http://b/", 10, Answer::Interactive(5678.0)),
        ]);

        let err = measure_pair(&measurer, "http://a/", "http://b/")
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Partial { ref url, .. } if url == "http://a/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_store_fails_the_run_and_keeps_history() {
        let measurer = FakeMeasurer::new([
            ("http://a/", 10, Answer::Interactive(1234.0)),
            ("http://b/", 10, Answer::Interactive(5678.0)),
        ]);
        let store = ResultStore::new(Rc::new(BoundedStore {
            documents: MemoryStore::new(),
            capacity: 1,
        }));

        let first = run_test(&measurer, &store, "http://a/", "http://b/")
            .await
            .unwrap();
        let err = run_test(&measurer, &store, "http://a/", "http://b/")
            .await
            .unwrap_err();

        match err {
            RunError::Storage(StoreError::Storage(reason)) => {
                assert!(reason.contains("QuotaExceededError"), "{reason}");
            }
            other => panic!("expected a storage failure, got {other:?}"),
        }

        let pairs = store.fetch_by_key(&first.key).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].id, first.id);
    }
}
