use std::rc::Rc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{pair_key, MeasurementPair, MeasurementResult};

pub use local::LocalStorageStore;
pub use memory::MemoryStore;

mod local;
mod memory;

const ID_FIELD: &str = "_id";
const KEY_FIELD: &str = "urls";

/// The handful of document database operations the dashboard relies on.
pub trait DocumentStore {
    /// Stores `document` and returns its `_id`, generating one when it's missing.
    fn insert_one(&self, document: Value) -> Result<String>;

    /// Every document whose `field` equals `value`, in storage order.
    fn find(&self, field: &str, value: &Value) -> Result<Vec<Value>>;

    /// Distinct values of `field`, in the order they were first stored.
    fn distinct(&self, field: &str) -> Result<Vec<Value>>;
}

#[derive(Serialize)]
struct NewPair<'a> {
    data: [&'a MeasurementResult; 2],
    timestamp: DateTime<Utc>,
    urls: String,
}

/// Paired measurements on top of a shared document store handle.
#[derive(Clone)]
pub struct ResultStore {
    documents: Rc<dyn DocumentStore>,
}

impl ResultStore {
    pub fn new(documents: Rc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    pub fn insert(
        &self,
        first: &MeasurementResult,
        second: &MeasurementResult,
    ) -> Result<String, StoreError> {
        self.insert_at(first, second, Utc::now())
    }

    pub fn insert_at(
        &self,
        first: &MeasurementResult,
        second: &MeasurementResult,
        timestamp: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let urls = pair_key(first, second);
        let document = serde_json::to_value(NewPair {
            data: [first, second],
            timestamp,
            urls: urls.clone(),
        })?;

        let id = self.documents.insert_one(document)?;
        info!(%id, key = %urls, "measurement pair stored");

        Ok(id)
    }

    pub fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let keys = self
            .documents
            .distinct(KEY_FIELD)?
            .into_iter()
            .filter_map(|value| match value {
                Value::String(key) => Some(key),
                _ => None,
            })
            .collect::<Vec<_>>();

        debug!(count = keys.len(), "keys listed");

        Ok(keys)
    }

    pub fn fetch_by_key(&self, key: &str) -> Result<Vec<MeasurementPair>, StoreError> {
        let documents = self
            .documents
            .find(KEY_FIELD, &Value::String(key.to_string()))?;

        debug!(key, count = documents.len(), "measurement pairs fetched");

        documents
            .into_iter()
            .map(|document| {
                serde_json::from_value::<MeasurementPair>(document).map_err(StoreError::from)
            })
            .collect()
    }
}

fn field_equals(document: &Value, field: &str, value: &Value) -> bool {
    document.get(field) == Some(value)
}

fn distinct_values<'a>(documents: impl IntoIterator<Item = &'a Value>, field: &str) -> Vec<Value> {
    let mut values = Vec::new();
    for value in documents
        .into_iter()
        .filter_map(|document| document.get(field))
    {
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
    values
}

/// Gives the document an `_id` when it has none and returns it.
fn assign_id(document: &mut Value) -> Result<String> {
    let Value::Object(fields) = document else {
        return Err(anyhow!("only objects can be stored, got {document}"));
    };

    match fields.get(ID_FIELD) {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(id) => Err(anyhow!("unsupported document id {id}")),
        None => {
            let id = Uuid::new_v4().to_string();
            fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            Ok(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use crate::types::fixtures::measurement;

    use super::*;

    fn result_store() -> ResultStore {
        ResultStore::new(Rc::new(MemoryStore::new()))
    }

    #[test]
    fn test_insert_then_fetch_by_key() {
        let store = result_store();
        let a = measurement("http://a/", 1234.0);
        let b = measurement("http://b/", 5678.0);

        let before = Utc::now();
        let id = store.insert(&a, &b).unwrap();

        let pairs = store.fetch_by_key("http://a/ | http://b/").unwrap();
        assert_eq!(pairs.len(), 1);

        let pair = &pairs[0];
        assert_eq!(pair.id, id);
        assert_eq!(pair.data, [a, b]);
        assert_eq!(pair.urls, "http://a/ | http://b/");
        assert!(pair.timestamp >= before);
        assert!(pair.timestamp <= Utc::now());
    }

    #[test]
    fn test_swapped_urls_produce_distinct_keys() {
        let store = result_store();
        let a = measurement("http://a/", 1234.0);
        let b = measurement("http://b/", 5678.0);

        store.insert(&a, &b).unwrap();
        store.insert(&b, &a).unwrap();

        assert_eq!(
            store.list_keys().unwrap(),
            vec!["http://a/ | http://b/", "http://b/ | http://a/"]
        );
        assert_eq!(store.fetch_by_key("http://b/ | http://a/").unwrap().len(), 1);
    }

    #[test]
    fn test_repeated_runs_accumulate_under_one_key() {
        let store = result_store();
        let a = measurement("http://a/", 1000.0);
        let b = measurement("http://b/", 2000.0);

        store.insert(&a, &b).unwrap();
        store.insert(&a, &b).unwrap();
        store.insert(&a, &b).unwrap();

        assert_eq!(store.list_keys().unwrap().len(), 1);
        assert_eq!(store.fetch_by_key("http://a/ | http://b/").unwrap().len(), 3);
    }

    #[test]
    fn test_trailing_slash_splits_history() {
        let store = result_store();
        let b = measurement("http://b/", 2000.0);

        store.insert(&measurement("http://a/", 1000.0), &b).unwrap();
        store.insert(&measurement("http://a", 1000.0), &b).unwrap();

        assert_eq!(store.list_keys().unwrap().len(), 2);
        assert_eq!(store.fetch_by_key("http://a/ | http://b/").unwrap().len(), 1);
        assert_eq!(store.fetch_by_key("http://a | http://b/").unwrap().len(), 1);
        assert!(store.fetch_by_key("HTTP://A/ | HTTP://B/").unwrap().is_empty());
    }

    #[test]
    fn test_stored_document_shape() {
        let documents = Rc::new(MemoryStore::new());
        let store = ResultStore::new(documents.clone());
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        store
            .insert_at(
                &measurement("http://a/", 1234.0),
                &measurement("http://b/", 5678.0),
                timestamp,
            )
            .unwrap();

        let stored = documents.find("urls", &json!("http://a/ | http://b/")).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["timestamp"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(stored[0]["data"][0]["requestedUrl"], json!("http://a/"));
        assert_eq!(
            stored[0]["data"][1]["audits"]["interactive"]["numericValue"],
            json!(5678.0)
        );
        assert!(stored[0]["_id"].is_string());
    }

    #[test]
    fn test_fetch_unknown_key_is_empty() {
        let store = result_store();

        assert!(store.fetch_by_key("http://x/ | http://y/").unwrap().is_empty());
        assert!(store.list_keys().unwrap().is_empty());
    }

    #[test]
    fn test_assign_id_keeps_existing_id() {
        let mut document = json!({ "_id": "abc", "urls": "x" });
        assert_eq!(assign_id(&mut document).unwrap(), "abc");

        let mut document = json!({ "urls": "x" });
        let id = assign_id(&mut document).unwrap();
        assert_eq!(document["_id"], json!(id));

        assert!(assign_id(&mut json!([1, 2])).is_err());
        assert!(assign_id(&mut json!({ "_id": 42 })).is_err());
    }

    #[test]
    fn test_distinct_values_keep_first_seen_order() {
        let documents = [
            json!({ "urls": "b" }),
            json!({ "urls": "a" }),
            json!({ "other": 1 }),
            json!({ "urls": "b" }),
        ];

        assert_eq!(
            distinct_values(&documents, "urls"),
            vec![json!("b"), json!("a")]
        );
    }
}
