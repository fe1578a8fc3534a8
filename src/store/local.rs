use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::debug;
use web_sys::Storage;

use super::{assign_id, distinct_values, field_equals, DocumentStore};

/// A collection persisted in the browser's `localStorage`, as a single JSON array
/// stored under the collection namespace.
///
/// History is bounded by the origin's storage quota (about 5 MB in most browsers). Once it
/// is reached every insert fails and the stored collection is left as it was.
pub struct LocalStorageStore {
    storage: Storage,
    namespace: String,
}

impl LocalStorageStore {
    pub fn try_new(namespace: impl Into<String>) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
        let storage = window
            .local_storage()
            .map_err(|err| anyhow!("localStorage access error: {err:?}"))?
            .ok_or_else(|| anyhow!("localStorage not available"))?;

        Ok(Self {
            storage,
            namespace: namespace.into(),
        })
    }

    fn load(&self) -> Result<Vec<Value>> {
        let item = self
            .storage
            .get_item(&self.namespace)
            .map_err(|err| anyhow!("localStorage read error: {err:?}"))?;

        decode_collection(item.as_deref())
            .with_context(|| format!("collection {} is corrupted", self.namespace))
    }

    fn save(&self, documents: &[Value]) -> Result<()> {
        let json = serde_json::to_string(documents)?;
        debug!(namespace = self.namespace, bytes = json.len(), "saving collection");

        self.storage
            .set_item(&self.namespace, &json)
            .map_err(|err| anyhow!("localStorage write error: {err:?}"))
    }
}

impl DocumentStore for LocalStorageStore {
    fn insert_one(&self, mut document: Value) -> Result<String> {
        let id = assign_id(&mut document)?;
        let mut documents = self.load()?;
        documents.push(document);
        self.save(&documents)?;
        Ok(id)
    }

    fn find(&self, field: &str, value: &Value) -> Result<Vec<Value>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|document| field_equals(document, field, value))
            .collect())
    }

    fn distinct(&self, field: &str) -> Result<Vec<Value>> {
        Ok(distinct_values(&self.load()?, field))
    }
}

fn decode_collection(item: Option<&str>) -> Result<Vec<Value>> {
    let Some(json) = item else {
        return Ok(Vec::new());
    };

    Ok(serde_json::from_str(json)?)
}
