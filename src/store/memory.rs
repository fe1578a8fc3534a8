use std::cell::RefCell;

use anyhow::Result;
use serde_json::Value;

use super::{assign_id, distinct_values, field_equals, DocumentStore};

/// Keeps documents in memory for the lifetime of the page.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RefCell<Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn insert_one(&self, mut document: Value) -> Result<String> {
        let id = assign_id(&mut document)?;
        self.documents.borrow_mut().push(document);
        Ok(id)
    }

    fn find(&self, field: &str, value: &Value) -> Result<Vec<Value>> {
        Ok(self
            .documents
            .borrow()
            .iter()
            .filter(|document| field_equals(document, field, value))
            .cloned()
            .collect())
    }

    fn distinct(&self, field: &str) -> Result<Vec<Value>> {
        Ok(distinct_values(self.documents.borrow().iter(), field))
    }
}
