// In-memory document store using DashMap
use crate::domain::criteria::Criteria;
use crate::domain::document::{set_path, Document, ID_FIELD};
use crate::domain::error::DocError;
use crate::domain::traits::Driver;
use crate::infrastructure::logging::DRIVER_TARGET as LOG_TARGET;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

/// Thread-safe in-memory driver. Collections keep insertion order.
#[derive(Default)]
pub struct MemoryDriver {
    collections: DashMap<String, Vec<Document>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn find(&self, criteria: &Criteria) -> Result<Vec<Document>, DocError> {
        let docs = self
            .collections
            .get(&criteria.collection)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        let result = criteria.apply(docs);
        tracing::debug!(
            target: LOG_TARGET,
            collection = %criteria.collection,
            returned = result.len(),
            "find"
        );
        Ok(result)
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<(), DocError> {
        let id = doc
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| DocError::InvalidQuery("document has no string _id".to_string()))?
            .to_string();

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs
            .iter()
            .any(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(DocError::InvalidQuery(format!(
                "duplicate _id '{}' in {}",
                id, collection
            )));
        }
        docs.push(doc);
        tracing::debug!(target: LOG_TARGET, collection, "insert");
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        selector: &Document,
        set: &Document,
    ) -> Result<u64, DocError> {
        let criteria = Criteria::with_selector(collection, selector.clone())?;
        let mut modified = 0;
        if let Some(mut docs) = self.collections.get_mut(collection) {
            for doc in docs.iter_mut().filter(|d| criteria.matches(d)) {
                for (path, value) in set {
                    set_path(doc, path, value.clone());
                }
                modified += 1;
            }
        }
        tracing::debug!(target: LOG_TARGET, collection, modified, "update");
        Ok(modified)
    }

    async fn delete(&self, collection: &str, selector: &Document) -> Result<u64, DocError> {
        let criteria = Criteria::with_selector(collection, selector.clone())?;
        let mut deleted = 0;
        if let Some(mut docs) = self.collections.get_mut(collection) {
            let before = docs.len();
            docs.retain(|d| !criteria.matches(d));
            deleted = (before - docs.len()) as u64;
        }
        tracing::debug!(target: LOG_TARGET, collection, deleted, "delete");
        Ok(deleted)
    }

    async fn count(&self, collection: &str) -> Result<u64, DocError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }
}
