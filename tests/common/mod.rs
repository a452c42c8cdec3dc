#![allow(dead_code)]

use async_trait::async_trait;
use docmap::infrastructure::storage::memory::MemoryDriver;
use docmap::{Criteria, DocError, Document, Driver, FieldType, ModelConfig};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Memory driver that counts `find` calls and can be told to fail them
#[derive(Default)]
pub struct CountingDriver {
    inner: MemoryDriver,
    finds: AtomicUsize,
    fail_finds: AtomicBool,
    find_yields: AtomicUsize,
}

impl CountingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn fail_finds(&self, fail: bool) {
        self.fail_finds.store(fail, Ordering::SeqCst);
    }

    /// Make `find` yield this many times after reading, before it returns
    pub fn slow_finds(&self, yields: usize) {
        self.find_yields.store(yields, Ordering::SeqCst);
    }
}

#[async_trait]
impl Driver for CountingDriver {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn find(&self, criteria: &Criteria) -> Result<Vec<Document>, DocError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(DocError::InvalidQuery("driver unavailable".to_string()));
        }
        let docs = self.inner.find(criteria).await?;
        for _ in 0..self.find_yields.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Ok(docs)
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<(), DocError> {
        self.inner.insert(collection, doc).await
    }

    async fn update(
        &self,
        collection: &str,
        selector: &Document,
        set: &Document,
    ) -> Result<u64, DocError> {
        self.inner.update(collection, selector, set).await
    }

    async fn delete(&self, collection: &str, selector: &Document) -> Result<u64, DocError> {
        self.inner.delete(collection, selector).await
    }

    async fn count(&self, collection: &str) -> Result<u64, DocError> {
        self.inner.count(collection).await
    }
}

pub fn person_config() -> ModelConfig {
    ModelConfig::new("Person")
        .field("name", FieldType::String)
        .field("age", FieldType::Integer)
        .field("region", FieldType::String)
        .field_with_default("active", FieldType::Boolean, Value::Bool(true))
        .shard_key(&["region"])
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}
