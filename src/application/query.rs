use crate::domain::criteria::Criteria;
use crate::domain::document::{Document, ID_FIELD};
use crate::domain::error::DocError;
use crate::domain::instance::Instance;
use crate::domain::model::ModelConfig;
use crate::domain::traits::Driver;
use crate::domain::warnings::{warn_once, Warning};
use crate::infrastructure::storage::cache::{self as query_cache, CacheEntry};
use serde_json::Value;
use std::sync::Arc;

/// Runs queries through the request-scoped cache and writes straight to the
/// driver. Every write clears the current context's cache.
#[derive(Clone)]
pub struct QueryExecutor {
    driver: Arc<dyn Driver>,
}

impl QueryExecutor {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub async fn find(&self, criteria: &Criteria) -> Result<CacheEntry, DocError> {
        // 1. Query cache
        if query_cache::is_enabled() {
            let fingerprint = criteria.fingerprint();
            if let Some(hit) = query_cache::fetch(&fingerprint) {
                tracing::debug!(
                    collection = %criteria.collection,
                    %fingerprint,
                    "query cache hit"
                );
                return Ok(hit);
            }

            // 2. Driver, then populate the cache unless a write cleared it
            // while the driver call was in flight
            let generation = query_cache::generation();
            let docs = Arc::new(self.driver.find(criteria).await?);
            tracing::debug!(
                collection = %criteria.collection,
                %fingerprint,
                documents = docs.len(),
                "query cache miss"
            );
            if !query_cache::store_if(generation, fingerprint, docs.clone()) {
                tracing::debug!(collection = %criteria.collection, "stale result not cached");
            }
            return Ok(docs);
        }

        Ok(Arc::new(self.driver.find(criteria).await?))
    }

    pub async fn find_instances(
        &self,
        config: &Arc<ModelConfig>,
        criteria: &Criteria,
    ) -> Result<Vec<Instance>, DocError> {
        if criteria.collection != config.collection {
            return Err(DocError::InvalidQuery(format!(
                "{} lives in '{}', criteria targets '{}'",
                config.name, config.collection, criteria.collection
            )));
        }

        let docs = self.find(criteria).await?;
        Ok(docs
            .iter()
            .map(|doc| Instance::from_document(config.clone(), doc.clone(), criteria.projection.clone()))
            .collect())
    }

    pub async fn find_by_id(&self, config: &Arc<ModelConfig>, id: &str) -> Result<Instance, DocError> {
        let criteria =
            Criteria::new(config.collection.clone()).where_eq(ID_FIELD, Value::String(id.to_string()));
        self.find_instances(config, &criteria)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocError::NotFound {
                collection: config.collection.clone(),
                selector: Value::Object(criteria.selector).to_string(),
            })
    }

    pub async fn count(&self, collection: &str) -> Result<u64, DocError> {
        self.driver.count(collection).await
    }

    pub async fn insert(&self, instance: &mut Instance) -> Result<(), DocError> {
        if instance.is_persisted() {
            return Err(DocError::InvalidQuery(format!(
                "{} {} is already persisted",
                instance.model_name(),
                instance.id().unwrap_or_default()
            )));
        }
        check_shard_key(instance, &instance.shard_key_selector());

        let collection = instance.config().collection.clone();
        let result = self
            .driver
            .insert(&collection, instance.attributes().clone())
            .await;
        query_cache::clear();
        result?;

        instance.mark_persisted();
        Ok(())
    }

    /// Persist changed attributes. Returns false when nothing changed.
    pub async fn update(&self, instance: &mut Instance) -> Result<bool, DocError> {
        if !instance.is_persisted() {
            return Err(DocError::InvalidQuery(format!(
                "{} is not persisted yet",
                instance.model_name()
            )));
        }

        let changes = instance.changed_attributes();
        if changes.is_empty() {
            return Ok(false);
        }

        let selector = persisted_selector(instance)?;
        let collection = instance.config().collection.clone();
        let result = self.driver.update(&collection, &selector, &changes).await;
        query_cache::clear();

        if result? == 0 {
            return Err(DocError::NotFound {
                collection,
                selector: Value::Object(selector).to_string(),
            });
        }

        instance.mark_persisted();
        Ok(true)
    }

    pub async fn delete(&self, instance: &Instance) -> Result<u64, DocError> {
        let selector = persisted_selector(instance)?;
        let collection = instance.config().collection.clone();
        let result = self.driver.delete(&collection, &selector).await;
        query_cache::clear();
        result
    }

    /// Delete everything matching a raw selector
    pub async fn delete_where(&self, collection: &str, selector: &Document) -> Result<u64, DocError> {
        let result = self.driver.delete(collection, selector).await;
        query_cache::clear();
        result
    }
}

/// `_id` plus the shard key as the store currently holds it
fn persisted_selector(instance: &Instance) -> Result<Document, DocError> {
    let id = instance
        .id_in_db()
        .ok_or_else(|| DocError::InvalidQuery(format!("{} has no _id", instance.model_name())))?;

    let mut selector = instance.shard_key_selector_in_db();
    check_shard_key(instance, &selector);
    selector.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    Ok(selector)
}

fn check_shard_key(instance: &Instance, selector: &Document) {
    if instance.config().is_sharded() && selector.values().any(Value::is_null) {
        warn_once(Warning::UnshardedUpdate);
    }
}
