use crate::domain::error::DocError;
use crate::domain::model::{Model, ModelConfig};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Model declarations keyed by Rust type and by model name
#[derive(Default)]
pub struct ModelRegistry {
    by_type: DashMap<TypeId, Arc<ModelConfig>>,
    by_name: DashMap<String, Arc<ModelConfig>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Model>(&self) -> Result<Arc<ModelConfig>, DocError> {
        if let Some(existing) = self.by_type.get(&TypeId::of::<M>()) {
            return Ok(existing.clone());
        }
        let config = self.register_config(M::config())?;
        self.by_type.insert(TypeId::of::<M>(), config.clone());
        Ok(config)
    }

    /// Register an untyped declaration (e.g. from the config file).
    /// Registering the same declaration twice is a no-op.
    pub fn register_config(&self, config: ModelConfig) -> Result<Arc<ModelConfig>, DocError> {
        let config = config.finalize()?;

        match self.by_name.entry(config.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                if **entry.get() != config {
                    return Err(DocError::Config(format!(
                        "model '{}' is already registered with a different declaration",
                        config.name
                    )));
                }
                Ok(entry.get().clone())
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                tracing::debug!(
                    model = %config.name,
                    collection = %config.collection,
                    fields = config.fields.len(),
                    "registered model"
                );
                let config = Arc::new(config);
                entry.insert(config.clone());
                Ok(config)
            }
        }
    }

    pub fn get<M: Model>(&self) -> Option<Arc<ModelConfig>> {
        self.by_type.get(&TypeId::of::<M>()).map(|c| c.clone())
    }

    pub fn by_name(&self, name: &str) -> Result<Arc<ModelConfig>, DocError> {
        self.by_name
            .get(name)
            .map(|c| c.clone())
            .ok_or_else(|| DocError::UnknownModel(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
