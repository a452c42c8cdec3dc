use crate::application::query::QueryExecutor;
use crate::application::registry::ModelRegistry;
use crate::domain::error::DocError;
use crate::domain::traits::Driver;
use crate::infrastructure::config::Config;
use crate::interfaces::middleware::QueryCacheMiddleware;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub executor: QueryExecutor,
    pub registry: Arc<ModelRegistry>,
    pub middleware: QueryCacheMiddleware,
    pub config: Arc<RwLock<Config>>,
}

impl AppState {
    /// Build the state and register every model declared in the config
    pub fn new(driver: Arc<dyn Driver>, config: Config) -> Result<Self, DocError> {
        let registry = ModelRegistry::new();
        for model in &config.models {
            registry.register_config(model.clone())?;
        }

        Ok(Self {
            executor: QueryExecutor::new(driver),
            registry: Arc::new(registry),
            middleware: QueryCacheMiddleware::from_config(&config.query_cache),
            config: Arc::new(RwLock::new(config)),
        })
    }
}
