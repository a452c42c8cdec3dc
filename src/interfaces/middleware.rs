use crate::infrastructure::config::QueryCacheConfig;
use crate::infrastructure::storage::cache::{self as query_cache, CacheGuard};
use std::future::Future;

/// Wraps one request: the handler runs in its own cache context with the
/// cache enabled, and the store is disabled (and emptied) on every way out.
#[derive(Debug, Clone)]
pub struct QueryCacheMiddleware {
    enabled: bool,
}

impl Default for QueryCacheMiddleware {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl QueryCacheMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &QueryCacheConfig) -> Self {
        Self {
            enabled: config.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `next(input)` and hand back its output untouched
    pub async fn call<I, O, F, Fut>(&self, input: I, next: F) -> O
    where
        F: FnOnce(I) -> Fut,
        Fut: Future<Output = O>,
    {
        let enabled = self.enabled;
        query_cache::scope(async move {
            let _guard = enabled.then(CacheGuard::enable);
            tracing::trace!(cache = enabled, "request started");
            let output = next(input).await;
            tracing::trace!(cached_queries = query_cache::len(), "request finished");
            output
        })
        .await
    }
}
