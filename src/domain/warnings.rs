// Fire-once warnings
use dashmap::DashSet;
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    /// Query cache enabled with no execution context to hold it
    CacheOutsideContext,
    /// A persisted document's shard key value was modified
    ShardKeyChanged,
    /// A string was written to a binary field
    StringStoredAsBinary,
    /// Update issued without a shard key on a sharded model
    UnshardedUpdate,
}

impl Warning {
    pub fn id(&self) -> &'static str {
        match self {
            Warning::CacheOutsideContext => "cache_outside_context",
            Warning::ShardKeyChanged => "shard_key_changed",
            Warning::StringStoredAsBinary => "string_stored_as_binary",
            Warning::UnshardedUpdate => "unsharded_update",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Warning::CacheOutsideContext => {
                "Query cache was enabled outside of a request scope; queries will not be cached. \
                 Wrap the work in QueryCacheMiddleware or query_cache::scope."
            }
            Warning::ShardKeyChanged => {
                "The shard key of a persisted document was changed; the update targets the \
                 document by its previous shard key value."
            }
            Warning::StringStoredAsBinary => {
                "A string value was written to a binary field and stored as its UTF-8 bytes."
            }
            Warning::UnshardedUpdate => {
                "A document of a sharded model was written without a complete shard key; \
                 the database may have to broadcast the operation."
            }
        }
    }
}

/// Set of warnings already emitted
#[derive(Debug, Default)]
pub struct Warnings {
    emitted: DashSet<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `kind` unless it was emitted before. Returns whether it fired.
    pub fn warn_once(&self, kind: Warning) -> bool {
        // DashSet::insert is the atomic check-and-insert
        if self.emitted.insert(kind) {
            tracing::warn!(warning = kind.id(), "{}", kind.message());
            true
        } else {
            false
        }
    }

    pub fn has_fired(&self, kind: Warning) -> bool {
        self.emitted.contains(&kind)
    }

    pub fn reset(&self) {
        self.emitted.clear();
    }
}

static GLOBAL_WARNINGS: Lazy<Warnings> = Lazy::new(Warnings::new);

/// Process-wide warnings
pub fn global() -> &'static Warnings {
    &GLOBAL_WARNINGS
}

pub fn warn_once(kind: Warning) -> bool {
    GLOBAL_WARNINGS.warn_once(kind)
}
