//! docmap: a small object-document mapper.
//!
//! Models are declared with [`ModelConfig`] and registered in a
//! [`ModelRegistry`]. [`QueryExecutor`] runs [`Criteria`] against a
//! [`Driver`], consulting the request-scoped query cache first. Wrap each
//! request in [`QueryCacheMiddleware`] to get a fresh cache that is torn down
//! when the request ends.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod presentation;
pub mod state;

pub use application::query::QueryExecutor;
pub use application::registry::ModelRegistry;
pub use domain::criteria::{Criteria, Fingerprint, Projection};
pub use domain::document::Document;
pub use domain::error::DocError;
pub use domain::instance::Instance;
pub use domain::model::{Field, FieldType, Model, ModelConfig};
pub use domain::traits::Driver;
pub use infrastructure::storage::cache as query_cache;
pub use interfaces::middleware::QueryCacheMiddleware;
