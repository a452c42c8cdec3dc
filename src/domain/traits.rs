use crate::domain::criteria::Criteria;
use crate::domain::document::Document;
use crate::domain::error::DocError;
use async_trait::async_trait;

/// Trait for document store drivers
///
/// The driver is the only component that touches storage. The query cache
/// sits in front of `find`; writes always reach the driver.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Short name used in logs and status output
    fn name(&self) -> &'static str;

    /// Documents matching the criteria, sorted, paged and projected
    async fn find(&self, criteria: &Criteria) -> Result<Vec<Document>, DocError>;

    /// Insert a new document. The document must carry an `_id`.
    async fn insert(&self, collection: &str, doc: Document) -> Result<(), DocError>;

    /// Set the given (dotted) paths on every document matching `selector`.
    /// Returns the number of documents modified.
    async fn update(
        &self,
        collection: &str,
        selector: &Document,
        set: &Document,
    ) -> Result<u64, DocError>;

    /// Delete every document matching `selector`
    async fn delete(&self, collection: &str, selector: &Document) -> Result<u64, DocError>;

    /// Number of documents in a collection
    async fn count(&self, collection: &str) -> Result<u64, DocError>;
}
