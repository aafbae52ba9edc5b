//! Document store trait definitions

use crate::{document::SearchResult, error::StoreResult};

/// The remote system holding the documents
///
/// Implementations:
/// - `HttpDocumentStore` (docsweep-egress): HTTP query and mutation endpoints
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a filter expression and return the matching rows, in store order
    async fn fetch(&self, query: &str) -> StoreResult<Vec<SearchResult>>;

    /// Delete every id in one atomic transaction
    ///
    /// Either all ids are deleted or none are; there is no per-id result.
    async fn delete_transaction(&self, ids: &[String]) -> StoreResult<()>;

    /// Distinct document types present in the store
    ///
    /// Stores that cannot enumerate their types return an empty list, which
    /// leaves "all types" searches without a type condition.
    async fn list_types(&self) -> StoreResult<Vec<String>> {
        Ok(Vec::new())
    }
}
