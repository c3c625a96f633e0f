//! The abstract collection capability consumed by pagination and ranking.

use crate::error::Result;
use crate::filter::Filter;
use crate::pipeline::Pipeline;
use crate::query::FindOptions;
use crate::types::Document;
use async_trait::async_trait;

/// A queryable, countable document collection.
///
/// ## Design Note
/// - Object-safe via `async_trait` so callers hold `Arc<dyn Collection>`
/// - `Send + Sync` so one handle serves concurrent requests
/// - Each method is one independent round trip; nothing is pinned across
///   calls, so a `count` followed by a `find` may observe different data
#[async_trait]
pub trait Collection: Send + Sync {
    /// Name of the collection (for logging/debugging)
    fn name(&self) -> &str;

    /// Number of documents matching the filter.
    async fn count(&self, filter: &Filter) -> Result<usize>;

    /// Matching documents, sorted, then skipped and limited, then projected.
    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>>;

    /// Run an aggregation pipeline over the whole collection.
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>>;
}
