// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::document::DocumentSnapshot;
use crate::error::StoreError;
use crate::query::StructuredQuery;

/// Read-only access to the remote document collection.
///
/// Both operations must report an unsupported filter+order combination as a
/// [`StoreError`] whose `is_missing_index()` is true; that is the only error
/// class the query engine recovers from. Everything else propagates to the
/// caller unchanged.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Executes an ordered, limited batch read.
    async fn fetch(&self, query: &StructuredQuery) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Server-side aggregate count over the query's filters. Ordering, limit
    /// and resume point are ignored.
    async fn aggregate_count(&self, query: &StructuredQuery) -> Result<u64, StoreError>;
}
