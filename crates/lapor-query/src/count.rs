// SPDX-License-Identifier: Apache-2.0

use tracing::{debug, warn};

use lapor_model::{CategoryField, ReportFilter, TimeField};
use lapor_store::{DocumentStore, ResumePoint};

use crate::limits::EngineLimits;
use crate::paginate::accepts;
use crate::request;
use crate::session::ListSession;
use crate::EngineError;

/// Total matching documents for a filter set.
///
/// One aggregate request when the store can evaluate the whole predicate
/// (no free-text term); otherwise a linear scan with the full in-memory
/// predicate. The scan is O(collection size) and reserved for interactive
/// search, not hot loops.
pub(crate) async fn count_matching(
    store: &dyn DocumentStore,
    collection: &str,
    category_field: CategoryField,
    time_field: TimeField,
    filter: &ReportFilter,
    limits: &EngineLimits,
) -> Result<u64, EngineError> {
    if !filter.has_search() {
        let query = request::build_count_query(collection, category_field, filter);
        match store.aggregate_count(&query).await {
            Ok(total) => return Ok(total),
            Err(err) if err.is_missing_index() => {
                warn!(
                    collection,
                    error = %err,
                    "aggregate count needs a missing index, scanning instead"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    let order_by = request::order_clauses(time_field);
    let mut session = ListSession::new(store, collection, category_field, time_field, limits.clone());
    let mut resume: Option<ResumePoint> = None;
    let mut total = 0_u64;

    for _ in 0..limits.max_count_batches {
        let (docs, unfiltered) = session
            .fetch_batch(filter, resume.as_ref(), limits.count_batch_size)
            .await?;
        total += docs
            .iter()
            .filter(|doc| accepts(filter, doc, unfiltered))
            .count() as u64;
        let short = docs.len() <= limits.count_batch_size;
        if let Some(last) = docs.last() {
            resume = Some(ResumePoint::from_snapshot(last, &order_by));
        }
        if short {
            debug!(collection, total, "manual count finished");
            return Ok(total);
        }
    }
    warn!(collection, total, "manual count hit the batch ceiling, returning partial total");
    Ok(total)
}
