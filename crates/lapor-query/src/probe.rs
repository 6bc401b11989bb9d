// SPDX-License-Identifier: Apache-2.0

//! Schema probing: cheap limit-1 reads that decide, at query time, which
//! field names this collection's documents actually use. Detection is
//! best-effort, never authoritative; probe failures fall back to the primary
//! defaults silently, and downstream predicates tolerate a wrong guess.

use serde_json::json;
use tracing::debug;

use lapor_model::{CategoryField, StageValue, TimeField};
use lapor_store::{DocumentStore, FilterOp, StructuredQuery};

pub(crate) async fn detect_category_field(
    store: &dyn DocumentStore,
    collection: &str,
    stage: Option<StageValue>,
) -> CategoryField {
    let Some(stage) = stage else {
        return CategoryField::Tahap;
    };
    for candidate in CategoryField::candidates() {
        let query = StructuredQuery::collection(collection)
            .with_filter(candidate.as_str(), FilterOp::Eq, json!(stage.as_i64()))
            .limit(1);
        match store.fetch(&query).await {
            Ok(docs) if !docs.is_empty() => return candidate,
            Ok(_) => {}
            Err(err) => {
                debug!(collection, error = %err, "category probe failed, using primary key");
                return CategoryField::Tahap;
            }
        }
    }
    // No documents under either key for this stage yet.
    CategoryField::Tahap
}

pub(crate) async fn detect_time_field(
    store: &dyn DocumentStore,
    collection: &str,
    category_field: CategoryField,
    stage: Option<StageValue>,
) -> TimeField {
    let mut query = StructuredQuery::collection(collection).limit(1);
    if let Some(stage) = stage {
        query = query.with_filter(category_field.as_str(), FilterOp::Eq, json!(stage.as_i64()));
    }
    let sample = match store.fetch(&query).await {
        Ok(docs) => docs,
        Err(err) => {
            debug!(collection, error = %err, "time probe failed, using primary candidate");
            return TimeField::CreatedAt;
        }
    };
    let Some(doc) = sample.first() else {
        return TimeField::CreatedAt;
    };
    TimeField::candidates()
        .into_iter()
        .find(|candidate| doc.field(candidate.as_str()).is_some())
        .unwrap_or(TimeField::CreatedAt)
}
