// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::RwLock;

use serde_json::Value;

use crate::backend::DocumentStore;
use crate::document::{value_cmp, DocumentSnapshot};
use crate::error::{StoreError, StoreErrorCode};
use crate::query::{Direction, FieldFilter, FilterOp, OrderBy, StructuredQuery, DOC_ID_FIELD};

/// In-process document store with explicit composite-index bookkeeping.
///
/// A query that combines filters with ordering (or filters on two different
/// fields) is only servable when a matching composite index was registered
/// with [`MemoryStore::register_index`]; otherwise it fails exactly the way
/// the remote store does, with a missing-index error. Single-field queries
/// and unfiltered ordered scans always work.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<DocumentSnapshot>>>,
    indexes: RwLock<HashSet<String>>,
    fail_with: RwLock<Option<StoreError>>,
    pub fetch_calls: AtomicU64,
    pub count_calls: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            indexes: RwLock::new(HashSet::new()),
            fail_with: RwLock::new(None),
            fetch_calls: AtomicU64::new(0),
            count_calls: AtomicU64::new(0),
        }
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: &str, doc: DocumentSnapshot) {
        if let Ok(mut collections) = self.collections.write() {
            collections.entry(collection.to_string()).or_default().push(doc);
        }
    }

    pub fn insert_many(&self, collection: &str, docs: impl IntoIterator<Item = DocumentSnapshot>) {
        for doc in docs {
            self.insert(collection, doc);
        }
    }

    /// Registers a composite index over the given fields. Field order does
    /// not matter; the signature is canonicalized.
    pub fn register_index(&self, collection: &str, fields: &[&str]) {
        let signature = index_signature(collection, fields.iter().copied());
        if let Ok(mut indexes) = self.indexes.write() {
            indexes.insert(signature);
        }
    }

    /// Makes every subsequent operation fail with the given error, until
    /// [`MemoryStore::clear_failure`].
    pub fn fail_with(&self, error: StoreError) {
        if let Ok(mut slot) = self.fail_with.write() {
            *slot = Some(error);
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut slot) = self.fail_with.write() {
            *slot = None;
        }
    }

    #[must_use]
    pub fn fetch_call_count(&self) -> u64 {
        self.fetch_calls.load(AtomicOrdering::Relaxed)
    }

    fn injected_failure(&self) -> Option<StoreError> {
        self.fail_with.read().ok().and_then(|slot| slot.clone())
    }

    fn check_index(&self, query: &StructuredQuery, include_order: bool) -> Result<(), StoreError> {
        let mut fields: BTreeSet<&str> = query.filters.iter().map(|f| f.field.as_str()).collect();
        if include_order {
            fields.extend(
                query
                    .order_by
                    .iter()
                    .map(|o| o.field.as_str())
                    .filter(|f| *f != DOC_ID_FIELD),
            );
        }
        if query.filters.is_empty() || fields.len() < 2 {
            return Ok(());
        }
        let signature = index_signature(&query.collection, fields.iter().copied());
        let registered = self
            .indexes
            .read()
            .map_err(|_| StoreError::new(StoreErrorCode::Internal, "index registry poisoned"))?
            .contains(&signature);
        if registered {
            Ok(())
        } else {
            let listed = fields.into_iter().collect::<Vec<_>>().join(", ");
            Err(StoreError::missing_index(format!(
                "the query requires a composite index on ({listed})"
            )))
        }
    }

    fn matching_docs(&self, query: &StructuredQuery) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::new(StoreErrorCode::Internal, "collection map poisoned"))?;
        let docs = collections
            .get(&query.collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(docs
            .iter()
            .filter(|doc| query.filters.iter().all(|f| filter_matches(doc, f)))
            .cloned()
            .collect())
    }
}

fn index_signature<'a>(collection: &str, fields: impl Iterator<Item = &'a str>) -> String {
    let mut sorted: Vec<&str> = fields.collect();
    sorted.sort_unstable();
    format!("{collection}:{}", sorted.join("+"))
}

fn filter_matches(doc: &DocumentSnapshot, filter: &FieldFilter) -> bool {
    // Documents lacking the filtered field never match, mirroring the
    // remote store's sparse-index semantics.
    let Some(value) = doc.field(&filter.field) else {
        return false;
    };
    let ord = value_cmp(value, &filter.value);
    match filter.op {
        FilterOp::Eq => ord == Ordering::Equal,
        FilterOp::Ge => ord != Ordering::Less,
        FilterOp::Le => ord != Ordering::Greater,
    }
}

fn clause_value<'a>(doc: &'a DocumentSnapshot, field: &str) -> Value {
    if field == DOC_ID_FIELD {
        Value::String(doc.id.clone())
    } else {
        doc.field(field).cloned().unwrap_or(Value::Null)
    }
}

fn sequence_cmp(a: &DocumentSnapshot, b: &DocumentSnapshot, order_by: &[OrderBy]) -> Ordering {
    for clause in order_by {
        let mut ord = value_cmp(&clause_value(a, &clause.field), &clause_value(b, &clause.field));
        if clause.direction == Direction::Desc {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    // Deterministic total order even when the caller omits an id clause.
    a.id.cmp(&b.id)
}

/// Position of `doc` relative to the resume point in sequence terms:
/// `Greater` means the document comes strictly after it.
fn resume_cmp(
    doc: &DocumentSnapshot,
    resume: &crate::query::ResumePoint,
    order_by: &[OrderBy],
) -> Ordering {
    for clause in order_by {
        let doc_value = clause_value(doc, &clause.field);
        let resume_value = if clause.field == DOC_ID_FIELD {
            Value::String(resume.doc_id.clone())
        } else {
            resume.value_for(&clause.field).cloned().unwrap_or(Value::Null)
        };
        let mut ord = value_cmp(&doc_value, &resume_value);
        if clause.direction == Direction::Desc {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    doc.id.cmp(&resume.doc_id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, query: &StructuredQuery) -> Result<Vec<DocumentSnapshot>, StoreError> {
        self.fetch_calls.fetch_add(1, AtomicOrdering::Relaxed);
        if let Some(error) = self.injected_failure() {
            return Err(error);
        }
        self.check_index(query, true)?;

        let mut docs = self.matching_docs(query)?;
        docs.sort_by(|a, b| sequence_cmp(a, b, &query.order_by));

        if let Some(resume) = &query.start_after {
            docs.retain(|doc| resume_cmp(doc, resume, &query.order_by) == Ordering::Greater);
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn aggregate_count(&self, query: &StructuredQuery) -> Result<u64, StoreError> {
        self.count_calls.fetch_add(1, AtomicOrdering::Relaxed);
        if let Some(error) = self.injected_failure() {
            return Err(error);
        }
        self.check_index(query, false)?;
        Ok(self.matching_docs(query)?.len() as u64)
    }
}
