// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::DocumentSnapshot;

/// Pseudo-field naming the document id in an ordering clause.
pub const DOC_ID_FIELD: &str = "__name__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FilterOp {
    Eq,
    Ge,
    Le,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Resume-after point: the order-field values and id of the last document a
/// previous fetch visited. Only meaningful under the exact ordering that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumePoint {
    /// `(field name, value)` for each non-id ordering field, in clause order.
    pub order_values: Vec<(String, Value)>,
    pub doc_id: String,
}

impl ResumePoint {
    /// Captures a resume point from a visited document under the query's
    /// ordering clauses.
    #[must_use]
    pub fn from_snapshot(doc: &DocumentSnapshot, order_by: &[OrderBy]) -> Self {
        let order_values = order_by
            .iter()
            .filter(|o| o.field != DOC_ID_FIELD)
            .map(|o| {
                (
                    o.field.clone(),
                    doc.field(&o.field).cloned().unwrap_or(Value::Null),
                )
            })
            .collect();
        Self {
            order_values,
            doc_id: doc.id.clone(),
        }
    }

    #[must_use]
    pub fn value_for(&self, field: &str) -> Option<&Value> {
        self.order_values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// A single ordered, limited read against one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub start_after: Option<ResumePoint>,
}

impl StructuredQuery {
    #[must_use]
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            start_after: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            op,
            value,
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn start_after(mut self, resume: ResumePoint) -> Self {
        self.start_after = Some(resume);
        self
    }

    /// The same query with every filter removed; ordering, limit and resume
    /// point are preserved. This is the shape the fallback path submits.
    #[must_use]
    pub fn without_filters(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            filters: Vec::new(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            start_after: self.start_after.clone(),
        }
    }
}
