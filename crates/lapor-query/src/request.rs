// SPDX-License-Identifier: Apache-2.0

//! Pure query construction. No I/O happens here; these functions turn a
//! detected schema plus a filter set into a single [`StructuredQuery`].

use serde_json::json;

use lapor_model::{CategoryField, ReportFilter, TimeField, DATE_FIELD};
use lapor_store::{Direction, FilterOp, OrderBy, ResumePoint, StructuredQuery, DOC_ID_FIELD};

/// Ordering: detected time field descending, then document id descending.
/// The id clause guarantees a total order, so resume points stay unambiguous
/// when timestamps collide.
pub(crate) fn order_clauses(time_field: TimeField) -> Vec<OrderBy> {
    vec![
        OrderBy {
            field: time_field.as_str().to_string(),
            direction: Direction::Desc,
        },
        OrderBy {
            field: DOC_ID_FIELD.to_string(),
            direction: Direction::Desc,
        },
    ]
}

fn scope_filters(query: StructuredQuery, category_field: CategoryField, filter: &ReportFilter) -> StructuredQuery {
    let mut query = query;
    if let Some(stage) = filter.stage {
        query = query.with_filter(category_field.as_str(), FilterOp::Eq, json!(stage.as_i64()));
    }
    if let Some(range) = &filter.date {
        if let Some(start) = &range.start {
            query = query.with_filter(DATE_FIELD, FilterOp::Ge, json!(start));
        }
        if let Some(end) = &range.end {
            query = query.with_filter(DATE_FIELD, FilterOp::Le, json!(end));
        }
    }
    query
}

/// One ordered, limited page fetch. `limit` is the page size; the request
/// asks for one extra row so a full batch is distinguishable from an
/// exhausted collection without a second round trip.
pub(crate) fn build_page_query(
    collection: &str,
    category_field: CategoryField,
    time_field: TimeField,
    filter: &ReportFilter,
    resume: Option<&ResumePoint>,
    limit: usize,
) -> StructuredQuery {
    let mut query = scope_filters(StructuredQuery::collection(collection), category_field, filter);
    for clause in order_clauses(time_field) {
        query = query.order_by(clause.field, clause.direction);
    }
    query = query.limit(limit + 1);
    if let Some(resume) = resume {
        query = query.start_after(resume.clone());
    }
    query
}

/// Aggregate count request: same equality/date constraints, no ordering.
pub(crate) fn build_count_query(
    collection: &str,
    category_field: CategoryField,
    filter: &ReportFilter,
) -> StructuredQuery {
    scope_filters(StructuredQuery::collection(collection), category_field, filter)
}
