// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::report::Report;

/// One assembled page of matching reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportPage {
    pub items: Vec<Report>,
    /// True iff at least one matching document exists strictly after
    /// `next_cursor`.
    pub has_next: bool,
    /// True iff the caller supplied a cursor. The engine does not iterate
    /// backward, so this is a statement about the request, not the data: a
    /// caller that fabricates a cursor for the first page will see `true`
    /// here even though no earlier page exists.
    pub has_prev: bool,
    /// Total matching documents, when the call computed one.
    pub total_count: Option<u64>,
    /// Resume token for the next page: the last raw document examined,
    /// matching or not. `None` only when the call examined no documents.
    pub next_cursor: Option<String>,
}
