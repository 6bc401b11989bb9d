// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

use crate::fields::{CategoryField, DATE_FIELD, SEARCH_TEXT_FIELDS};
use crate::report::StageValue;

/// Inclusive date range over the raw `tanggal` string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    #[must_use]
    pub fn contains(&self, date: &str) -> bool {
        if let Some(start) = &self.start {
            if date < start.as_str() {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if date > end.as_str() {
                return false;
            }
        }
        true
    }
}

/// Canonical free-text normalization: NFKC + Unicode lowercase.
#[must_use]
pub fn normalize_search_term(input: &str) -> String {
    input.nfkc().collect::<String>().to_lowercase()
}

/// The full filter set a listing or counting call evaluates.
///
/// Server-side queries enforce the stage and date parts when an index allows
/// it; the in-memory methods here are the authority whenever the server
/// cannot be trusted to have filtered (fallback mode, free-text search, or a
/// wrongly detected category key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReportFilter {
    pub stage: Option<StageValue>,
    pub date: Option<DateRange>,
    pub search: Option<String>,
}

impl ReportFilter {
    /// Stage equality and date-range membership.
    ///
    /// The stage check accepts a match under either category key; a document
    /// written by the legacy path must not be dropped just because detection
    /// settled on the newer key.
    #[must_use]
    pub fn matches_scope(&self, fields: &Map<String, Value>) -> bool {
        if let Some(want) = self.stage {
            let found = CategoryField::candidates()
                .into_iter()
                .filter_map(|c| fields.get(c.as_str()))
                .filter_map(StageValue::from_value)
                .any(|got| got == want);
            if !found {
                return false;
            }
        }
        if let Some(range) = &self.date {
            if !range.is_empty() {
                match fields.get(DATE_FIELD).and_then(Value::as_str) {
                    Some(date) if range.contains(date) => {}
                    _ => return false,
                }
            }
        }
        true
    }

    /// Case-insensitive substring match over the fixed text attributes.
    /// An absent or blank term matches everything.
    #[must_use]
    pub fn matches_search(&self, fields: &Map<String, Value>) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let needle = normalize_search_term(term);
        if needle.is_empty() {
            return true;
        }
        SEARCH_TEXT_FIELDS.iter().any(|field| {
            fields
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|text| normalize_search_term(text).contains(&needle))
        })
    }

    #[must_use]
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.matches_scope(fields) && self.matches_search(fields)
    }

    #[must_use]
    pub fn has_search(&self) -> bool {
        self.search
            .as_deref()
            .is_some_and(|term| !term.trim().is_empty())
    }
}
