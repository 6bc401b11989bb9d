#![forbid(unsafe_code)]
//! Adaptive paginated query engine for report collections.
//!
//! The collection this engine reads was written by several generations of
//! code that disagree on field names, and the store may or may not have the
//! composite indexes a filtered, ordered query needs. The engine adapts at
//! query time: it probes the schema, falls back to in-memory filtering when
//! an index is missing, and assembles pages across however many raw batches
//! it takes to satisfy a free-text search the store cannot run natively.
//!
//! Entry points: [`ReportQueryEngine::fetch_page`],
//! [`ReportQueryEngine::count_matching`] and
//! [`ReportQueryEngine::fetch_generic_page`]. All reads, no writes; an
//! abandoned in-flight future is safe to drop.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lapor_model::{DateRange, Report, ReportFilter, ReportPage, StageValue};
use lapor_store::{DocumentStore, StoreError};

mod count;
mod cursor;
mod limits;
mod paginate;
mod probe;
mod request;
mod session;

pub use cursor::{
    decode_cursor, encode_cursor, CursorError, CursorErrorCode, CursorPayload,
    MAX_CURSOR_TOKEN_LEN,
};
pub use limits::EngineLimits;

pub const CRATE_NAME: &str = "lapor-query";

#[derive(Debug)]
#[non_exhaustive]
pub enum EngineError {
    Validation(String),
    Cursor(CursorError),
    Store(StoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) => f.write_str(msg),
            Self::Cursor(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<CursorError> for EngineError {
    fn from(err: CursorError) -> Self {
        Self::Cursor(err)
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Filters for a generic listing over any report-shaped collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GenericFilters {
    pub search: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub category: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenericPageRequest {
    /// Collection to list; defaults to the engine's report collection.
    pub collection: Option<String>,
    pub page_size: usize,
    pub cursor: Option<String>,
    pub filters: GenericFilters,
}

impl GenericFilters {
    fn to_report_filter(&self) -> ReportFilter {
        let date = if self.date_start.is_some() || self.date_end.is_some() {
            Some(DateRange {
                start: self.date_start.clone(),
                end: self.date_end.clone(),
            })
        } else {
            None
        };
        ReportFilter {
            stage: self.category.map(StageValue::new),
            date,
            search: self.search.clone(),
        }
    }
}

pub struct ReportQueryEngine {
    store: Arc<dyn DocumentStore>,
    collection: String,
    cursor_secret: Vec<u8>,
    limits: EngineLimits,
}

impl ReportQueryEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        cursor_secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            cursor_secret: cursor_secret.into(),
            limits: EngineLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Lists one page of reports for a workflow stage.
    pub async fn fetch_page(
        &self,
        stage: i64,
        page_size: usize,
        cursor: Option<&str>,
        search: Option<&str>,
        date_range: Option<DateRange>,
    ) -> Result<ReportPage, EngineError> {
        let filter = ReportFilter {
            stage: Some(StageValue::new(stage)),
            date: date_range,
            search: search.map(str::to_string),
        };
        self.page_internal(&self.collection, &filter, page_size, cursor, false)
            .await
    }

    /// Total number of reports matching a stage and optional search/date
    /// filters.
    pub async fn count_matching(
        &self,
        stage: i64,
        search: Option<&str>,
        date_range: Option<DateRange>,
    ) -> Result<u64, EngineError> {
        let filter = ReportFilter {
            stage: Some(StageValue::new(stage)),
            date: date_range,
            search: search.map(str::to_string),
        };
        self.count_internal(&self.collection, &filter).await
    }

    /// Generic listing with an optional category and a total count, for the
    /// dashboards that browse arbitrary report-shaped collections.
    pub async fn fetch_generic_page(
        &self,
        request: &GenericPageRequest,
    ) -> Result<ReportPage, EngineError> {
        let collection = request
            .collection
            .clone()
            .unwrap_or_else(|| self.collection.clone());
        let filter = request.filters.to_report_filter();
        self.page_internal(
            &collection,
            &filter,
            request.page_size,
            request.cursor.as_deref(),
            true,
        )
        .await
    }

    async fn page_internal(
        &self,
        collection: &str,
        filter: &ReportFilter,
        page_size: usize,
        cursor_token: Option<&str>,
        want_total: bool,
    ) -> Result<ReportPage, EngineError> {
        if page_size == 0 || page_size > self.limits.max_page_size {
            return Err(EngineError::Validation(format!(
                "page size must be between 1 and {}",
                self.limits.max_page_size
            )));
        }

        let decoded = match cursor_token {
            Some(token) => Some(cursor::decode_cursor(token, &self.cursor_secret)?),
            None => None,
        };

        let category_field =
            probe::detect_category_field(self.store.as_ref(), collection, filter.stage).await;
        let time_field = match &decoded {
            // The cursor pins the ordering that minted it; re-probing here
            // could silently switch orderings mid-listing.
            Some(payload) => payload.pinned_time_field().ok_or_else(|| {
                CursorError::new(CursorErrorCode::OrderMismatch, "cursor ordering unknown")
            })?,
            None => {
                probe::detect_time_field(self.store.as_ref(), collection, category_field, filter.stage)
                    .await
            }
        };
        let resume = decoded.as_ref().map(CursorPayload::resume_point);

        let mut session = session::ListSession::new(
            self.store.as_ref(),
            collection,
            category_field,
            time_field,
            self.limits.clone(),
        );
        let outcome = paginate::assemble_page(&mut session, filter, resume, page_size).await?;

        let total_count = if want_total {
            Some(
                count::count_matching(
                    self.store.as_ref(),
                    collection,
                    category_field,
                    time_field,
                    filter,
                    &self.limits,
                )
                .await?,
            )
        } else {
            None
        };

        let next_cursor = match &outcome.last_resume {
            Some(resume) => Some(cursor::encode_cursor(
                &CursorPayload::from_resume(time_field, resume),
                &self.cursor_secret,
            )?),
            // No raw document examined this call; the caller's token, if
            // any, still marks the frontier.
            None => cursor_token.map(str::to_string),
        };

        Ok(ReportPage {
            items: outcome
                .matched
                .iter()
                .map(|doc| Report::from_fields(&doc.id, &doc.fields))
                .collect(),
            has_next: outcome.has_next,
            has_prev: cursor_token.is_some(),
            total_count,
            next_cursor,
        })
    }

    async fn count_internal(
        &self,
        collection: &str,
        filter: &ReportFilter,
    ) -> Result<u64, EngineError> {
        let category_field =
            probe::detect_category_field(self.store.as_ref(), collection, filter.stage).await;
        let time_field =
            probe::detect_time_field(self.store.as_ref(), collection, category_field, filter.stage)
                .await;
        count::count_matching(
            self.store.as_ref(),
            collection,
            category_field,
            time_field,
            filter,
            &self.limits,
        )
        .await
    }
}

#[cfg(test)]
mod query_tests;
