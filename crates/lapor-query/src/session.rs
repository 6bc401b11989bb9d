// SPDX-License-Identifier: Apache-2.0

use tracing::warn;

use lapor_model::{CategoryField, ReportFilter, TimeField};
use lapor_store::{DocumentSnapshot, DocumentStore, ResumePoint};

use crate::limits::EngineLimits;
use crate::request;
use crate::EngineError;

/// Query-execution state for one listing session.
///
/// The only allowed transition is `Indexed -> Fallback`, taken exactly once
/// when the store reports a missing composite index; it is never reversed
/// within a session, so later pages of the same listing do not re-trigger the
/// same error on every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecutionMode {
    Indexed,
    Fallback,
}

/// One listing or counting session: a pinned schema detection, a sticky
/// execution mode, and a store handle. Sessions are per-call; two concurrent
/// callers never share one.
pub(crate) struct ListSession<'a> {
    store: &'a dyn DocumentStore,
    collection: &'a str,
    category_field: CategoryField,
    time_field: TimeField,
    mode: ExecutionMode,
    limits: EngineLimits,
}

impl<'a> ListSession<'a> {
    pub(crate) fn new(
        store: &'a dyn DocumentStore,
        collection: &'a str,
        category_field: CategoryField,
        time_field: TimeField,
        limits: EngineLimits,
    ) -> Self {
        Self {
            store,
            collection,
            category_field,
            time_field,
            mode: ExecutionMode::Indexed,
            limits,
        }
    }

    pub(crate) fn time_field(&self) -> TimeField {
        self.time_field
    }

    pub(crate) fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    #[cfg(test)]
    pub(crate) fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Fetches one raw batch of up to `limit + 1` documents.
    ///
    /// Returns the documents and whether they came back unfiltered: when the
    /// second element is true the server did not enforce the category/date
    /// constraints and the caller must re-check them in memory.
    pub(crate) async fn fetch_batch(
        &mut self,
        filter: &ReportFilter,
        resume: Option<&ResumePoint>,
        limit: usize,
    ) -> Result<(Vec<DocumentSnapshot>, bool), EngineError> {
        let scoped = request::build_page_query(
            self.collection,
            self.category_field,
            self.time_field,
            filter,
            resume,
            limit,
        );
        if self.mode == ExecutionMode::Fallback {
            let docs = self.store.fetch(&scoped.without_filters()).await?;
            return Ok((docs, true));
        }
        match self.store.fetch(&scoped).await {
            Ok(docs) => Ok((docs, false)),
            Err(err) if err.is_missing_index() => {
                warn!(
                    collection = self.collection,
                    error = %err,
                    "missing composite index, switching session to in-memory filtering"
                );
                self.mode = ExecutionMode::Fallback;
                let docs = self.store.fetch(&scoped.without_filters()).await?;
                Ok((docs, true))
            }
            Err(err) => Err(err.into()),
        }
    }
}
