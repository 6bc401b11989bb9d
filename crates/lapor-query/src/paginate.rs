// SPDX-License-Identifier: Apache-2.0

//! Page assembly. Matches are sparse relative to raw fetch size — the
//! free-text predicate (and, in fallback mode, the whole scope predicate)
//! only runs after retrieval — so one page may take several raw batches to
//! fill. The resume point always advances to the last raw document examined,
//! matched or not, so consecutive fetches never revisit a document.

use tracing::{debug, warn};

use lapor_model::ReportFilter;
use lapor_store::{DocumentSnapshot, ResumePoint};

use crate::request;
use crate::session::ListSession;
use crate::EngineError;

pub(crate) struct PageOutcome {
    pub matched: Vec<DocumentSnapshot>,
    /// Last raw document examined across all batches, if any.
    pub last_resume: Option<ResumePoint>,
    pub has_next: bool,
}

/// Accepts a raw document against the parts of the filter the server is not
/// known to have enforced. The scope re-check only runs on unfiltered
/// batches; free-text search always runs in memory.
pub(crate) fn accepts(filter: &ReportFilter, doc: &DocumentSnapshot, unfiltered: bool) -> bool {
    if unfiltered && !filter.matches_scope(&doc.fields) {
        return false;
    }
    filter.matches_search(&doc.fields)
}

pub(crate) async fn assemble_page(
    session: &mut ListSession<'_>,
    filter: &ReportFilter,
    mut resume: Option<ResumePoint>,
    page_size: usize,
) -> Result<PageOutcome, EngineError> {
    let order_by = request::order_clauses(session.time_field());
    let batch_limit = session.limits().scan_batch_size.max(page_size);
    let max_batches = session.limits().max_scan_batches;

    let mut matched: Vec<DocumentSnapshot> = Vec::with_capacity(page_size);
    let mut exhausted = false;
    let mut batches = 0;

    while matched.len() < page_size {
        if batches == max_batches {
            warn!(
                batches,
                "page assembly hit the batch ceiling before filling the page"
            );
            break;
        }
        batches += 1;

        let (docs, unfiltered) = session.fetch_batch(filter, resume.as_ref(), batch_limit).await?;
        let short = docs.len() <= batch_limit;
        let mut consumed_all = true;

        for (index, doc) in docs.iter().enumerate() {
            resume = Some(ResumePoint::from_snapshot(doc, &order_by));
            if accepts(filter, doc, unfiltered) {
                matched.push(doc.clone());
                if matched.len() == page_size {
                    consumed_all = index + 1 == docs.len();
                    break;
                }
            }
        }

        if short && consumed_all {
            exhausted = true;
            break;
        }
    }
    debug!(
        matched = matched.len(),
        batches, exhausted, "page assembly finished"
    );

    let has_next = if exhausted {
        false
    } else {
        // A raw next batch empty of matches must not end the listing; the
        // probe keeps walking until it finds one match or runs out of
        // reachable documents.
        probe_has_next(session, filter, resume.as_ref()).await?
    };

    Ok(PageOutcome {
        matched,
        last_resume: resume,
        has_next,
    })
}

async fn probe_has_next(
    session: &mut ListSession<'_>,
    filter: &ReportFilter,
    resume: Option<&ResumePoint>,
) -> Result<bool, EngineError> {
    let order_by = request::order_clauses(session.time_field());
    let batch_limit = session.limits().scan_batch_size;
    let mut resume = resume.cloned();

    for _ in 0..session.limits().max_scan_batches {
        let (docs, unfiltered) = session.fetch_batch(filter, resume.as_ref(), batch_limit).await?;
        if docs.iter().any(|doc| accepts(filter, doc, unfiltered)) {
            return Ok(true);
        }
        let short = docs.len() <= batch_limit;
        if short {
            return Ok(false);
        }
        if let Some(last) = docs.last() {
            resume = Some(ResumePoint::from_snapshot(last, &order_by));
        }
    }
    // Ceiling reached without exhausting the collection: report more data
    // rather than silently truncating the listing.
    Ok(true)
}
