#![forbid(unsafe_code)]
//! Report document model SSOT.
//!
//! Every crate in the workspace reads report documents through the types in
//! this crate. Field names are not fixed: historical write paths disagree on
//! both the category key and the creation-timestamp key, so the schema facts
//! live here as explicit candidate lists rather than being assumed at call
//! sites.

mod fields;
mod filter;
mod page;
mod report;

pub use fields::{
    CategoryField, TimeField, CATEGORY_FIELD_LEGACY, CATEGORY_FIELD_PRIMARY, DATE_FIELD,
    SEARCH_TEXT_FIELDS, TIME_FIELD_CANDIDATES,
};
pub use filter::{normalize_search_term, DateRange, ReportFilter};
pub use page::ReportPage;
pub use report::{Report, ReportId, StageValue, ValidationError, ID_MAX_LEN};

pub const CRATE_NAME: &str = "lapor-model";

pub const ENV_LAPOR_LOG_LEVEL: &str = "LAPOR_LOG_LEVEL";
